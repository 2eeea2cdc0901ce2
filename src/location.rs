use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// NWS county or forecast zone code, e.g. `ILC113`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize)]
pub struct PointResponse {
    pub properties: PointProperties,
}

#[derive(Serialize, Deserialize)]
pub struct PointProperties {
    pub county: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_formats_as_path_segment() {
        assert_eq!(GeoPoint::new(40.6936, -89.589).to_string(), "40.6936,-89.589");
    }

    #[test]
    fn point_response_keeps_county_url() {
        let json = r#"{"properties": {
            "county": "https://api.weather.gov/zones/county/ILC143",
            "forecastZone": "https://api.weather.gov/zones/forecast/ILZ029",
            "gridId": "ILX"
        }}"#;
        let response: PointResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.properties.county.as_deref(),
            Some("https://api.weather.gov/zones/county/ILC143")
        );
    }
}
