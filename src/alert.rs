use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Properties of one feature from `/alerts/active/...`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertFeature {
    pub onset: Option<DateTime<FixedOffset>>,
    pub expires: Option<DateTime<FixedOffset>>,
    pub headline: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: HashMap<String, Vec<String>>,
}

impl AlertFeature {
    pub fn headline(&self) -> &str {
        self.headline.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// First value of a parameter such as `NWSheadline` or `damageThreat`.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Feature {
    pub properties: AlertFeature,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlertsResponse {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl From<AlertsResponse> for Vec<AlertFeature> {
    fn from(response: AlertsResponse) -> Vec<AlertFeature> {
        response
            .features
            .into_iter()
            .map(|feature| feature.properties)
            .collect()
    }
}
