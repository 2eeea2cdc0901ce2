use crate::alert::{AlertFeature, AlertsResponse};
use crate::diagnostics::{ErrorLog, DEFAULT_FILE_NAME};
use crate::error::ClientError;
use crate::gate::{Clock, RateGate, Stopwatch, SystemClock, DEFAULT_COOLDOWN};
use crate::location::{GeoPoint, PointResponse, ZoneId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::DurationSeconds;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use ureq::{Agent, AgentBuilder, Error};

pub const URL_BASE: &str = "https://api.weather.gov";
// api.weather.gov rejects requests without a User-Agent identifying the app.
const USER_AGENT: &str = concat!("nws-alerts/", env!("CARGO_PKG_VERSION"));
const PARSE_FAILURE: &str = "Could not parse API response; contact operator";
const ZONE_NOT_FOUND: &str = "County ID not found in API response";

static ZONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]+\d+").expect("valid zone pattern"));

#[serde_with::serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOptions {
    pub base_url: String,
    pub user_agent: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub cooldown: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    /// Defaults to `api_err_log.txt` in the state directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_log: Option<PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: URL_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            cooldown: DEFAULT_COOLDOWN,
            timeout: Duration::from_secs(10),
            error_log: None,
        }
    }
}

/// Which area to fetch alerts for, as supplied by a caller. Exactly one of
/// the two codes has to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSelector {
    pub state_code: Option<String>,
    pub zone_code: Option<String>,
}

impl RegionSelector {
    pub fn state(code: impl Into<String>) -> Self {
        Self {
            state_code: Some(code.into()),
            zone_code: None,
        }
    }

    pub fn zone(code: impl Into<String>) -> Self {
        Self {
            state_code: None,
            zone_code: Some(code.into()),
        }
    }

    pub fn region(&self) -> Result<Region<'_>, ClientError> {
        match (&self.state_code, &self.zone_code) {
            (Some(state), None) => Ok(Region::State(state)),
            (None, Some(zone)) => Ok(Region::Zone(zone)),
            (Some(_), Some(_)) => Err(ClientError::unknown(
                "Only one of state code or zone code may be provided",
            )),
            (None, None) => Err(ClientError::unknown(
                "A state code or zone code must be provided",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region<'a> {
    State(&'a str),
    Zone(&'a str),
}

impl Region<'_> {
    fn path(&self) -> String {
        match self {
            Self::State(code) => format!("alerts/active/area/{code}"),
            Self::Zone(code) => format!("alerts/active/zone/{code}"),
        }
    }
}

#[derive(Debug)]
pub struct Client {
    client: Agent,
    base_url: String,
    gate: RateGate,
    error_log: ErrorLog,
}

impl Client {
    pub fn new(options: &ClientOptions) -> Client {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    pub fn with_clock(options: &ClientOptions, clock: Arc<dyn Clock>) -> Client {
        let client = AgentBuilder::new()
            .timeout_read(options.timeout)
            .timeout_write(options.timeout)
            .user_agent(&options.user_agent)
            .build();
        Client {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            gate: RateGate::with_clock(options.cooldown, clock),
            error_log: ErrorLog::new(
                options
                    .error_log
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME)),
            ),
        }
    }

    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    /// Logs the real cause and hands back the generic error callers see.
    fn hide(&self, cause: impl Display) -> ClientError {
        self.error_log.record(&cause.to_string());
        ClientError::unknown(PARSE_FAILURE)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}/{path}", self.base_url);
        let _watch = Stopwatch::start(format!("GET {url}"));
        debug!("Fetching {url}");
        match self.client.get(&url).call() {
            Ok(response) if response.status() == 200 => {
                self.gate.record_success();
                serde_json::from_reader(response.into_reader()).map_err(|err| self.hide(err))
            }
            Ok(response) => {
                let status = response.status();
                error!("{status} for {url}");
                Err(ClientError::Api { status })
            }
            Err(Error::Status(status, _)) => {
                error!("{status} for {url}");
                Err(ClientError::Api { status })
            }
            Err(err) => Err(self.hide(err)),
        }
    }

    pub fn resolve_zone(&self, point: GeoPoint) -> Result<ZoneId, ClientError> {
        self.gate.check()?;
        let response: PointResponse = self.get(&format!("points/{point}"))?;
        let Some(county) = response.properties.county else {
            return Err(self.hide(format!("No county for {point} in API response")));
        };
        match extract_zone(&county) {
            Some(zone) => {
                info!("{point} is in {zone}");
                Ok(zone)
            }
            None => {
                self.error_log.record(&format!("No county ID in {county}"));
                Err(ClientError::unknown(ZONE_NOT_FOUND))
            }
        }
    }

    pub fn fetch_active_alerts(
        &self,
        selector: &RegionSelector,
    ) -> Result<Vec<AlertFeature>, ClientError> {
        let region = selector.region()?;
        self.gate.check()?;
        let response: AlertsResponse = self.get(&region.path())?;
        let alerts: Vec<AlertFeature> = response.into();
        debug!("{} active alerts for {:?}", alerts.len(), region);
        Ok(alerts)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(&ClientOptions::default())
    }
}

/// First run of letters immediately followed by digits, e.g. `ILC143` from
/// `https://api.weather.gov/zones/county/ILC143`.
pub fn extract_zone(text: &str) -> Option<ZoneId> {
    ZONE_PATTERN.find(text).map(|m| ZoneId::new(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_from_county_url() {
        assert_eq!(
            extract_zone("https://api.weather.gov/zones/county/ILC143"),
            Some(ZoneId::new("ILC143"))
        );
    }

    #[test]
    fn zone_needs_letters_then_digits() {
        assert_eq!(extract_zone("https://api.weather.gov/zones/county/"), None);
        assert_eq!(extract_zone("123"), None);
        assert_eq!(extract_zone("abc"), None);
        assert_eq!(extract_zone("zone 12 ILC1"), Some(ZoneId::new("ILC1")));
    }

    #[test]
    fn selector_requires_exactly_one_code() {
        assert!(matches!(
            RegionSelector::default().region(),
            Err(ClientError::Unknown(_))
        ));
        let both = RegionSelector {
            state_code: Some("IL".into()),
            zone_code: Some("ILC143".into()),
        };
        assert!(matches!(both.region(), Err(ClientError::Unknown(_))));
        assert_eq!(RegionSelector::state("IL").region().unwrap(), Region::State("IL"));
        assert_eq!(
            RegionSelector::zone("ILC143").region().unwrap(),
            Region::Zone("ILC143")
        );
    }

    #[test]
    fn region_paths() {
        assert_eq!(Region::State("KS").path(), "alerts/active/area/KS");
        assert_eq!(Region::Zone("KSC079").path(), "alerts/active/zone/KSC079");
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let options = ClientOptions {
            base_url: "http://localhost:1234/".to_string(),
            ..Default::default()
        };
        assert_eq!(Client::new(&options).base_url, "http://localhost:1234");
    }
}
