use crate::alert::AlertFeature;
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::Display;

static EVENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.+ watch|.+ warning)").expect("valid event pattern"));
static TORNADO_SEVERITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(warning|emergency)").expect("valid severity pattern"));

pub const TORNADO_EMERGENCY_TITLE: &str = "TORNADO EMERGENCY";
pub const PDS_TORNADO_TITLE: &str = "PDS TORNADO WARNING";
pub const DESTRUCTIVE_STORM_TITLE: &str = "DESTRUCTIVE SEVERE THUNDERSTORM WARNING";
pub const FLOOD_EMERGENCY_TITLE: &str = "FLASH FLOOD EMERGENCY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Tornado,
    SevereThunderstorm,
    FlashFlood,
    Other,
}

impl EventCategory {
    /// Finds the watch or warning named in a headline, if there is one.
    pub fn from_headline(headline: &str) -> Option<Self> {
        let headline = headline.to_lowercase();
        let event = EVENT_PATTERN.find(&headline)?.as_str();
        let category = if event.contains("tornado") {
            Self::Tornado
        } else if event.contains("severe thunderstorm") {
            Self::SevereThunderstorm
        } else if event.contains("flash flood") {
            Self::FlashFlood
        } else {
            Self::Other
        };
        Some(category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertColor {
    Default,
    TornadoEmergency,
    PdsTornado,
    DestructiveStorm,
    FloodEmergency,
}

impl AlertColor {
    pub fn rgb(&self) -> u32 {
        match self {
            Self::Default => 0xff0019,
            Self::TornadoEmergency | Self::PdsTornado => 0x800080,
            Self::DestructiveStorm => 0xffa500,
            Self::FloodEmergency => 0x0000ff,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityFlags {
    pub pds_tor: bool,
    pub emergency_tor: bool,
    pub destructive_tstorm: bool,
    pub emergency_flood: bool,
}

type Rule<T> = (fn(&SeverityFlags) -> bool, T);

// Both tornado variants share a color, so their order only matters for the
// variant reported. Titles put the emergency first.
const COLOR_RULES: &[Rule<AlertColor>] = &[
    (|f: &SeverityFlags| f.emergency_tor, AlertColor::TornadoEmergency),
    (|f: &SeverityFlags| f.pds_tor, AlertColor::PdsTornado),
    (|f: &SeverityFlags| f.destructive_tstorm, AlertColor::DestructiveStorm),
    (|f: &SeverityFlags| f.emergency_flood, AlertColor::FloodEmergency),
];

const TITLE_RULES: &[Rule<&str>] = &[
    (|f: &SeverityFlags| f.emergency_tor, TORNADO_EMERGENCY_TITLE),
    (|f: &SeverityFlags| f.pds_tor, PDS_TORNADO_TITLE),
    (|f: &SeverityFlags| f.destructive_tstorm, DESTRUCTIVE_STORM_TITLE),
    (|f: &SeverityFlags| f.emergency_flood, FLOOD_EMERGENCY_TITLE),
];

fn first_match<T: Copy>(rules: &[Rule<T>], flags: &SeverityFlags) -> Option<T> {
    rules
        .iter()
        .find(|(applies, _)| applies(flags))
        .map(|(_, value)| *value)
}

impl SeverityFlags {
    pub fn for_alert(category: Option<EventCategory>, feature: &AlertFeature) -> Self {
        let mut flags = Self::default();
        let description = feature.description();
        match category {
            Some(EventCategory::Tornado) => {
                if description
                    .to_lowercase()
                    .contains("particularly dangerous situation")
                {
                    flags.pds_tor = true;
                } else {
                    // Only an emergency mentioned before any "warning" counts.
                    let headline = feature.parameter("NWSheadline").unwrap_or("").to_lowercase();
                    flags.emergency_tor = TORNADO_SEVERITY
                        .find(&headline)
                        .is_some_and(|m| m.as_str() == "emergency");
                }
            }
            Some(EventCategory::SevereThunderstorm) => {
                let threat = feature.parameter("damageThreat").unwrap_or("Unknown");
                flags.destructive_tstorm = threat.eq_ignore_ascii_case("destructive");
            }
            Some(EventCategory::FlashFlood) => {
                let headline = feature.parameter("NWSheadline").unwrap_or("").to_lowercase();
                flags.emergency_flood = headline.contains("flash flood emergency")
                    || description.contains("flash flood emergency");
            }
            Some(EventCategory::Other) | None => {}
        }
        flags
    }

    pub fn color(&self) -> AlertColor {
        first_match(COLOR_RULES, self).unwrap_or(AlertColor::Default)
    }

    pub fn title<'a>(&self, headline: &'a str) -> &'a str {
        first_match(TITLE_RULES, self).unwrap_or(headline)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedAlert {
    pub title: String,
    pub description: String,
    pub onset: Option<DateTime<FixedOffset>>,
    pub expires: Option<DateTime<FixedOffset>>,
    pub color: AlertColor,
    pub flags: SeverityFlags,
}

pub fn classify(feature: &AlertFeature) -> ClassifiedAlert {
    let headline = feature.headline();
    let category = EventCategory::from_headline(headline);
    let flags = SeverityFlags::for_alert(category, feature);
    ClassifiedAlert {
        title: flags.title(headline).to_string(),
        description: feature.description().to_string(),
        onset: feature.onset,
        expires: feature.expires,
        color: flags.color(),
        flags,
    }
}
