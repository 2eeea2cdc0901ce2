use crate::classify::{classify, ClassifiedAlert};
use crate::client::{Client, RegionSelector};
use crate::location::ZoneId;
use crate::registry::{Database, LocationRegistry};
use crate::sink::AlertSink;
use anyhow::{anyhow, Result};
use tracing::{debug, info};

/// What a user asked for alerts about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertQuery {
    City(String),
    State(String),
    County(String),
}

/// Resolves the zone a stored city sits in and remembers it.
pub fn add_city(
    client: &Client,
    database: &Database,
    city: &str,
    state_name: &str,
) -> Result<ZoneId> {
    let Some(state_code) = database.lookup_state_code(state_name)? else {
        return Err(anyhow!("State {state_name} not found in database"));
    };
    let Some(point) = database.lookup_coordinates(city, &state_code)? else {
        return Err(anyhow!("{city}, {state_code} not found in geolocation database"));
    };
    let zone = client.resolve_zone(point)?;
    if !database.add_county(city, &zone)? {
        debug!("{city} was already mapped to a county");
    }
    info!("Added {city} ({zone})");
    Ok(zone)
}

pub fn selector_for(
    query: &AlertQuery,
    registry: &impl LocationRegistry,
) -> Result<RegionSelector> {
    match query {
        AlertQuery::City(city) => match registry.lookup_zone(city)? {
            Some(zone) => Ok(RegionSelector::zone(zone.as_str())),
            None => Err(anyhow!("City {city} not found in database")),
        },
        AlertQuery::State(name) => match registry.lookup_state_code(name)? {
            Some(code) => Ok(RegionSelector::state(code)),
            None => Err(anyhow!("State {name} not found in database")),
        },
        AlertQuery::County(code) => Ok(RegionSelector::zone(code.as_str())),
    }
}

pub fn active_alerts(
    client: &Client,
    registry: &impl LocationRegistry,
    query: &AlertQuery,
) -> Result<Vec<ClassifiedAlert>> {
    let selector = selector_for(query, registry)?;
    let features = client.fetch_active_alerts(&selector)?;
    Ok(features.iter().map(classify).collect())
}

/// Hands every alert to the sink and returns how many there were.
pub fn report(alerts: &[ClassifiedAlert], sink: &impl AlertSink) -> usize {
    for alert in alerts {
        debug!("Delivering {} ({})", alert.title, alert.color);
        sink.deliver(alert);
    }
    alerts.len()
}
