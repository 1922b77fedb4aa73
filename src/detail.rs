//! Per-city detail lookup
//!
//! Resolves a city identifier to its record, then fetches current conditions
//! for the record's coordinates.

use tracing::{info, instrument, warn};

use crate::data::{City, CurrentConditions, GeonamesClient, WeatherClient};

/// A resolved city together with its current conditions
#[derive(Debug, Clone, PartialEq)]
pub struct CityDetail {
    pub city: City,
    pub conditions: CurrentConditions,
}

/// Lifecycle of one detail lookup
///
/// `Found`, `NotFound` and `Error` are terminal for a given identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// Lookup in progress
    Loading,
    /// Both calls succeeded
    Found(Box<CityDetail>),
    /// The identifier matched no record
    NotFound,
    /// Either call failed
    Error(String),
}

impl DetailState {
    /// Whether the lookup has finished
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DetailState::Loading)
    }
}

/// Runs the two-step detail lookup for `city_id`.
///
/// A missing record yields `NotFound`; transport, status or payload failures
/// in either call yield `Error`. Never panics on upstream data.
#[instrument(skip(geonames, weather))]
pub async fn load_detail(
    geonames: &GeonamesClient,
    weather: &WeatherClient,
    city_id: &str,
) -> DetailState {
    let city = match geonames.lookup(city_id).await {
        Ok(Some(city)) => city,
        Ok(None) => {
            info!("City not found");
            return DetailState::NotFound;
        }
        Err(e) => {
            warn!(error = %e, "City lookup failed");
            return DetailState::Error(e.to_string());
        }
    };

    let Some(coords) = city.coordinates else {
        warn!("City record has no coordinates");
        return DetailState::Error("city record has no coordinates".to_string());
    };

    match weather.fetch_current(coords).await {
        Ok(conditions) => DetailState::Found(Box::new(CityDetail { city, conditions })),
        Err(e) => {
            warn!(error = %e, "Current conditions lookup failed");
            DetailState::Error(e.to_string())
        }
    }
}
