//! Core data models for City Weather CLI
//!
//! This module contains the types shared by the city browser and the detail
//! view: cities from the geonames dataset, forecast entries, the derived
//! min/max summary and current conditions.

pub mod geonames;
pub mod weather;

pub use geonames::{GeonamesClient, GeonamesError};
pub use weather::{ApiKey, WeatherClient, WeatherError};

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Geographic coordinates of a city
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

/// A populated place from the geonames dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Stable identifier, the only de-duplication key
    pub id: String,
    /// Display name
    pub name: String,
    /// Country name in English
    pub country: String,
    /// IANA timezone name
    pub timezone: String,
    /// Location, when the record carries one
    pub coordinates: Option<Coordinates>,
}

/// One time slot of a multi-period forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Start of the forecast slot
    pub time: DateTime<Utc>,
    /// Minimum temperature in Celsius
    pub temp_min: f64,
    /// Maximum temperature in Celsius
    pub temp_max: f64,
}

/// Min/max temperature derived from a forecast list
///
/// Both bounds are `None` when the lookup failed or the forecast had no usable
/// entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSummary {
    /// Lowest forecast minimum, whole degrees
    pub min: Option<i32>,
    /// Highest forecast maximum, whole degrees
    pub max: Option<i32>,
}

impl WeatherSummary {
    /// A summary with both bounds absent
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Reduces a forecast list to its overall minimum and maximum.
    ///
    /// Non-finite temperatures are skipped. An empty list yields an
    /// unavailable summary rather than infinite sentinels.
    pub fn from_forecast(entries: &[ForecastEntry]) -> Self {
        let min = entries
            .iter()
            .map(|e| e.temp_min)
            .filter(|t| t.is_finite())
            .reduce(f64::min);
        let max = entries
            .iter()
            .map(|e| e.temp_max)
            .filter(|t| t.is_finite())
            .reduce(f64::max);

        Self {
            min: min.map(round_degrees),
            max: max.map(round_degrees),
        }
    }

    /// Whether both bounds are present
    pub fn is_available(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

/// Rounds to the nearest whole degree. Halves round toward positive infinity.
fn round_degrees(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Current weather snapshot for a location, as supplied by the weather service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Feels-like temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Condition description, e.g. "light rain"
    pub description: Option<String>,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Builds the HTTP client shared by both API clients.
///
/// Every request made through it is bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("cityweather/", env!("CARGO_PKG_VERSION")))
        .build()
}
