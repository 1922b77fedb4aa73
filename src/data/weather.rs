//! OpenWeatherMap API client
//!
//! This module fetches multi-period forecasts and current conditions from the
//! OpenWeatherMap 2.5 API and parses them into our data structures. All
//! requests ask for metric units.

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use super::{Coordinates, CurrentConditions, ForecastEntry, WeatherSummary};

/// Base URL for the OpenWeatherMap API
const OPEN_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Unit system requested from the API
const UNITS: &str = "metric";

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Weather service returned HTTP {0}")]
    HttpStatus(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Invalid timestamp in response
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// Weather service credential
///
/// Supplied at runtime and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Client for fetching weather data from OpenWeatherMap
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http_client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl WeatherClient {
    /// Creates a client for the public endpoint
    pub fn new(http_client: Client, api_key: ApiKey) -> Self {
        Self {
            http_client,
            base_url: OPEN_WEATHER_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Points the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetches the multi-period forecast for the given coordinates
    ///
    /// # Returns
    /// * `Ok(Vec<ForecastEntry>)` - Forecast slots in API order
    /// * `Err(WeatherError)` - If the request or parsing fails
    #[instrument(skip(self), fields(lat = %coords.lat, lon = %coords.lon))]
    pub async fn fetch_forecast(
        &self,
        coords: Coordinates,
    ) -> Result<Vec<ForecastEntry>, WeatherError> {
        let text = self.get("forecast", coords).await?;
        let api_response: ForecastResponse = serde_json::from_str(&text)?;

        let entries = api_response
            .list
            .into_iter()
            .map(|slot| {
                let time = DateTime::<Utc>::from_timestamp(slot.dt, 0)
                    .ok_or(WeatherError::InvalidTimestamp(slot.dt))?;
                Ok(ForecastEntry {
                    time,
                    temp_min: slot.main.temp_min,
                    temp_max: slot.main.temp_max,
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;
        debug!(slots = entries.len(), "Fetched forecast");

        Ok(entries)
    }

    /// Fetches the forecast and reduces it to a min/max summary
    pub async fn fetch_summary(&self, coords: Coordinates) -> Result<WeatherSummary, WeatherError> {
        let entries = self.fetch_forecast(coords).await?;
        Ok(WeatherSummary::from_forecast(&entries))
    }

    /// Fetches current conditions for the given coordinates
    ///
    /// # Returns
    /// * `Ok(CurrentConditions)` - Values exactly as supplied by the API
    /// * `Err(WeatherError)` - If the request or parsing fails
    #[instrument(skip(self), fields(lat = %coords.lat, lon = %coords.lon))]
    pub async fn fetch_current(
        &self,
        coords: Coordinates,
    ) -> Result<CurrentConditions, WeatherError> {
        let text = self.get("weather", coords).await?;
        let api_response: CurrentResponse = serde_json::from_str(&text)?;

        Ok(CurrentConditions {
            temperature: api_response.main.temp,
            feels_like: api_response.main.feels_like,
            humidity: api_response.main.humidity,
            pressure: api_response.main.pressure,
            wind_speed: api_response.wind.speed,
            description: api_response
                .weather
                .into_iter()
                .next()
                .map(|w| w.description),
            fetched_at: Utc::now(),
        })
    }

    /// Issues a GET against `endpoint` and returns the body of a 2xx response
    async fn get(&self, endpoint: &str, coords: Coordinates) -> Result<String, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let lat = coords.lat.to_string();
        let lon = coords.lon.to_string();
        let params = [
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", self.api_key.expose()),
            ("units", UNITS),
        ];

        let response = self.http_client.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::HttpStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Forecast endpoint response
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastSlot>,
}

/// A single three-hour forecast slot
#[derive(Debug, Deserialize)]
struct ForecastSlot {
    dt: i64,
    main: SlotTemperatures,
}

#[derive(Debug, Deserialize)]
struct SlotTemperatures {
    temp_min: f64,
    temp_max: f64,
}

/// Current weather endpoint response
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: CurrentMain,
    wind: CurrentWind,
    #[serde(default)]
    weather: Vec<ConditionEntry>,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    description: String,
}
