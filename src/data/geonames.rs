//! Geonames search client for the opendatasoft records API
//!
//! Searches the "all cities with a population over 1000" dataset by free text
//! and resolves single cities by identifier.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::{City, Coordinates};

/// Base URL for the opendatasoft records search API
const GEONAMES_BASE_URL: &str = "https://public.opendatasoft.com/api/records/1.0/search/";

/// Dataset holding every populated place with more than 1000 inhabitants
const GEONAMES_DATASET: &str = "geonames-all-cities-with-a-population-1000";

/// Rows requested when resolving a single identifier
const LOOKUP_ROWS: usize = 10;

/// Errors that can occur when querying the geonames dataset
#[derive(Debug, Error)]
pub enum GeonamesError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Geonames service returned HTTP {0}")]
    HttpStatus(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Client for the geonames search endpoint
#[derive(Debug, Clone)]
pub struct GeonamesClient {
    http_client: Client,
    base_url: String,
    dataset: String,
}

impl GeonamesClient {
    /// Creates a client for the public endpoint using the given HTTP client
    pub fn new(http_client: Client) -> Self {
        Self {
            http_client,
            base_url: GEONAMES_BASE_URL.to_string(),
            dataset: GEONAMES_DATASET.to_string(),
        }
    }

    /// Points the client at a different search endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches one page of cities matching `query`.
    ///
    /// # Arguments
    /// * `query` - Free-text search term, may be empty
    /// * `start` - Offset of the first record
    /// * `rows` - Number of records to request
    #[instrument(skip(self), fields(dataset = %self.dataset))]
    pub async fn search(
        &self,
        query: &str,
        start: usize,
        rows: usize,
    ) -> Result<Vec<City>, GeonamesError> {
        let rows = rows.to_string();
        let start = start.to_string();
        let params = [
            ("dataset", self.dataset.as_str()),
            ("rows", rows.as_str()),
            ("start", start.as_str()),
            ("q", query),
        ];

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeonamesError::HttpStatus(status.as_u16()));
        }

        let text = response.text().await?;
        let api_response: SearchResponse = serde_json::from_str(&text)?;

        let cities: Vec<City> = api_response
            .records
            .into_iter()
            .filter_map(CityRecord::into_city)
            .collect();
        debug!(count = cities.len(), "Fetched geonames page");

        Ok(cities)
    }

    /// Resolves a city by its identifier.
    ///
    /// The search is free text, so only a record whose identifier matches
    /// exactly is accepted.
    ///
    /// # Returns
    /// * `Ok(Some(City))` - The matching city
    /// * `Ok(None)` - No record carries this identifier
    /// * `Err(GeonamesError)` - If the request or parsing fails
    pub async fn lookup(&self, city_id: &str) -> Result<Option<City>, GeonamesError> {
        let candidates = self.search(city_id, 0, LOOKUP_ROWS).await?;
        Ok(candidates.into_iter().find(|city| city.id == city_id))
    }
}

/// Records search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    records: Vec<CityRecord>,
}

/// A single dataset record
#[derive(Debug, Deserialize)]
struct CityRecord {
    #[serde(default)]
    recordid: Option<String>,
    fields: CityFields,
}

/// Record fields used by the explorer
#[derive(Debug, Deserialize)]
struct CityFields {
    #[serde(default)]
    geoname_id: Option<RawId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cou_name_en: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    coordinates: Option<Vec<f64>>,
}

/// The dataset publishes ids as strings, older exports as numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

impl CityRecord {
    /// Converts a raw record, dropping records that carry no identifier
    fn into_city(self) -> Option<City> {
        let fields = self.fields;
        let Some(id) = fields
            .geoname_id
            .map(RawId::into_string)
            .or(self.recordid)
        else {
            warn!("Skipping geonames record without an identifier");
            return None;
        };

        let coordinates = match fields.coordinates.as_deref() {
            Some([lat, lon]) => Some(Coordinates {
                lat: *lat,
                lon: *lon,
            }),
            _ => None,
        };

        Some(City {
            id,
            name: fields.name.unwrap_or_default(),
            country: fields.cou_name_en.unwrap_or_default(),
            timezone: fields.timezone.unwrap_or_default(),
            coordinates,
        })
    }
}
