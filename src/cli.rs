//! Command-line interface parsing for City Weather CLI
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated `StartupConfig`. The weather API key is taken from the command
//! line or the `OPENWEATHER_API_KEY` environment variable.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::browser::DEFAULT_BATCH_SIZE;
use crate::data::ApiKey;

/// Default timeout for every HTTP request, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// No weather API key was supplied
    #[error("Missing weather API key: pass --api-key or set OPENWEATHER_API_KEY")]
    MissingApiKey,

    /// Batch size must be positive
    #[error("Invalid batch size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    /// Timeout must be positive
    #[error("Invalid timeout: {0}. Must be at least 1 second")]
    InvalidTimeout(u64),

    /// City identifier was blank
    #[error("Invalid city id: must not be empty")]
    EmptyCityId,
}

/// City Weather CLI - browse world cities with their temperature forecasts
#[derive(Parser, Debug)]
#[command(name = "cityweather")]
#[command(about = "Browse world cities with short-range temperature forecasts")]
#[command(version)]
pub struct Cli {
    /// OpenWeatherMap API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Initial search term (city or country)
    #[arg(long, short, value_name = "TERM", default_value = "")]
    pub search: String,

    /// Open the detail view for a geoname id directly
    ///
    /// Examples:
    ///   cityweather --city 2988507     # Paris
    #[arg(long, value_name = "ID")]
    pub city: Option<String>,

    /// Number of cities fetched per page
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Override the geonames search endpoint
    #[arg(long, value_name = "URL")]
    pub geonames_url: Option<String>,

    /// Override the weather API root
    #[arg(long, value_name = "URL")]
    pub weather_url: Option<String>,

    /// Write logs to this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Weather service credential
    pub api_key: ApiKey,
    /// Search term applied before the first page loads
    pub initial_search: String,
    /// City to open in the detail view on startup
    pub open_city: Option<String>,
    /// Cities per page
    pub batch_size: usize,
    /// Per-request timeout
    pub timeout: Duration,
    /// Geonames endpoint override
    pub geonames_url: Option<String>,
    /// Weather API root override
    pub weather_url: Option<String>,
    /// Log file override
    pub log_file: Option<PathBuf>,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the key is missing or a value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(CliError::MissingApiKey)?;

        if cli.batch_size == 0 {
            return Err(CliError::InvalidBatchSize(cli.batch_size));
        }
        if cli.timeout_secs == 0 {
            return Err(CliError::InvalidTimeout(cli.timeout_secs));
        }

        let open_city = match cli.city.as_deref().map(str::trim) {
            Some("") => return Err(CliError::EmptyCityId),
            Some(id) => Some(id.to_string()),
            None => None,
        };

        Ok(StartupConfig {
            api_key: ApiKey::new(api_key),
            initial_search: cli.search.trim().to_string(),
            open_city,
            batch_size: cli.batch_size,
            timeout: Duration::from_secs(cli.timeout_secs),
            geonames_url: cli.geonames_url.clone(),
            weather_url: cli.weather_url.clone(),
            log_file: cli.log_file.clone(),
        })
    }
}
