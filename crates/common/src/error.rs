//! Unified error type for stableman.

use thiserror::Error;

use crate::types::StationDevice;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("AmbientWeather API error: {0}")]
    AmbientWeather(String),

    #[error("Weather.gov API error: {0}")]
    WeatherGov(String),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Weather station selection required ({} available)", .devices.len())]
    DeviceSelection { devices: Vec<StationDevice> },

    #[error("All weather sources failed. Primary: {primary}. Fallback: {fallback}")]
    AllSourcesFailed { primary: String, fallback: String },

    #[error("No data: {0}")]
    NoData(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Longest provider error body kept in an error message, in characters.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Leading part of an HTTP error body, cut on a character boundary.
pub fn body_excerpt(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

impl Error {
    /// True for failures produced while fetching weather data, as opposed to
    /// bad measurements or configuration.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::AmbientWeather(_)
                | Error::WeatherGov(_)
                | Error::RateLimited { .. }
                | Error::DeviceSelection { .. }
                | Error::AllSourcesFailed { .. }
                | Error::NoData(_)
        )
    }
}
