//! Domain types shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Weather Types ─────────────────────────────────────────────────────

/// Which provider produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSource {
    /// AmbientWeather.net personal weather station.
    PersonalStation,
    /// National Weather Service (api.weather.gov) hourly forecast.
    NationalForecast,
}

impl WeatherSource {
    pub fn label(&self) -> &'static str {
        match self {
            WeatherSource::PersonalStation => "Personal Weather Station (AmbientWeather.net)",
            WeatherSource::NationalForecast => "National Weather Service (Weather.gov)",
        }
    }
}

/// Normalized current conditions, whichever provider produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Air temperature in °F.
    pub temperature_f: f64,
    /// Apparent temperature in °F.
    pub feels_like_f: f64,
    /// Relative humidity, 0-100.
    pub humidity_pct: f64,
    /// Wind speed in mph.
    pub wind_speed_mph: f64,
    pub source: WeatherSource,
    /// Human-readable station description.
    pub station_name: String,
    pub observed_at: DateTime<Utc>,
}

/// One hourly forecast period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Provider-supplied period name (often empty for hourly data).
    #[serde(default)]
    pub name: String,
    pub temperature_f: f64,
    pub feels_like_f: f64,
    pub humidity_pct: f64,
    pub wind_speed_mph: f64,
    /// Probability of precipitation, 0-100.
    pub precipitation_chance_pct: f64,
    pub short_description: String,
}

const CLOUDY_KEYWORDS: [&str; 3] = ["cloud", "overcast", "partly"];

impl ForecastPeriod {
    /// Whether the short description reports cloud cover.
    pub fn is_cloudy(&self) -> bool {
        let description = self.short_description.to_ascii_lowercase();
        CLOUDY_KEYWORDS.iter().any(|k| description.contains(k))
    }

    /// Whether the period counts as sunny for heat-stress purposes.
    pub fn is_sunny(&self) -> bool {
        !self.is_cloudy()
    }
}

/// True when more than half of the first `sample` periods are cloudy.
///
/// An empty slice counts as sunny, the stricter heat-stress case.
pub fn is_cloudy_outlook(periods: &[ForecastPeriod], sample: usize) -> bool {
    let sampled: Vec<&ForecastPeriod> = periods.iter().take(sample).collect();
    if sampled.is_empty() {
        return false;
    }
    let cloudy = sampled.iter().filter(|p| p.is_cloudy()).count();
    cloudy * 2 > sampled.len()
}

/// Location details reported by the NWS points endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub city: String,
    pub state: String,
    /// NWS Weather Forecast Office ID (e.g., "OKX").
    pub office: String,
    pub time_zone: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A normalized forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub location: LocationInfo,
    /// Chronological, non-overlapping hourly periods.
    pub periods: Vec<ForecastPeriod>,
    pub fetched_at: DateTime<Utc>,
}

/// A weather station registered to an AmbientWeather account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDevice {
    pub mac_address: String,
    pub name: String,
}
