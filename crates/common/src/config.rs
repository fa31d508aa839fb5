//! Application configuration types.
//!
//! Every threshold the decision engine uses lives here so that callers (and
//! tests) can pass alternate tables without touching shared state.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Personal weather station credentials.
    #[serde(default)]
    pub ambient: AmbientConfig,

    /// Stable location used for NWS forecasts.
    #[serde(default)]
    pub location: LocationConfig,

    /// Decision engine thresholds.
    #[serde(default)]
    pub blanketing: BlanketingConfig,

    /// Fetch cache lifetimes.
    #[serde(default)]
    pub cache: CacheConfig,

    /// User-Agent sent to weather APIs (api.weather.gov requires one).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// AmbientWeather.net credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmbientConfig {
    /// Account API key.
    #[serde(default)]
    pub api_key: String,
    /// Application key.
    #[serde(default)]
    pub app_key: String,
    /// Preferred station MAC address. When unset the account's devices are
    /// listed and the operator must pick one.
    #[serde(default)]
    pub mac_address: Option<String>,
}

impl AmbientConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.app_key.trim().is_empty()
    }
}

/// Stable coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
}

/// Lower bounds (inclusive) of the None/Light/Medium bands; anything colder
/// than `medium_min_f` is Heavy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub none_min_f: f64,
    pub light_min_f: f64,
    pub medium_min_f: f64,
}

impl ThresholdTable {
    pub const OUTDOOR: ThresholdTable = ThresholdTable {
        none_min_f: 50.0,
        light_min_f: 40.0,
        medium_min_f: 30.0,
    };

    pub const INDOOR: ThresholdTable = ThresholdTable {
        none_min_f: 45.0,
        light_min_f: 35.0,
        medium_min_f: 25.0,
    };

    /// Bands must descend strictly for the lookup to be monotonic.
    pub fn is_descending(&self) -> bool {
        self.none_min_f > self.light_min_f && self.light_min_f > self.medium_min_f
    }
}

/// Heat and rain protection rules for housing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousingRules {
    /// Equine heat index is only considered above this air temperature.
    #[serde(default = "default_heat_index_min_temp")]
    pub heat_index_min_temp_f: f64,
    /// Indoor when the equine heat index reaches this in sunny weather.
    #[serde(default = "default_sunny_heat_index")]
    pub sunny_heat_index: f64,
    /// Indoor when the equine heat index reaches this in cloudy weather.
    #[serde(default = "default_cloudy_heat_index")]
    pub cloudy_heat_index: f64,
    /// Indoor when any period in the window reaches this rain chance.
    #[serde(default = "default_rain_chance")]
    pub rain_chance_pct: f64,
    /// How many leading periods decide the sunny/cloudy outlook.
    #[serde(default = "default_cloudy_sample_periods")]
    pub cloudy_sample_periods: usize,
}

/// Local start times of the three care phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    #[serde(default = "default_morning_start")]
    pub morning_start: NaiveTime,
    #[serde(default = "default_day_start")]
    pub day_start: NaiveTime,
    #[serde(default = "default_night_start")]
    pub night_start: NaiveTime,
}

impl PhaseSchedule {
    pub fn is_ordered(&self) -> bool {
        self.morning_start < self.day_start && self.day_start < self.night_start
    }
}

/// Everything the decision engine needs besides the weather itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlanketingConfig {
    #[serde(default = "default_outdoor")]
    pub outdoor: ThresholdTable,
    #[serde(default = "default_indoor")]
    pub indoor: ThresholdTable,
    #[serde(default)]
    pub housing: HousingRules,
    /// Current-minus-forecast drop (°F) that triggers the step-down.
    #[serde(default = "default_step_down_threshold")]
    pub step_down_threshold_f: f64,
    #[serde(default)]
    pub schedule: PhaseSchedule,
}

/// Lifetimes of cached fetch results (seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_current_ttl")]
    pub current_ttl_secs: u64,
    #[serde(default = "default_forecast_ttl")]
    pub forecast_ttl_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_user_agent() -> String {
    "StablemanApp/1.0".into()
}

fn default_latitude() -> f64 {
    40.7128
}
fn default_longitude() -> f64 {
    -74.0060
}

fn default_outdoor() -> ThresholdTable {
    ThresholdTable::OUTDOOR
}
fn default_indoor() -> ThresholdTable {
    ThresholdTable::INDOOR
}

fn default_heat_index_min_temp() -> f64 {
    75.0
}
fn default_sunny_heat_index() -> f64 {
    120.0
}
fn default_cloudy_heat_index() -> f64 {
    150.0
}
fn default_rain_chance() -> f64 {
    10.0
}
fn default_cloudy_sample_periods() -> usize {
    4
}

fn default_step_down_threshold() -> f64 {
    10.0
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
fn default_morning_start() -> NaiveTime {
    NaiveTime::MIN
}
fn default_day_start() -> NaiveTime {
    hm(11, 0)
}
fn default_night_start() -> NaiveTime {
    hm(15, 50)
}

fn default_current_ttl() -> u64 {
    300
}
fn default_forecast_ttl() -> u64 {
    1800
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
        }
    }
}

impl Default for HousingRules {
    fn default() -> Self {
        Self {
            heat_index_min_temp_f: default_heat_index_min_temp(),
            sunny_heat_index: default_sunny_heat_index(),
            cloudy_heat_index: default_cloudy_heat_index(),
            rain_chance_pct: default_rain_chance(),
            cloudy_sample_periods: default_cloudy_sample_periods(),
        }
    }
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            morning_start: default_morning_start(),
            day_start: default_day_start(),
            night_start: default_night_start(),
        }
    }
}

impl Default for BlanketingConfig {
    fn default() -> Self {
        Self {
            outdoor: default_outdoor(),
            indoor: default_indoor(),
            housing: HousingRules::default(),
            step_down_threshold_f: default_step_down_threshold(),
            schedule: PhaseSchedule::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            current_ttl_secs: default_current_ttl(),
            forecast_ttl_secs: default_forecast_ttl(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ambient: AmbientConfig::default(),
            location: LocationConfig::default(),
            blanketing: BlanketingConfig::default(),
            cache: CacheConfig::default(),
            user_agent: default_user_agent(),
        }
    }
}
