//! Configuration loader: merges env vars, .env file, and stableman.toml.

use common::config::AppConfig;
use common::Error;
use std::path::Path;

const CONFIG_FILE: &str = "stableman.toml";

/// Environment variables the app expects, with what each one is for.
pub const REQUIRED_VARIABLES: [(&str, &str); 5] = [
    ("AMBIENT_API_KEY", "Your AmbientWeather.net API key"),
    ("AMBIENT_APP_KEY", "Your AmbientWeather.net application key"),
    ("AMBIENT_MAC_ADDRESS", "Your weather station MAC address"),
    ("LOCATION_LATITUDE", "Stable location latitude"),
    ("LOCATION_LONGITUDE", "Stable location longitude"),
];

fn parse_f64(raw: &str, env_name: &str) -> Result<f64, Error> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Config(format!("{env_name} must be a number")))
}

fn parse_non_negative_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 0")))
}

fn non_empty(value: Result<String, std::env::VarError>) -> Option<String> {
    value.ok().filter(|v| !v.trim().is_empty())
}

fn validate_config(config: &AppConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if !(-90.0..=90.0).contains(&config.location.latitude) {
        issues.push("location.latitude must be in [-90, 90]".into());
    }
    if !(-180.0..=180.0).contains(&config.location.longitude) {
        issues.push("location.longitude must be in [-180, 180]".into());
    }
    if config.user_agent.trim().is_empty() {
        issues.push("user_agent must not be empty".into());
    }

    let b = &config.blanketing;
    if !b.outdoor.is_descending() {
        issues.push("blanketing.outdoor thresholds must strictly descend none > light > medium".into());
    }
    if !b.indoor.is_descending() {
        issues.push("blanketing.indoor thresholds must strictly descend none > light > medium".into());
    }
    if !(b.step_down_threshold_f > 0.0) {
        issues.push("blanketing.step_down_threshold_f must be > 0".into());
    }
    if !b.schedule.is_ordered() {
        issues.push(
            "blanketing.schedule must satisfy morning_start < day_start < night_start".into(),
        );
    }
    if !(0.0..=100.0).contains(&b.housing.rain_chance_pct) {
        issues.push("blanketing.housing.rain_chance_pct must be in [0, 100]".into());
    }
    if b.housing.cloudy_sample_periods == 0 {
        issues.push("blanketing.housing.cloudy_sample_periods must be > 0".into());
    }
    if b.housing.sunny_heat_index > b.housing.cloudy_heat_index {
        issues.push(
            "blanketing.housing.sunny_heat_index must be <= blanketing.housing.cloudy_heat_index"
                .into(),
        );
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load configuration from environment and optional config file.
pub fn load_config() -> Result<AppConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = AppConfig::default();

    // 3. Try loading stableman.toml if it exists.
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", CONFIG_FILE, e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", CONFIG_FILE, e)))?;
    }

    // 4. Override with environment variables (highest priority).
    apply_env_overrides(&mut config, |name| non_empty(std::env::var(name)))?;

    validate_config(&config)?;

    Ok(config)
}

fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), Error> {
    if let Some(key) = lookup("AMBIENT_API_KEY") {
        config.ambient.api_key = key;
    }
    if let Some(key) = lookup("AMBIENT_APP_KEY") {
        config.ambient.app_key = key;
    }
    if let Some(mac) = lookup("AMBIENT_MAC_ADDRESS") {
        config.ambient.mac_address = Some(mac.trim().to_string());
    }
    if let Some(raw) = lookup("LOCATION_LATITUDE") {
        config.location.latitude = parse_f64(&raw, "LOCATION_LATITUDE")?;
    }
    if let Some(raw) = lookup("LOCATION_LONGITUDE") {
        config.location.longitude = parse_f64(&raw, "LOCATION_LONGITUDE")?;
    }
    if let Some(raw) = lookup("STABLEMAN_CACHE_TTL_SECS") {
        let ttl = parse_non_negative_u64(&raw, "STABLEMAN_CACHE_TTL_SECS")?;
        config.cache.current_ttl_secs = ttl;
    }
    Ok(())
}

/// Required variables that are unset in the environment.
pub fn missing_variables() -> Vec<(&'static str, &'static str)> {
    missing_variables_with(|name| non_empty(std::env::var(name)))
}

fn missing_variables_with(
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<(&'static str, &'static str)> {
    REQUIRED_VARIABLES
        .iter()
        .filter(|entry| lookup(entry.0).is_none())
        .copied()
        .collect()
}

/// `.env` lines for the missing variables, with sample values.
pub fn env_template(missing: &[(&str, &str)]) -> String {
    missing
        .iter()
        .map(|(name, description)| {
            let sample = match *name {
                "LOCATION_LATITUDE" => "40.7128",
                "LOCATION_LONGITUDE" => "-74.0060",
                _ => "your_value_here",
            };
            format!("{name}={sample}  # {description}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
