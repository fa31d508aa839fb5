//! AmbientWeather.net personal weather station client.
//!
//! Requests are paced by [`RateLimiter`] and HTTP 429 responses are retried
//! a bounded number of times before surfacing [`Error::RateLimited`].

pub mod rate_limit;

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::config::AmbientConfig;
use common::feels_like::compute_feels_like;
use common::error::body_excerpt;
use common::{Error, StationDevice, WeatherReading, WeatherSource};
use serde::Deserialize;
use tracing::{debug, info, warn};

pub use rate_limit::RateLimiter;

const BASE_URL: &str = "https://rt.ambientweather.net/v1";

/// Attempts per request when the API answers 429.
pub const MAX_ATTEMPTS: u32 = 3;
/// Pause between 429 retries.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// AmbientWeather.net client.
#[derive(Debug, Clone)]
pub struct AmbientClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    app_key: String,
    mac_address: Option<String>,
    limiter: RateLimiter,
}

// ── AmbientWeather response types ─────────────────────────────────────

/// Entry from `/devices`.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    #[serde(rename = "macAddress", default)]
    pub mac_address: String,
    #[serde(default)]
    pub info: Option<DeviceInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub name: Option<String>,
}

/// One record from `/devices/{mac}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    /// Epoch milliseconds.
    #[serde(default)]
    pub dateutc: Option<i64>,
    #[serde(default)]
    pub tempf: Option<f64>,
    #[serde(rename = "feelsLike", alias = "feelslikef", default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub windspeedmph: Option<f64>,
}

impl Device {
    fn to_station(&self) -> StationDevice {
        let name = self
            .info
            .as_ref()
            .and_then(|i| i.name.clone())
            .unwrap_or_else(|| "Unnamed Station".into());
        StationDevice {
            mac_address: self.mac_address.clone(),
            name,
        }
    }
}

// ── Implementation ────────────────────────────────────────────────────

impl AmbientClient {
    /// Build a client from account credentials. Fails when either key is
    /// missing.
    pub fn new(config: &AmbientConfig, user_agent: &str) -> Result<Self, Error> {
        Self::with_base_url(config, user_agent, BASE_URL)
    }

    pub fn with_base_url(
        config: &AmbientConfig,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, Error> {
        if !config.has_credentials() {
            return Err(Error::Config(
                "Weather API keys not configured. Set AMBIENT_API_KEY and AMBIENT_APP_KEY environment variables."
                    .into(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build AmbientWeather HTTP client");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            app_key: config.app_key.trim().to_string(),
            mac_address: config
                .mac_address
                .as_ref()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            limiter: RateLimiter::new(),
        })
    }

    pub fn mac_address(&self) -> Option<&str> {
        self.mac_address.as_deref()
    }

    /// Rate-limited GET with bounded retry on 429.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query = vec![
            ("apiKey", self.api_key.clone()),
            ("applicationKey", self.app_key.clone()),
        ];
        query.extend(params.iter().map(|(k, v)| (*k, v.clone())));

        for attempt in 1..=MAX_ATTEMPTS {
            self.limiter.wait().await;
            debug!("Fetching AmbientWeather: {} (attempt {})", url, attempt);

            let resp = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(|e| Error::AmbientWeather(format!("HTTP error for {}: {}", endpoint, e)))?;

            let status = resp.status().as_u16();
            if status == 429 {
                if attempt < MAX_ATTEMPTS {
                    warn!(
                        "AmbientWeather rate limited on {}; retrying in {:?}",
                        endpoint, RETRY_DELAY
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
                break;
            }
            if status != 200 {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::AmbientWeather(format!(
                    "AmbientWeather returned {} for {}: {}",
                    status,
                    endpoint,
                    body_excerpt(&body)
                )));
            }

            return resp.json().await.map_err(|e| {
                Error::AmbientWeather(format!("JSON parse error for {}: {}", endpoint, e))
            });
        }

        Err(Error::RateLimited {
            retry_after_ms: RETRY_DELAY.as_millis() as u64,
        })
    }

    /// Stations registered to the account.
    pub async fn fetch_devices(&self) -> Result<Vec<StationDevice>, Error> {
        let devices: Vec<Device> = self.get_json("devices", &[]).await?;
        if devices.is_empty() {
            return Err(Error::NoData("No weather stations found".into()));
        }
        Ok(devices.iter().map(Device::to_station).collect())
    }

    /// Most recent `limit` records from one station, newest first.
    pub async fn fetch_device_data(
        &self,
        mac_address: &str,
        limit: u32,
    ) -> Result<Vec<DeviceRecord>, Error> {
        let endpoint = format!("devices/{}", mac_address);
        self.get_json(&endpoint, &[("limit", limit.to_string())])
            .await
    }

    /// Latest reading from the configured station.
    ///
    /// Without a configured MAC address the account's stations are listed
    /// and returned as [`Error::DeviceSelection`] so the operator can pick
    /// one.
    pub async fn get_current(&self) -> Result<WeatherReading, Error> {
        let Some(mac) = self.mac_address.as_deref() else {
            let devices = self.fetch_devices().await?;
            info!(
                "No station configured; {} available for selection",
                devices.len()
            );
            return Err(Error::DeviceSelection { devices });
        };

        let records = self.fetch_device_data(mac, 1).await?;
        let latest = records.first().ok_or_else(|| {
            Error::NoData(format!("No weather data available for station {}", mac))
        })?;
        reading_from_record(latest, mac)
    }
}

/// Normalize a station record. Feels-like is taken from the station when it
/// reports one and computed otherwise.
pub fn reading_from_record(record: &DeviceRecord, mac_address: &str) -> Result<WeatherReading, Error> {
    let temperature_f = record.tempf.ok_or_else(|| {
        Error::AmbientWeather(format!("Station {} reported no temperature", mac_address))
    })?;
    let humidity_pct = record.humidity.ok_or_else(|| {
        Error::AmbientWeather(format!("Station {} reported no humidity", mac_address))
    })?;
    let wind_speed_mph = record.windspeedmph.unwrap_or(0.0);

    let feels_like_f = match record.feels_like {
        Some(v) if v.is_finite() => v,
        _ => compute_feels_like(temperature_f, humidity_pct, wind_speed_mph)?,
    };

    let observed_at = record
        .dateutc
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);

    Ok(WeatherReading {
        temperature_f,
        feels_like_f,
        humidity_pct,
        wind_speed_mph,
        source: WeatherSource::PersonalStation,
        station_name: format!("Weather Station ({})", mac_address),
        observed_at,
    })
}
