//! Weather fetch with provider fallback.
//!
//! Current conditions come from the personal station first and from the NWS
//! hourly forecast when the station fails. The caller gets one complete
//! reading tagged with its source, or [`Error::AllSourcesFailed`] naming both
//! failures. Results are cached per TTL.

pub mod cache;
pub mod sources;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::config::{AppConfig, CacheConfig};
use common::{Error, ForecastReport, StationDevice, WeatherReading, WeatherSource};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{get_fresh, new_conditions_cache, CacheEntry, CachedForecastSource, ConditionsCache};

pub use sources::{NationalForecastSource, UnavailableSource};

/// A provider of current conditions.
#[async_trait]
pub trait ConditionsSource: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> WeatherSource;

    async fn fetch_current(&self) -> Result<WeatherReading, Error>;
}

/// A provider of hourly forecasts.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastReport, Error>;
}

/// A reading plus what happened to the primary source on the way.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentConditions {
    pub reading: WeatherReading,
    /// Why the primary source was skipped, when the fallback answered.
    pub primary_failure: Option<String>,
    /// Stations the operator can choose from when none is configured.
    pub station_choices: Vec<StationDevice>,
}

impl CurrentConditions {
    pub fn used_fallback(&self) -> bool {
        self.primary_failure.is_some()
    }
}

const CURRENT_KEY: &str = "current";

/// Unified fetch service.
pub struct WeatherService {
    primary: Arc<dyn ConditionsSource>,
    fallback: Arc<dyn ConditionsSource>,
    forecast: Arc<CachedForecastSource>,
    conditions_cache: ConditionsCache,
    current_ttl: Duration,
    /// Serializes refreshes so concurrent callers share one upstream fetch.
    refresh: Mutex<()>,
}

impl WeatherService {
    pub fn new(
        primary: Arc<dyn ConditionsSource>,
        fallback: Arc<dyn ConditionsSource>,
        forecast: Arc<dyn ForecastSource>,
        cache: &CacheConfig,
    ) -> Self {
        Self::assemble(primary, fallback, cached_forecast(forecast, cache), cache)
    }

    /// Use the forecast's first hour as the fallback for current
    /// conditions. The fallback and [`fetch_forecast`](Self::fetch_forecast)
    /// share one forecast cache.
    pub fn with_forecast_fallback(
        primary: Arc<dyn ConditionsSource>,
        forecast: Arc<dyn ForecastSource>,
        latitude: f64,
        longitude: f64,
        cache: &CacheConfig,
    ) -> Self {
        let forecast = cached_forecast(forecast, cache);
        let fallback = Arc::new(NationalForecastSource::new(
            forecast.clone(),
            latitude,
            longitude,
        ));
        Self::assemble(primary, fallback, forecast, cache)
    }

    fn assemble(
        primary: Arc<dyn ConditionsSource>,
        fallback: Arc<dyn ConditionsSource>,
        forecast: Arc<CachedForecastSource>,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            primary,
            fallback,
            forecast,
            conditions_cache: new_conditions_cache(),
            current_ttl: Duration::from_secs(cache.current_ttl_secs),
            refresh: Mutex::new(()),
        }
    }

    /// Wire the AmbientWeather station as primary and the NWS as fallback
    /// and forecast source. Missing station credentials leave the primary
    /// permanently failing with the configuration reason.
    pub fn from_config(config: &AppConfig) -> Self {
        let noaa = noaa_client::NoaaClient::new(&config.user_agent);

        let primary: Arc<dyn ConditionsSource> =
            match ambient_client::AmbientClient::new(&config.ambient, &config.user_agent) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    warn!("AmbientWeather.net unavailable: {}", e);
                    Arc::new(UnavailableSource::new(
                        WeatherSource::PersonalStation,
                        e.to_string(),
                    ))
                }
            };

        Self::with_forecast_fallback(
            primary,
            Arc::new(noaa),
            config.location.latitude,
            config.location.longitude,
            &config.cache,
        )
    }

    /// Current reading from whichever source answered.
    pub async fn fetch_current(&self) -> Result<WeatherReading, Error> {
        self.fetch_current_conditions().await.map(|c| c.reading)
    }

    /// Current reading with fallback details.
    pub async fn fetch_current_conditions(&self) -> Result<CurrentConditions, Error> {
        if let Some(hit) = get_fresh(&self.conditions_cache, CURRENT_KEY, self.current_ttl) {
            debug!("Current conditions served from cache");
            return Ok(hit);
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(hit) = get_fresh(&self.conditions_cache, CURRENT_KEY, self.current_ttl) {
            return Ok(hit);
        }

        let conditions = self.fetch_with_fallback().await?;
        self.conditions_cache
            .insert(CURRENT_KEY.to_string(), CacheEntry::new(conditions.clone()));
        Ok(conditions)
    }

    async fn fetch_with_fallback(&self) -> Result<CurrentConditions, Error> {
        debug!("Trying {}", self.primary.kind().label());
        let primary_err = match self.primary.fetch_current().await {
            Ok(reading) => {
                info!("Current conditions from {}", reading.source.label());
                return Ok(CurrentConditions {
                    reading,
                    primary_failure: None,
                    station_choices: Vec::new(),
                });
            }
            Err(e) => e,
        };
        warn!("{} failed: {}", self.primary.kind().label(), primary_err);

        info!("Falling back to {}", self.fallback.kind().label());
        match self.fallback.fetch_current().await {
            Ok(reading) => {
                let station_choices = match &primary_err {
                    Error::DeviceSelection { devices } => devices.clone(),
                    _ => Vec::new(),
                };
                Ok(CurrentConditions {
                    reading,
                    primary_failure: Some(primary_err.to_string()),
                    station_choices,
                })
            }
            Err(fallback_err) => {
                warn!("{} failed: {}", self.fallback.kind().label(), fallback_err);
                Err(Error::AllSourcesFailed {
                    primary: primary_err.to_string(),
                    fallback: fallback_err.to_string(),
                })
            }
        }
    }

    /// Hourly forecast for a location.
    pub async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastReport, Error> {
        self.forecast.fetch_forecast(latitude, longitude).await
    }

    /// Drop every cached result.
    pub fn invalidate(&self) {
        self.conditions_cache.clear();
        self.forecast.clear();
    }
}

fn cached_forecast(forecast: Arc<dyn ForecastSource>, cache: &CacheConfig) -> Arc<CachedForecastSource> {
    Arc::new(CachedForecastSource::new(
        forecast,
        Duration::from_secs(cache.forecast_ttl_secs),
    ))
}
