//! Adapters from the provider clients to the fetch traits.

use std::sync::Arc;

use async_trait::async_trait;
use common::{Error, ForecastReport, WeatherReading, WeatherSource};

use ambient_client::AmbientClient;
use noaa_client::{current_from_forecast, NoaaClient};

use crate::{ConditionsSource, ForecastSource};

#[async_trait]
impl ConditionsSource for AmbientClient {
    fn kind(&self) -> WeatherSource {
        WeatherSource::PersonalStation
    }

    async fn fetch_current(&self) -> Result<WeatherReading, Error> {
        self.get_current().await
    }
}

#[async_trait]
impl ForecastSource for NoaaClient {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastReport, Error> {
        self.get_forecast(latitude, longitude).await
    }
}

/// Current conditions from the first NWS hourly period at a fixed location.
///
/// Reads through whatever forecast source it is given; [`WeatherService`]
/// hands it the same cached source its forecast path uses.
///
/// [`WeatherService`]: crate::WeatherService
#[derive(Clone)]
pub struct NationalForecastSource {
    forecast: Arc<dyn ForecastSource>,
    latitude: f64,
    longitude: f64,
}

impl NationalForecastSource {
    pub fn new(forecast: Arc<dyn ForecastSource>, latitude: f64, longitude: f64) -> Self {
        Self {
            forecast,
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl ConditionsSource for NationalForecastSource {
    fn kind(&self) -> WeatherSource {
        WeatherSource::NationalForecast
    }

    async fn fetch_current(&self) -> Result<WeatherReading, Error> {
        let report = self
            .forecast
            .fetch_forecast(self.latitude, self.longitude)
            .await?;
        current_from_forecast(&report)
    }
}

/// A source that could not be constructed; always fails with the reason.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    kind: WeatherSource,
    reason: String,
}

impl UnavailableSource {
    pub fn new(kind: WeatherSource, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ConditionsSource for UnavailableSource {
    fn kind(&self) -> WeatherSource {
        self.kind
    }

    async fn fetch_current(&self) -> Result<WeatherReading, Error> {
        Err(Error::Config(self.reason.clone()))
    }
}
