//! National Weather Service API client.
//!
//! Resolves coordinates to a forecast grid via `/points`, fetches the hourly
//! gridpoint forecast and normalizes it into [`ForecastReport`].

use chrono::{DateTime, Utc};
use common::error::body_excerpt;
use common::feels_like::compute_feels_like;
use common::{Error, ForecastPeriod, ForecastReport, LocationInfo, WeatherReading, WeatherSource};
use serde::Deserialize;
use tracing::{debug, warn};

const BASE_URL: &str = "https://api.weather.gov";

/// Hours of hourly forecast kept from each response.
pub const FORECAST_HOURS: usize = 24;

/// Relative humidity assumed when a period omits it.
pub const DEFAULT_HUMIDITY_PCT: f64 = 50.0;

/// NWS API client with connection pooling and User-Agent header.
#[derive(Debug, Clone)]
pub struct NoaaClient {
    client: reqwest::Client,
    base_url: String,
}

// ── NWS response types ────────────────────────────────────────────────

/// Response from `/points/{lat},{lon}`.
#[derive(Debug, Deserialize)]
pub struct PointsResponse {
    pub properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
pub struct PointsProperties {
    #[serde(rename = "gridId", default)]
    pub grid_id: Option<String>,
    #[serde(rename = "gridX", default)]
    pub grid_x: Option<u32>,
    #[serde(rename = "gridY", default)]
    pub grid_y: Option<u32>,
    #[serde(rename = "timeZone", default)]
    pub time_zone: String,
    #[serde(rename = "relativeLocation", default)]
    pub relative_location: Option<RelativeLocation>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelativeLocation {
    #[serde(default)]
    pub properties: RelativeLocationProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelativeLocationProperties {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

/// Hourly forecast response from `/gridpoints/{wfo}/{x},{y}/forecast/hourly`.
#[derive(Debug, Deserialize)]
pub struct HourlyForecastResponse {
    pub properties: HourlyForecastProperties,
}

#[derive(Debug, Deserialize)]
pub struct HourlyForecastProperties {
    #[serde(default)]
    pub periods: Vec<HourlyPeriod>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyPeriod {
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub temperature: serde_json::Value, // can be int or QuantitativeValue
    #[serde(rename = "temperatureUnit", default)]
    pub temperature_unit: Option<String>,
    #[serde(rename = "relativeHumidity", default)]
    pub relative_humidity: Option<QuantValue>,
    #[serde(rename = "windSpeed", default)]
    pub wind_speed: Option<String>,
    #[serde(rename = "probabilityOfPrecipitation", default)]
    pub probability_of_precipitation: Option<QuantValue>,
    #[serde(rename = "shortForecast", default)]
    pub short_forecast: String,
}

#[derive(Debug, Deserialize)]
pub struct QuantValue {
    #[serde(rename = "unitCode", default)]
    pub unit_code: String,
    pub value: Option<f64>,
}

/// Forecast grid cell for a location.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub office: String,
    pub grid_x: u32,
    pub grid_y: u32,
    pub location: LocationInfo,
}

// ── Implementation ────────────────────────────────────────────────────

impl NoaaClient {
    pub fn new(user_agent: &str) -> Self {
        Self::with_base_url(user_agent, BASE_URL)
    }

    /// Client against a different API host (staging mirrors, local fakes).
    pub fn with_base_url(user_agent: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build NWS HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        debug!("Fetching NWS: {}", url);

        let resp = self
            .client
            .get(url)
            .header("Accept", "application/geo+json")
            .send()
            .await
            .map_err(|e| Error::WeatherGov(format!("HTTP error for {}: {}", url, e)))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::WeatherGov(format!(
                "NWS returned {} for {}: {}",
                status,
                url,
                body_excerpt(&body)
            )));
        }

        resp.json()
            .await
            .map_err(|e| Error::WeatherGov(format!("JSON parse error for {}: {}", url, e)))
    }

    /// Resolve coordinates to their forecast office and grid cell.
    pub async fn fetch_grid_point(&self, latitude: f64, longitude: f64) -> Result<GridPoint, Error> {
        let url = format!("{}/points/{},{}", self.base_url, latitude, longitude);
        let points: PointsResponse = self.get_json(&url).await?;
        grid_point_from(points.properties, latitude, longitude)
    }

    /// Fetch the raw hourly forecast for a grid cell.
    pub async fn fetch_hourly_forecast(
        &self,
        grid: &GridPoint,
    ) -> Result<HourlyForecastResponse, Error> {
        let url = format!(
            "{}/gridpoints/{}/{},{}/forecast/hourly",
            self.base_url, grid.office, grid.grid_x, grid.grid_y
        );
        let data: HourlyForecastResponse = self.get_json(&url).await?;

        debug!(
            "Got {} hourly periods for {} ({})",
            data.properties.periods.len(),
            grid.location.city,
            grid.office
        );

        Ok(data)
    }

    /// Fetch and normalize the next 24 hours of forecast for a location.
    pub async fn get_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastReport, Error> {
        let grid = self.fetch_grid_point(latitude, longitude).await?;
        let hourly = self.fetch_hourly_forecast(&grid).await?;
        let periods = normalize_periods(&hourly.properties.periods);

        if periods.is_empty() {
            return Err(Error::WeatherGov(format!(
                "No usable forecast periods for {}, {}",
                latitude, longitude
            )));
        }

        Ok(ForecastReport {
            location: grid.location,
            periods,
            fetched_at: Utc::now(),
        })
    }
}

fn grid_point_from(
    props: PointsProperties,
    latitude: f64,
    longitude: f64,
) -> Result<GridPoint, Error> {
    let (office, grid_x, grid_y) = match (props.grid_id, props.grid_x, props.grid_y) {
        (Some(office), Some(x), Some(y)) if !office.is_empty() => (office, x, y),
        _ => {
            return Err(Error::WeatherGov(format!(
                "Missing grid coordinates for {}, {}",
                latitude, longitude
            )))
        }
    };
    let place = props.relative_location.unwrap_or_default().properties;

    Ok(GridPoint {
        location: LocationInfo {
            city: place.city,
            state: place.state,
            office: office.clone(),
            time_zone: props.time_zone,
            latitude,
            longitude,
        },
        office,
        grid_x,
        grid_y,
    })
}

/// Convert raw hourly periods into normalized ones, keeping the first
/// [`FORECAST_HOURS`]. Periods without a usable temperature are skipped.
pub fn normalize_periods(raw: &[HourlyPeriod]) -> Vec<ForecastPeriod> {
    let mut periods = Vec::with_capacity(FORECAST_HOURS);

    for period in raw.iter().take(FORECAST_HOURS) {
        // Parse temperature (handles both int and QuantitativeValue).
        let temp = match &period.temperature {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::Object(obj) => obj.get("value").and_then(|v| v.as_f64()),
            _ => None,
        };
        let Some(t) = temp else {
            warn!("Skipping period at {}: no temperature", period.start_time);
            continue;
        };
        let temperature_f = match period.temperature_unit.as_deref() {
            Some("C") => t * 9.0 / 5.0 + 32.0,
            _ => t,
        };

        let humidity_pct = period
            .relative_humidity
            .as_ref()
            .and_then(|q| q.value)
            .unwrap_or(DEFAULT_HUMIDITY_PCT);
        let wind_speed_mph = period.wind_speed.as_deref().map_or(0.0, parse_wind_mph);
        let precipitation_chance_pct = period
            .probability_of_precipitation
            .as_ref()
            .and_then(|q| q.value)
            .unwrap_or(0.0);

        let feels_like_f = match compute_feels_like(temperature_f, humidity_pct, wind_speed_mph) {
            Ok(v) => v,
            Err(e) => {
                warn!("Skipping period at {}: {}", period.start_time, e);
                continue;
            }
        };

        periods.push(ForecastPeriod {
            start_time: period.start_time,
            end_time: period.end_time,
            name: period.name.clone(),
            temperature_f,
            feels_like_f,
            humidity_pct,
            wind_speed_mph,
            precipitation_chance_pct,
            short_description: period.short_forecast.clone(),
        });
    }

    periods
}

/// First number in an NWS wind string ("10 mph", "5 to 10 mph").
pub fn parse_wind_mph(text: &str) -> f64 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0.0)
}

/// Use the first forecast period as the current reading.
pub fn current_from_forecast(report: &ForecastReport) -> Result<WeatherReading, Error> {
    let first = report
        .periods
        .first()
        .ok_or_else(|| Error::NoData("Weather.gov returned no forecast periods".into()))?;

    let city = if report.location.city.is_empty() {
        "Weather Station"
    } else {
        report.location.city.as_str()
    };
    let office = if report.location.office.is_empty() {
        "NWS"
    } else {
        report.location.office.as_str()
    };

    Ok(WeatherReading {
        temperature_f: first.temperature_f,
        feels_like_f: first.feels_like_f,
        humidity_pct: first.humidity_pct,
        wind_speed_mph: first.wind_speed_mph,
        source: WeatherSource::NationalForecast,
        station_name: format!("NWS {} ({})", city, office),
        observed_at: first.start_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: &str = r#"{
        "properties": {
            "gridId": "OKX",
            "gridX": 33,
            "gridY": 35,
            "timeZone": "America/New_York",
            "relativeLocation": {
                "properties": { "city": "Hoboken", "state": "NJ" }
            }
        }
    }"#;

    const HOURLY: &str = r#"{
        "properties": {
            "periods": [
                {
                    "number": 1,
                    "name": "",
                    "startTime": "2026-01-15T18:00:00-05:00",
                    "endTime": "2026-01-15T19:00:00-05:00",
                    "temperature": 20,
                    "temperatureUnit": "F",
                    "relativeHumidity": { "unitCode": "wmoUnit:percent", "value": 64 },
                    "windSpeed": "10 mph",
                    "probabilityOfPrecipitation": { "unitCode": "wmoUnit:percent", "value": 20 },
                    "shortForecast": "Mostly Cloudy"
                },
                {
                    "number": 2,
                    "startTime": "2026-01-15T19:00:00-05:00",
                    "endTime": "2026-01-15T20:00:00-05:00",
                    "temperature": 45,
                    "temperatureUnit": "F",
                    "windSpeed": "5 to 15 mph",
                    "probabilityOfPrecipitation": { "unitCode": "wmoUnit:percent", "value": null },
                    "shortForecast": "Clear"
                },
                {
                    "number": 3,
                    "startTime": "2026-01-15T20:00:00-05:00",
                    "endTime": "2026-01-15T21:00:00-05:00",
                    "temperature": null,
                    "shortForecast": "Clear"
                }
            ]
        }
    }"#;

    #[test]
    fn test_grid_point_from_points_response() {
        let points: PointsResponse = serde_json::from_str(POINTS).unwrap();
        let grid = grid_point_from(points.properties, 40.74, -74.03).unwrap();
        assert_eq!(grid.office, "OKX");
        assert_eq!((grid.grid_x, grid.grid_y), (33, 35));
        assert_eq!(grid.location.city, "Hoboken");
        assert_eq!(grid.location.time_zone, "America/New_York");
    }

    #[test]
    fn test_missing_grid_is_an_error() {
        let points: PointsResponse =
            serde_json::from_str(r#"{"properties": {"gridId": "OKX"}}"#).unwrap();
        assert!(matches!(
            grid_point_from(points.properties, 0.0, 0.0),
            Err(Error::WeatherGov(_))
        ));
    }

    #[test]
    fn test_normalize_hourly_periods() {
        let hourly: HourlyForecastResponse = serde_json::from_str(HOURLY).unwrap();
        let periods = normalize_periods(&hourly.properties.periods);

        // The third period has no temperature.
        assert_eq!(periods.len(), 2);

        let first = &periods[0];
        assert_eq!(first.temperature_f, 20.0);
        assert_eq!(first.humidity_pct, 64.0);
        assert_eq!(first.wind_speed_mph, 10.0);
        assert_eq!(first.precipitation_chance_pct, 20.0);
        assert!((first.feels_like_f - 9.0).abs() < 0.2);
        assert!(first.is_cloudy());

        let second = &periods[1];
        assert_eq!(second.humidity_pct, DEFAULT_HUMIDITY_PCT);
        assert_eq!(second.wind_speed_mph, 5.0);
        assert_eq!(second.precipitation_chance_pct, 0.0);
        // 45°F with 5 mph wind is in wind-chill territory.
        assert!(second.feels_like_f < 45.0);
        assert!(second.start_time < second.end_time);
    }

    #[test]
    fn test_normalize_caps_at_24_hours() {
        let raw: Vec<HourlyPeriod> = (0..30)
            .map(|i| HourlyPeriod {
                start_time: Utc::now() + chrono::Duration::hours(i),
                end_time: Utc::now() + chrono::Duration::hours(i + 1),
                name: String::new(),
                temperature: serde_json::json!(60),
                temperature_unit: Some("F".into()),
                relative_humidity: None,
                wind_speed: None,
                probability_of_precipitation: None,
                short_forecast: "Sunny".into(),
            })
            .collect();
        assert_eq!(normalize_periods(&raw).len(), FORECAST_HOURS);
    }

    #[test]
    fn test_parse_wind() {
        assert_eq!(parse_wind_mph("10 mph"), 10.0);
        assert_eq!(parse_wind_mph("5 to 15 mph"), 5.0);
        assert_eq!(parse_wind_mph("calm"), 0.0);
        assert_eq!(parse_wind_mph(""), 0.0);
    }

    #[test]
    fn test_current_from_first_period() {
        let hourly: HourlyForecastResponse = serde_json::from_str(HOURLY).unwrap();
        let points: PointsResponse = serde_json::from_str(POINTS).unwrap();
        let grid = grid_point_from(points.properties, 40.74, -74.03).unwrap();
        let report = ForecastReport {
            location: grid.location,
            periods: normalize_periods(&hourly.properties.periods),
            fetched_at: Utc::now(),
        };

        let reading = current_from_forecast(&report).unwrap();
        assert_eq!(reading.source, WeatherSource::NationalForecast);
        assert_eq!(reading.temperature_f, 20.0);
        assert_eq!(reading.station_name, "NWS Hoboken (OKX)");
    }

    #[test]
    fn test_current_from_empty_forecast() {
        let report = ForecastReport {
            location: LocationInfo::default(),
            periods: vec![],
            fetched_at: Utc::now(),
        };
        assert!(matches!(current_from_forecast(&report), Err(Error::NoData(_))));
    }
}
