//! Forecast-window truncation and the effective temperature.

use chrono::{DateTime, Utc};
use common::ForecastPeriod;

/// Periods overlapping `[now, end)`. Input must be chronological, so the
/// result is a contiguous sub-slice.
pub fn forecast_window(
    periods: &[ForecastPeriod],
    now: DateTime<Utc>,
    end: DateTime<Utc>,
) -> &[ForecastPeriod] {
    let first = periods
        .iter()
        .position(|p| p.end_time > now)
        .unwrap_or(periods.len());
    let last = periods[first..]
        .iter()
        .position(|p| p.start_time >= end)
        .map_or(periods.len(), |offset| first + offset);
    &periods[first..last]
}

/// Lowest feels-like temperature in the window.
pub fn min_feels_like(window: &[ForecastPeriod]) -> Option<f64> {
    window
        .iter()
        .map(|p| p.feels_like_f)
        .fold(None, |low: Option<f64>, t| Some(low.map_or(t, |l| l.min(t))))
}

/// The colder of now and the window's low.
pub fn effective_temperature(current_feels_like_f: f64, forecast_low_f: Option<f64>) -> f64 {
    forecast_low_f.map_or(current_feels_like_f, |low| current_feels_like_f.min(low))
}
