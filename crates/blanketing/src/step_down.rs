//! Anti-overheating step-down for a warm-now, cold-later forecast.

use crate::types::BlanketCategory;

/// True when the forecast low sits at least `threshold_f` below the current
/// feels-like temperature.
pub fn is_drop_alert(
    current_feels_like_f: f64,
    min_forecast_feels_like_f: f64,
    threshold_f: f64,
) -> bool {
    current_feels_like_f - min_forecast_feels_like_f >= threshold_f
}

/// Lighten `category` by one rank when a drop alert fires. The flag is set
/// only when the rank actually changed.
pub fn apply_step_down(
    current_feels_like_f: f64,
    min_forecast_feels_like_f: f64,
    category: BlanketCategory,
    threshold_f: f64,
) -> (BlanketCategory, bool) {
    if !is_drop_alert(current_feels_like_f, min_forecast_feels_like_f, threshold_f) {
        return (category, false);
    }
    let stepped = category.step_down();
    (stepped, stepped != category)
}
