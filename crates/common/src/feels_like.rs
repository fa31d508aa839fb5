//! Apparent-temperature formulas.
//!
//! Heat index uses the NWS Rothfusz regression; wind chill uses the 2001 NWS
//! formula. Both results are rounded to 0.1°F.

use crate::Error;

/// Heat index applies at or above this air temperature.
pub const HEAT_INDEX_MIN_TEMP_F: f64 = 80.0;
/// Wind chill applies at or below this air temperature...
pub const WIND_CHILL_MAX_TEMP_F: f64 = 50.0;
/// ...and only when the wind is stronger than this.
pub const WIND_CHILL_MIN_WIND_MPH: f64 = 3.0;

const MIN_PLAUSIBLE_TEMP_F: f64 = -100.0;
const MAX_PLAUSIBLE_TEMP_F: f64 = 150.0;
const MAX_PLAUSIBLE_WIND_MPH: f64 = 250.0;

/// Reject measurements no real sensor would report.
pub fn validate_conditions(
    temperature_f: f64,
    humidity_pct: f64,
    wind_speed_mph: f64,
) -> Result<(), Error> {
    if !temperature_f.is_finite()
        || !(MIN_PLAUSIBLE_TEMP_F..=MAX_PLAUSIBLE_TEMP_F).contains(&temperature_f)
    {
        return Err(Error::InvalidInput(format!(
            "temperature {temperature_f}°F outside [{MIN_PLAUSIBLE_TEMP_F}, {MAX_PLAUSIBLE_TEMP_F}]"
        )));
    }
    if !humidity_pct.is_finite() || !(0.0..=100.0).contains(&humidity_pct) {
        return Err(Error::InvalidInput(format!(
            "humidity {humidity_pct}% outside [0, 100]"
        )));
    }
    if !wind_speed_mph.is_finite() || !(0.0..=MAX_PLAUSIBLE_WIND_MPH).contains(&wind_speed_mph) {
        return Err(Error::InvalidInput(format!(
            "wind speed {wind_speed_mph} mph outside [0, {MAX_PLAUSIBLE_WIND_MPH}]"
        )));
    }
    Ok(())
}

/// Feels-like temperature in °F.
pub fn compute_feels_like(
    temperature_f: f64,
    humidity_pct: f64,
    wind_speed_mph: f64,
) -> Result<f64, Error> {
    validate_conditions(temperature_f, humidity_pct, wind_speed_mph)?;

    if temperature_f >= HEAT_INDEX_MIN_TEMP_F {
        Ok(heat_index(temperature_f, humidity_pct))
    } else if temperature_f <= WIND_CHILL_MAX_TEMP_F && wind_speed_mph > WIND_CHILL_MIN_WIND_MPH {
        Ok(wind_chill(temperature_f, wind_speed_mph))
    } else {
        Ok(temperature_f)
    }
}

/// NWS heat-index regression. Only meaningful at or above 80°F.
pub fn heat_index(t: f64, rh: f64) -> f64 {
    let hi = -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh
        - 0.224_755_41 * t * rh
        - 6.837_83e-3 * t * t
        - 5.481_717e-2 * rh * rh
        + 1.228_74e-3 * t * t * rh
        + 8.528_2e-4 * t * rh * rh
        - 1.99e-6 * t * t * rh * rh;
    round_tenth(hi)
}

/// NWS wind-chill formula.
pub fn wind_chill(t: f64, v: f64) -> f64 {
    let v16 = v.powf(0.16);
    round_tenth(35.74 + 0.6215 * t - 35.75 * v16 + 0.4275 * t * v16)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
