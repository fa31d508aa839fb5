//! Housing determination: heat protection first, then rain protection.

use common::config::HousingRules;
use common::{is_cloudy_outlook, ForecastPeriod, WeatherReading};

use crate::types::{HousingDecision, HousingStatus};

/// Air temperature (°F) plus relative humidity (%).
pub fn equine_heat_index(reading: &WeatherReading) -> f64 {
    reading.temperature_f + reading.humidity_pct
}

/// Highest precipitation chance in the window, 0 when empty.
pub fn max_rain_chance(window: &[ForecastPeriod]) -> f64 {
    window
        .iter()
        .map(|p| p.precipitation_chance_pct)
        .fold(0.0, f64::max)
}

/// Decide whether animals stay in. First matching rule wins.
pub fn determine_housing(
    reading: &WeatherReading,
    window: &[ForecastPeriod],
    rules: &HousingRules,
) -> HousingDecision {
    let mut heat_index = None;

    if reading.temperature_f > rules.heat_index_min_temp_f {
        let index = equine_heat_index(reading);
        heat_index = Some(index);

        let cloudy = is_cloudy_outlook(window, rules.cloudy_sample_periods);
        let (limit, sky) = if cloudy {
            (rules.cloudy_heat_index, "cloudy")
        } else {
            (rules.sunny_heat_index, "sunny")
        };

        if index >= limit {
            return HousingDecision {
                status: HousingStatus::Indoor,
                reason: format!("High heat index ({index:.0}) in {sky} weather"),
                operator_selectable: false,
                equine_heat_index: heat_index,
            };
        }
    }

    let rain = max_rain_chance(window);
    if rain >= rules.rain_chance_pct {
        return HousingDecision {
            status: HousingStatus::Indoor,
            reason: format!("Rain expected ({rain:.0}% chance)"),
            operator_selectable: false,
            equine_heat_index: heat_index,
        };
    }

    HousingDecision {
        status: HousingStatus::Outdoor,
        reason: "Good conditions for outdoor housing".into(),
        operator_selectable: true,
        equine_heat_index: heat_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::WeatherSource;

    fn reading(temp: f64, humidity: f64) -> WeatherReading {
        WeatherReading {
            temperature_f: temp,
            feels_like_f: temp,
            humidity_pct: humidity,
            wind_speed_mph: 0.0,
            source: WeatherSource::PersonalStation,
            station_name: "Barn".into(),
            observed_at: Utc::now(),
        }
    }

    fn period(description: &str, rain: f64) -> ForecastPeriod {
        let start = Utc::now();
        ForecastPeriod {
            start_time: start,
            end_time: start + chrono::Duration::hours(1),
            name: String::new(),
            temperature_f: 70.0,
            feels_like_f: 70.0,
            humidity_pct: 50.0,
            wind_speed_mph: 0.0,
            precipitation_chance_pct: rain,
            short_description: description.into(),
        }
    }

    #[test]
    fn test_sunny_heat_keeps_animals_in() {
        let window = vec![period("Sunny", 0.0); 4];
        let decision = determine_housing(&reading(85.0, 70.0), &window, &HousingRules::default());
        assert_eq!(decision.status, HousingStatus::Indoor);
        assert!(!decision.operator_selectable);
        assert_eq!(decision.equine_heat_index, Some(155.0));
    }

    #[test]
    fn test_cloudy_heat_uses_higher_limit() {
        let window = vec![period("Mostly Cloudy", 0.0); 4];
        // 80 + 60 = 140: above the sunny limit, below the cloudy one.
        let decision = determine_housing(&reading(80.0, 60.0), &window, &HousingRules::default());
        assert_eq!(decision.status, HousingStatus::Outdoor);

        let decision = determine_housing(&reading(80.0, 70.0), &window, &HousingRules::default());
        assert_eq!(decision.status, HousingStatus::Indoor);
    }

    #[test]
    fn test_heat_index_ignored_at_or_below_75() {
        let window = vec![period("Sunny", 0.0)];
        let decision = determine_housing(&reading(75.0, 100.0), &window, &HousingRules::default());
        assert_eq!(decision.status, HousingStatus::Outdoor);
        assert_eq!(decision.equine_heat_index, None);
    }

    #[test]
    fn test_rain_threshold_is_inclusive() {
        let window = vec![period("Sunny", 5.0), period("Chance Showers", 10.0)];
        let decision = determine_housing(&reading(55.0, 60.0), &window, &HousingRules::default());
        assert_eq!(decision.status, HousingStatus::Indoor);
        assert!(decision.reason.contains("10%"));
    }

    #[test]
    fn test_default_is_outdoor() {
        let window = vec![period("Sunny", 9.0)];
        let decision = determine_housing(&reading(55.0, 60.0), &window, &HousingRules::default());
        assert_eq!(decision.status, HousingStatus::Outdoor);
        assert!(decision.operator_selectable);
    }
}
