//! Blanketing decision engine.
//!
//! Runs the fixed pipeline feels-like → housing → effective temperature →
//! raw category → species downgrade → step-down over one reading and its
//! forecast. Pure and synchronous: identical inputs give identical output.

use common::config::BlanketingConfig;
use common::feels_like::validate_conditions;
use common::{Error, ForecastPeriod, WeatherReading};
use tracing::debug;

use crate::care_phase::CarePhaseClock;
use crate::category::{raw_category, select_category, species_downgrade, thresholds_for};
use crate::housing::determine_housing;
use crate::instructions::care_instructions;
use crate::step_down::{apply_step_down, is_drop_alert};
use crate::types::{
    AnimalType, BlanketingDecision, HousingStatus, PeriodAssessment, PhaseWindow,
};
use crate::window::{effective_temperature, forecast_window, min_feels_like};

/// The decision engine, parameterised by its threshold tables.
#[derive(Debug, Clone, Default)]
pub struct BlanketingEngine {
    config: BlanketingConfig,
}

impl BlanketingEngine {
    pub fn new(config: BlanketingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BlanketingConfig {
        &self.config
    }

    /// Clock using this engine's phase schedule.
    pub fn clock(&self) -> CarePhaseClock {
        CarePhaseClock::new(self.config.schedule)
    }

    /// Produce one recommendation.
    ///
    /// # Arguments
    /// * `reading`: current conditions, feels-like already computed
    /// * `forecast`: chronological hourly periods covering at least the window
    /// * `window`: current phase from [`CarePhaseClock::locate`]
    /// * `animal`: operator-selected species
    /// * `conservative_morning`: in the Morning phase, look through the
    ///   following night instead of stopping at the Day start
    pub fn decide(
        &self,
        reading: &WeatherReading,
        forecast: &[ForecastPeriod],
        window: &PhaseWindow,
        animal: AnimalType,
        conservative_morning: bool,
    ) -> Result<BlanketingDecision, Error> {
        // 1. Reject implausible measurements.
        validate_conditions(
            reading.temperature_f,
            reading.humidity_pct,
            reading.wind_speed_mph,
        )?;
        if !reading.feels_like_f.is_finite() {
            return Err(Error::InvalidInput(format!(
                "current feels-like {} is not finite",
                reading.feels_like_f
            )));
        }

        // 2. Truncate the forecast to the phase window.
        let window_end = window.end(conservative_morning);
        let periods = forecast_window(forecast, window.now, window_end);
        validate_periods(periods)?;

        // 3. Housing comes first; its result picks the threshold table.
        let housing = determine_housing(reading, periods, &self.config.housing);

        // 4. Effective temperature over the window.
        let current = reading.feels_like_f;
        let forecast_low = min_feels_like(periods);
        let effective = effective_temperature(current, forecast_low);

        // 5. Category with species downgrade.
        let selected = select_category(effective, housing.status, animal, &self.config)?;

        // 6. Anti-overheating step-down, at most once.
        let threshold = self.config.step_down_threshold_f;
        let temp_drop = forecast_low.map(|low| current - low);
        let temp_drop_alert =
            forecast_low.is_some_and(|low| is_drop_alert(current, low, threshold));
        let (mut category, mut stepped_down) = match forecast_low {
            Some(low) => apply_step_down(current, low, selected, threshold),
            None => (selected, false),
        };
        if stepped_down && !animal.allows(category) {
            debug!(
                "step-down {} -> {} not available for {}; keeping {}",
                selected, category, animal, selected
            );
            category = selected;
            stepped_down = false;
        }

        debug!(
            "decide: phase={} current={:.1}°F low={:?} effective={:.1}°F housing={} category={} stepped={}",
            window.phase, current, forecast_low, effective, housing.status, category, stepped_down
        );

        let rationale = build_rationale(
            effective,
            housing.status,
            forecast_low,
            temp_drop_alert,
            stepped_down,
            threshold,
            animal,
        );
        let instructions = care_instructions(category, animal, housing.status);

        Ok(BlanketingDecision {
            category,
            housing: housing.status,
            housing_reason: housing.reason,
            effective_temp_f: effective,
            stepped_down,
            rationale,
            care_instructions: instructions.summary(),
            instructions,
            current_feels_like_f: current,
            forecast_low_f: forecast_low,
            temp_drop_f: temp_drop,
            temp_drop_alert,
            animal,
            phase: window.phase,
            window_end,
            conservative: conservative_morning && window_end != window.normal_end,
        })
    }

    /// Per-period categories across the evaluation window, for display.
    pub fn timeline(
        &self,
        forecast: &[ForecastPeriod],
        window: &PhaseWindow,
        conservative_morning: bool,
        housing: HousingStatus,
        animal: AnimalType,
    ) -> Vec<PeriodAssessment> {
        let table = thresholds_for(&self.config, housing);
        forecast_window(forecast, window.now, window.end(conservative_morning))
            .iter()
            .filter(|p| p.feels_like_f.is_finite())
            .map(|p| PeriodAssessment {
                start_time: p.start_time,
                feels_like_f: p.feels_like_f,
                category: species_downgrade(raw_category(p.feels_like_f, table), animal),
                short_description: p.short_description.clone(),
            })
            .collect()
    }
}

fn validate_periods(periods: &[ForecastPeriod]) -> Result<(), Error> {
    for period in periods {
        if !period.feels_like_f.is_finite() {
            return Err(Error::InvalidInput(format!(
                "forecast period at {} has non-finite feels-like",
                period.start_time
            )));
        }
        if !(0.0..=100.0).contains(&period.precipitation_chance_pct) {
            return Err(Error::InvalidInput(format!(
                "forecast period at {} has precipitation chance {}% outside [0, 100]",
                period.start_time, period.precipitation_chance_pct
            )));
        }
    }
    Ok(())
}

fn build_rationale(
    effective: f64,
    housing: HousingStatus,
    forecast_low: Option<f64>,
    temp_drop_alert: bool,
    stepped_down: bool,
    threshold: f64,
    animal: AnimalType,
) -> String {
    let mut parts = vec![match forecast_low {
        Some(low) => format!(
            "Effective {effective:.1}°F (forecast low {low:.1}°F) with animals {housing}"
        ),
        None => format!("Effective {effective:.1}°F (no forecast in window) with animals {housing}"),
    }];

    if stepped_down {
        parts.push(format!(
            "conditions currently mild but forecast dropping ≥{threshold:.0}°F; \
             stepping down one category to avoid overheating before the drop"
        ));
    } else if temp_drop_alert {
        parts.push(format!(
            "temperature drop of ≥{threshold:.0}°F forecast; no lighter {animal} category available"
        ));
    }

    if animal == AnimalType::Donkey {
        parts.push("donkeys are only blanketed in heavy conditions".into());
    }

    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlanketCategory, CarePhase};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use common::WeatherSource;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 18, 0, 0).unwrap()
    }

    fn night_window() -> PhaseWindow {
        PhaseWindow {
            phase: CarePhase::Night,
            now: now(),
            normal_end: now() + Duration::hours(17),
            conservative_end: now() + Duration::hours(17),
        }
    }

    fn morning_window() -> PhaseWindow {
        PhaseWindow {
            phase: CarePhase::Morning,
            now: now(),
            normal_end: now() + Duration::hours(3),
            conservative_end: now() + Duration::hours(27),
        }
    }

    fn reading(temp: f64, feels_like: f64) -> WeatherReading {
        WeatherReading {
            temperature_f: temp,
            feels_like_f: feels_like,
            humidity_pct: 50.0,
            wind_speed_mph: 5.0,
            source: WeatherSource::PersonalStation,
            station_name: "Barn".into(),
            observed_at: now(),
        }
    }

    fn make_forecast(feels: &[f64]) -> Vec<ForecastPeriod> {
        feels
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let start = now() + Duration::hours(i as i64);
                ForecastPeriod {
                    start_time: start,
                    end_time: start + Duration::hours(1),
                    name: String::new(),
                    temperature_f: f,
                    feels_like_f: f,
                    humidity_pct: 50.0,
                    wind_speed_mph: 5.0,
                    precipitation_chance_pct: 0.0,
                    short_description: "Clear".into(),
                }
            })
            .collect()
    }

    #[test]
    fn test_cold_night_heavy() {
        let engine = BlanketingEngine::default();
        let decision = engine
            .decide(
                &reading(20.0, 9.0),
                &make_forecast(&[9.0, 8.0, 7.0]),
                &night_window(),
                AnimalType::Horse,
                false,
            )
            .unwrap();
        assert_eq!(decision.category, BlanketCategory::Heavy);
        assert_eq!(decision.housing, HousingStatus::Outdoor);
        assert_eq!(decision.effective_temp_f, 7.0);
        assert!(!decision.stepped_down);
    }

    #[test]
    fn test_step_down_on_cold_snap() {
        let engine = BlanketingEngine::default();
        // Mild now, 25°F later: raw Heavy, stepped to Medium.
        let decision = engine
            .decide(
                &reading(48.0, 48.0),
                &make_forecast(&[46.0, 35.0, 25.0]),
                &night_window(),
                AnimalType::Horse,
                false,
            )
            .unwrap();
        assert_eq!(decision.effective_temp_f, 25.0);
        assert_eq!(decision.category, BlanketCategory::Medium);
        assert!(decision.stepped_down);
        assert!(decision.temp_drop_alert);
        assert_eq!(decision.temp_drop_f, Some(23.0));
        assert!(decision.rationale.contains("stepping down one category"));
    }

    #[test]
    fn test_light_not_stepped_to_none() {
        let engine = BlanketingEngine::default();
        let decision = engine
            .decide(
                &reading(55.0, 55.0),
                &make_forecast(&[50.0, 40.0]),
                &night_window(),
                AnimalType::Horse,
                false,
            )
            .unwrap();
        assert_eq!(decision.category, BlanketCategory::Light);
        assert!(!decision.stepped_down);
        assert!(decision.temp_drop_alert);
    }

    #[test]
    fn test_donkey_heavy_not_stepped_off_ladder() {
        let engine = BlanketingEngine::default();
        let decision = engine
            .decide(
                &reading(48.0, 48.0),
                &make_forecast(&[40.0, 20.0]),
                &night_window(),
                AnimalType::Donkey,
                false,
            )
            .unwrap();
        assert_eq!(decision.category, BlanketCategory::Heavy);
        assert!(!decision.stepped_down);
        assert_eq!(decision.instructions.blanket, "Weighted blanket");
    }

    #[test]
    fn test_donkey_medium_becomes_none() {
        let engine = BlanketingEngine::default();
        let decision = engine
            .decide(
                &reading(36.0, 36.0),
                &make_forecast(&[35.0, 34.0]),
                &night_window(),
                AnimalType::Donkey,
                false,
            )
            .unwrap();
        assert_eq!(decision.category, BlanketCategory::None);
    }

    #[test]
    fn test_rain_selects_indoor_table() {
        let engine = BlanketingEngine::default();
        let mut forecast = make_forecast(&[47.0, 47.0]);
        forecast[1].precipitation_chance_pct = 60.0;
        let decision = engine
            .decide(
                &reading(47.0, 47.0),
                &forecast,
                &night_window(),
                AnimalType::Horse,
                false,
            )
            .unwrap();
        assert_eq!(decision.housing, HousingStatus::Indoor);
        assert!(decision.housing_reason.contains("Rain"));
        // 47°F: Light outdoors, None indoors.
        assert_eq!(decision.category, BlanketCategory::None);

        let dry = engine
            .decide(
                &reading(47.0, 47.0),
                &make_forecast(&[47.0, 47.0]),
                &night_window(),
                AnimalType::Horse,
                false,
            )
            .unwrap();
        assert_eq!(dry.housing, HousingStatus::Outdoor);
        assert_eq!(dry.category, BlanketCategory::Light);
    }

    #[test]
    fn test_heat_selects_indoor_table() {
        let engine = BlanketingEngine::default();
        // 85°F + 50% humidity is over the sunny limit; the low is 27°F.
        let decision = engine
            .decide(
                &reading(85.0, 85.0),
                &make_forecast(&[80.0, 27.0]),
                &night_window(),
                AnimalType::Horse,
                false,
            )
            .unwrap();
        assert_eq!(decision.housing, HousingStatus::Indoor);
        assert!(decision.housing_reason.contains("heat index"));
        assert_eq!(decision.effective_temp_f, 27.0);
        // Indoor Medium stepped to Light; outdoors it would be Heavy to Medium.
        assert!(decision.stepped_down);
        assert_eq!(decision.category, BlanketCategory::Light);
    }

    #[test]
    fn test_morning_conservative_sees_further() {
        let engine = BlanketingEngine::default();
        // The first 3 hours are mild; the cold arrives overnight.
        let mut feels = vec![52.0, 51.0, 50.0];
        feels.extend(std::iter::repeat(28.0).take(20));
        let forecast = make_forecast(&feels);

        let normal = engine
            .decide(&reading(52.0, 52.0), &forecast, &morning_window(), AnimalType::Horse, false)
            .unwrap();
        let conservative = engine
            .decide(&reading(52.0, 52.0), &forecast, &morning_window(), AnimalType::Horse, true)
            .unwrap();

        assert_eq!(normal.category, BlanketCategory::None);
        assert_eq!(normal.forecast_low_f, Some(50.0));
        assert!(conservative.window_end > normal.window_end);
        assert!(conservative.conservative);
        // Raw Heavy, stepped to Medium by the 24°F drop.
        assert_eq!(conservative.category, BlanketCategory::Medium);
        assert!(conservative.stepped_down);
    }

    #[test]
    fn test_empty_window_uses_current() {
        let engine = BlanketingEngine::default();
        let decision = engine
            .decide(&reading(38.0, 38.0), &[], &night_window(), AnimalType::Horse, false)
            .unwrap();
        assert_eq!(decision.effective_temp_f, 38.0);
        assert_eq!(decision.forecast_low_f, None);
        assert_eq!(decision.category, BlanketCategory::Medium);
        assert!(!decision.temp_drop_alert);
    }

    #[test]
    fn test_decide_is_idempotent() {
        let engine = BlanketingEngine::default();
        let forecast = make_forecast(&[40.0, 30.0, 22.0]);
        let first = engine
            .decide(&reading(44.0, 41.0), &forecast, &night_window(), AnimalType::Horse, false)
            .unwrap();
        let second = engine
            .decide(&reading(44.0, 41.0), &forecast, &night_window(), AnimalType::Horse, false)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_reading_rejected() {
        let engine = BlanketingEngine::default();
        let mut bad = reading(40.0, 40.0);
        bad.humidity_pct = 130.0;
        let result = engine.decide(&bad, &[], &night_window(), AnimalType::Horse, false);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_forecast_period_rejected() {
        let engine = BlanketingEngine::default();
        let mut forecast = make_forecast(&[40.0, 30.0]);
        forecast[1].feels_like_f = f64::NAN;
        let result =
            engine.decide(&reading(40.0, 40.0), &forecast, &night_window(), AnimalType::Horse, false);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_timeline_matches_window() {
        let engine = BlanketingEngine::default();
        let forecast = make_forecast(&[52.0, 45.0, 35.0, 20.0, 10.0]);
        let timeline = engine.timeline(
            &forecast,
            &morning_window(),
            false,
            HousingStatus::Outdoor,
            AnimalType::Horse,
        );
        let categories: Vec<BlanketCategory> = timeline.iter().map(|p| p.category).collect();
        assert_eq!(
            categories,
            vec![BlanketCategory::None, BlanketCategory::Light, BlanketCategory::Medium]
        );
    }
}
