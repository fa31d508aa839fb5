//! Stableman: horse and donkey blanketing advisor.
//!
//! Single-binary Tokio application that:
//! 1. Fetches current conditions (personal station, NWS fallback)
//! 2. Fetches the hourly NWS forecast for the stable
//! 3. Locates the current care phase
//! 4. Prints the blanketing recommendation

mod config;

use chrono::{DateTime, Local, Utc};
use clap::Parser;
use serde_json::json;
use tracing::{error, info, warn};

use blanketing::{
    AnimalType, BlanketCategory, BlanketingDecision, BlanketingEngine, CarePhase, PhaseWindow,
};
use common::{ForecastReport, WeatherReading};
use weather_service::{CurrentConditions, WeatherService};

/// Horse and donkey blanketing advisor
#[derive(Parser)]
#[command(name = "stableman", about = "Horse and donkey blanketing advisor")]
struct Cli {
    /// Animals being cared for (horse or donkey).
    #[arg(long, default_value = "horse")]
    animal: AnimalType,

    /// Print the recommendation as JSON.
    #[arg(long)]
    json: bool,

    /// Report missing environment configuration, then exit.
    #[arg(long)]
    check_config: bool,

    /// Also show the per-hour category across the evaluation window.
    #[arg(long)]
    timeline: bool,
}

/// Recommendations for one run. In the Morning phase the conservative
/// option (through the following night) is primary and the normal option is
/// shown only when it differs.
struct Recommendation {
    window: PhaseWindow,
    primary: BlanketingDecision,
    alternative: Option<BlanketingDecision>,
}

fn recommend(
    engine: &BlanketingEngine,
    reading: &WeatherReading,
    forecast: &ForecastReport,
    animal: AnimalType,
    now: DateTime<Local>,
) -> Result<Recommendation, common::Error> {
    let window = engine.clock().locate(&now);

    if window.phase != CarePhase::Morning {
        let primary = engine.decide(reading, &forecast.periods, &window, animal, false)?;
        return Ok(Recommendation {
            window,
            primary,
            alternative: None,
        });
    }

    let conservative = engine.decide(reading, &forecast.periods, &window, animal, true)?;
    let normal = engine.decide(reading, &forecast.periods, &window, animal, false)?;
    let alternative = (normal.category != conservative.category).then_some(normal);

    Ok(Recommendation {
        window,
        primary: conservative,
        alternative,
    })
}

/// Operator-facing line for a run that ended in an error.
fn failure_message(err: &common::Error) -> String {
    if err.is_fetch_failure() {
        format!("Weather data unavailable: {}", err)
    } else {
        format!("Cannot produce a recommendation: {}", err)
    }
}

fn local_hm(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%a %H:%M").to_string()
}

fn print_decision(label: &str, decision: &BlanketingDecision) {
    let blanket = match decision.category {
        BlanketCategory::None => "No blanket".to_string(),
        other => format!("{} blanket", other.label().to_uppercase()),
    };
    println!(
        "{}: {}, animals {} (until {})",
        label,
        blanket,
        decision.housing,
        local_hm(decision.window_end)
    );
    println!("  Housing: {}", decision.housing_reason);
    println!("  Why: {}", decision.rationale);
    if decision.temp_drop_alert {
        if let Some(drop) = decision.temp_drop_f {
            println!("  ⚠ Temperature drop alert: {:.1}°F expected", drop);
        }
    }
    println!("  {}: {}", decision.instructions.title, decision.instructions.blanket);
    for note in &decision.instructions.notes {
        println!("    - {}", note);
    }
}

fn print_text(
    conditions: &CurrentConditions,
    forecast: &ForecastReport,
    rec: &Recommendation,
    engine: &BlanketingEngine,
    cli: &Cli,
) {
    let r = &conditions.reading;
    println!(
        "🐴 Stableman: {} care, {} phase",
        cli.animal, rec.window.phase
    );
    println!(
        "Current: {:.1}°F (feels like {:.1}°F), {:.0}% humidity, {:.0} mph wind",
        r.temperature_f, r.feels_like_f, r.humidity_pct, r.wind_speed_mph
    );
    println!("Source: {} - {}", r.source.label(), r.station_name);
    if let Some(reason) = &conditions.primary_failure {
        println!("  (personal station unavailable: {})", reason);
    }
    if !conditions.station_choices.is_empty() {
        println!("  Set AMBIENT_MAC_ADDRESS to one of:");
        for device in &conditions.station_choices {
            println!("    {}  {}", device.mac_address, device.name);
        }
    }
    if !forecast.location.city.is_empty() {
        println!(
            "Forecast: NWS {}, {} ({})",
            forecast.location.city, forecast.location.state, forecast.location.office
        );
    }
    println!();

    match (&rec.window.phase, &rec.alternative) {
        (CarePhase::Morning, Some(normal)) => {
            print_decision("Conservative (through tonight)", &rec.primary);
            println!();
            print_decision("Normal (until Day phase)", normal);
        }
        (CarePhase::Morning, None) => {
            print_decision("Recommendation (same through tonight)", &rec.primary);
        }
        _ => print_decision("Recommendation", &rec.primary),
    }

    if cli.timeline {
        println!();
        println!("Hourly outlook:");
        let periods = engine.timeline(
            &forecast.periods,
            &rec.window,
            rec.primary.conservative,
            rec.primary.housing,
            cli.animal,
        );
        for p in periods {
            println!(
                "  {}  {:>6.1}°F  {:<7} {}",
                local_hm(p.start_time),
                p.feels_like_f,
                p.category.label(),
                p.short_description
            );
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stableman=info,ambient_client=info,noaa_client=info,weather_service=info,blanketing=info"
                    .into()
            }),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.check_config {
        let _ = dotenvy::dotenv();
        let missing = config::missing_variables();
        if missing.is_empty() {
            println!("✅ All configuration variables are set.");
            return;
        }
        println!("🔧 The following environment variables are not set:");
        println!("{}", config::env_template(&missing));
        std::process::exit(1);
    }

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let missing = config::missing_variables();
    if !missing.is_empty() {
        warn!(
            "Unset: {} (run with --check-config for details)",
            missing.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", ")
        );
    }
    info!(
        "Location: {:.4}, {:.4}",
        cfg.location.latitude, cfg.location.longitude
    );

    let service = WeatherService::from_config(&cfg);
    let engine = BlanketingEngine::new(cfg.blanketing.clone());

    let conditions = match service.fetch_current_conditions().await {
        Ok(c) => c,
        Err(e) => {
            error!("{}", failure_message(&e));
            std::process::exit(1);
        }
    };

    let forecast = match service
        .fetch_forecast(cfg.location.latitude, cfg.location.longitude)
        .await
    {
        Ok(f) => f,
        Err(e) => {
            error!("{}", failure_message(&e));
            std::process::exit(1);
        }
    };

    let rec = match recommend(
        &engine,
        &conditions.reading,
        &forecast,
        cli.animal,
        Local::now(),
    ) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", failure_message(&e));
            std::process::exit(1);
        }
    };

    if cli.json {
        let timeline = engine.timeline(
            &forecast.periods,
            &rec.window,
            rec.primary.conservative,
            rec.primary.housing,
            cli.animal,
        );
        let out = json!({
            "conditions": conditions,
            "location": forecast.location,
            "window": rec.window,
            "recommendation": rec.primary,
            "alternative": rec.alternative,
            "timeline": timeline,
        });
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to encode output: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_text(&conditions, &forecast, &rec, &engine, &cli);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::{ForecastPeriod, LocationInfo, WeatherSource};

    fn reading(temp: f64) -> WeatherReading {
        WeatherReading {
            temperature_f: temp,
            feels_like_f: temp,
            humidity_pct: 50.0,
            wind_speed_mph: 0.0,
            source: WeatherSource::PersonalStation,
            station_name: "Barn".into(),
            observed_at: Utc::now(),
        }
    }

    fn forecast_from(start: DateTime<Utc>, feels: &[f64]) -> ForecastReport {
        let periods = feels
            .iter()
            .enumerate()
            .map(|(i, &f)| ForecastPeriod {
                start_time: start + Duration::hours(i as i64),
                end_time: start + Duration::hours(i as i64 + 1),
                name: String::new(),
                temperature_f: f,
                feels_like_f: f,
                humidity_pct: 50.0,
                wind_speed_mph: 0.0,
                precipitation_chance_pct: 0.0,
                short_description: "Clear".into(),
            })
            .collect();
        ForecastReport {
            location: LocationInfo::default(),
            periods,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_morning_shows_normal_only_when_different() {
        let engine = BlanketingEngine::default();
        let now = Local.with_ymd_and_hms(2026, 1, 15, 7, 0, 0).earliest().unwrap();
        let start = now.with_timezone(&Utc);

        // Mild all day and night: both options agree.
        let flat = forecast_from(start, &[55.0; 30]);
        let rec = recommend(&engine, &reading(55.0), &flat, AnimalType::Horse, now).unwrap();
        assert_eq!(rec.window.phase, CarePhase::Morning);
        assert!(rec.primary.conservative);
        assert!(rec.alternative.is_none());

        // Mild until the afternoon, cold overnight.
        let mut feels = vec![55.0; 8];
        feels.extend([20.0; 22]);
        let cold_night = forecast_from(start, &feels);
        let rec = recommend(&engine, &reading(55.0), &cold_night, AnimalType::Horse, now).unwrap();
        let normal = rec.alternative.expect("normal option differs");
        assert_eq!(normal.category, BlanketCategory::None);
        assert!(rec.primary.category > normal.category);
    }

    #[test]
    fn test_night_has_single_option() {
        let engine = BlanketingEngine::default();
        let now = Local.with_ymd_and_hms(2026, 1, 15, 20, 0, 0).earliest().unwrap();
        let forecast = forecast_from(now.with_timezone(&Utc), &[35.0; 24]);
        let rec = recommend(&engine, &reading(36.0), &forecast, AnimalType::Horse, now).unwrap();
        assert_eq!(rec.window.phase, CarePhase::Night);
        assert!(rec.alternative.is_none());
        assert!(!rec.primary.conservative);
    }

    #[test]
    fn test_failure_message_separates_fetch_from_input() {
        let fetch = common::Error::AllSourcesFailed {
            primary: "station offline".into(),
            fallback: "timeout".into(),
        };
        let message = failure_message(&fetch);
        assert!(message.starts_with("Weather data unavailable"));
        assert!(message.contains("timeout"));

        let input = common::Error::InvalidInput("humidity 140".into());
        assert!(failure_message(&input).starts_with("Cannot produce a recommendation"));
    }
}
