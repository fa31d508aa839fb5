//! Decision engine inputs and outputs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator-selected species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalType {
    Horse,
    Donkey,
}

impl AnimalType {
    /// Donkeys are either unblanketed or in a weighted blanket.
    pub fn allows(&self, category: BlanketCategory) -> bool {
        match self {
            AnimalType::Horse => true,
            AnimalType::Donkey => matches!(category, BlanketCategory::None | BlanketCategory::Heavy),
        }
    }
}

impl fmt::Display for AnimalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimalType::Horse => write!(f, "horse"),
            AnimalType::Donkey => write!(f, "donkey"),
        }
    }
}

impl FromStr for AnimalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horse" | "horses" => Ok(AnimalType::Horse),
            "donkey" | "donkeys" => Ok(AnimalType::Donkey),
            other => Err(format!("unknown animal type '{other}' (expected horse or donkey)")),
        }
    }
}

/// Blanket weight, ordered lightest to heaviest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlanketCategory {
    None,
    Light,
    Medium,
    Heavy,
}

impl BlanketCategory {
    /// One rank lighter for the anti-overheating rule. Light is the floor:
    /// stepping down never removes the last layer.
    pub fn step_down(self) -> Self {
        match self {
            BlanketCategory::Heavy => BlanketCategory::Medium,
            BlanketCategory::Medium => BlanketCategory::Light,
            other => other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BlanketCategory::None => "none",
            BlanketCategory::Light => "light",
            BlanketCategory::Medium => "medium",
            BlanketCategory::Heavy => "heavy",
        }
    }
}

impl fmt::Display for BlanketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingStatus {
    Outdoor,
    Indoor,
}

impl fmt::Display for HousingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HousingStatus::Outdoor => write!(f, "out"),
            HousingStatus::Indoor => write!(f, "in"),
        }
    }
}

/// Housing result with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HousingDecision {
    pub status: HousingStatus,
    pub reason: String,
    /// Heat/rain protection is mandatory; the default Outdoor result may be
    /// overridden by the operator.
    pub operator_selectable: bool,
    /// Air temperature + relative humidity, when it was evaluated.
    pub equine_heat_index: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarePhase {
    Morning,
    Day,
    Night,
}

impl fmt::Display for CarePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarePhase::Morning => write!(f, "Morning"),
            CarePhase::Day => write!(f, "Day"),
            CarePhase::Night => write!(f, "Night"),
        }
    }
}

/// Current care phase and the instants its forecast window may end at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseWindow {
    pub phase: CarePhase,
    pub now: DateTime<Utc>,
    /// End of the current phase (Morning: Day start the same day).
    pub normal_end: DateTime<Utc>,
    /// Morning only: end of the following Night phase. Equal to
    /// `normal_end` in the other phases.
    pub conservative_end: DateTime<Utc>,
}

impl PhaseWindow {
    pub fn end(&self, conservative_morning: bool) -> DateTime<Utc> {
        if conservative_morning && self.phase == CarePhase::Morning {
            self.conservative_end
        } else {
            self.normal_end
        }
    }
}

/// What to put on the animals, in words.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareInstructions {
    pub title: String,
    pub blanket: String,
    pub notes: Vec<String>,
}

impl CareInstructions {
    pub fn summary(&self) -> String {
        if self.notes.is_empty() {
            format!("{}: {}", self.title, self.blanket)
        } else {
            format!("{}: {}. {}", self.title, self.blanket, self.notes.join(". "))
        }
    }
}

/// One recommendation, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlanketingDecision {
    pub category: BlanketCategory,
    pub housing: HousingStatus,
    pub housing_reason: String,
    pub effective_temp_f: f64,
    pub stepped_down: bool,
    pub rationale: String,
    pub care_instructions: String,
    pub instructions: CareInstructions,
    pub current_feels_like_f: f64,
    /// Lowest feels-like in the evaluation window, if it had any periods.
    pub forecast_low_f: Option<f64>,
    /// Current feels-like minus `forecast_low_f`.
    pub temp_drop_f: Option<f64>,
    pub temp_drop_alert: bool,
    pub animal: AnimalType,
    pub phase: CarePhase,
    pub window_end: DateTime<Utc>,
    pub conservative: bool,
}

/// Per-period view of the evaluation window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAssessment {
    pub start_time: DateTime<Utc>,
    pub feels_like_f: f64,
    pub category: BlanketCategory,
    pub short_description: String,
}
