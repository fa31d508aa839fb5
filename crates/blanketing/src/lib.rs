//! Blanketing decision engine.
//!
//! Turns a normalized weather reading and hourly forecast into a blanket
//! recommendation for horses or donkeys. No I/O happens here; fetching is
//! the `weather_service` crate's job.

pub mod care_phase;
pub mod category;
pub mod engine;
pub mod housing;
pub mod instructions;
pub mod step_down;
pub mod types;
pub mod window;

pub use care_phase::CarePhaseClock;
pub use category::select_category;
pub use common::feels_like::compute_feels_like;
pub use engine::BlanketingEngine;
pub use housing::determine_housing;
pub use step_down::apply_step_down;
pub use types::{
    AnimalType, BlanketCategory, BlanketingDecision, CareInstructions, CarePhase,
    HousingDecision, HousingStatus, PeriodAssessment, PhaseWindow,
};
