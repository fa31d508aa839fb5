//! Threshold-table lookup and the species downgrade.

use common::config::{BlanketingConfig, ThresholdTable};
use common::Error;

use crate::types::{AnimalType, BlanketCategory, HousingStatus};

/// Table used for a housing status. Outdoor animals are acclimated and get
/// the higher bands.
pub fn thresholds_for(config: &BlanketingConfig, housing: HousingStatus) -> &ThresholdTable {
    match housing {
        HousingStatus::Outdoor => &config.outdoor,
        HousingStatus::Indoor => &config.indoor,
    }
}

/// Band containing `effective_temp_f`. Bands are unbounded at both tails.
pub fn raw_category(effective_temp_f: f64, table: &ThresholdTable) -> BlanketCategory {
    if effective_temp_f >= table.none_min_f {
        BlanketCategory::None
    } else if effective_temp_f >= table.light_min_f {
        BlanketCategory::Light
    } else if effective_temp_f >= table.medium_min_f {
        BlanketCategory::Medium
    } else {
        BlanketCategory::Heavy
    }
}

/// Donkeys skip the light and medium layers.
pub fn species_downgrade(category: BlanketCategory, animal: AnimalType) -> BlanketCategory {
    match (animal, category) {
        (AnimalType::Donkey, BlanketCategory::Light | BlanketCategory::Medium) => {
            BlanketCategory::None
        }
        _ => category,
    }
}

pub fn select_category(
    effective_temp_f: f64,
    housing: HousingStatus,
    animal: AnimalType,
    config: &BlanketingConfig,
) -> Result<BlanketCategory, Error> {
    if !effective_temp_f.is_finite() {
        return Err(Error::InvalidInput(format!(
            "effective temperature {effective_temp_f} is not finite"
        )));
    }
    let raw = raw_category(effective_temp_f, thresholds_for(config, housing));
    Ok(species_downgrade(raw, animal))
}
