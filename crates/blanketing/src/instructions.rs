//! Care instructions for each blanket category.

use crate::types::{AnimalType, BlanketCategory, CareInstructions, HousingStatus};

pub fn care_instructions(
    category: BlanketCategory,
    animal: AnimalType,
    housing: HousingStatus,
) -> CareInstructions {
    let outdoor = housing == HousingStatus::Outdoor;

    let (title, horse_blanket, notes) = match category {
        BlanketCategory::None => (
            "No Blanket Needed",
            "No blanketing required",
            vec![if outdoor {
                "Ensure adequate shade and water"
            } else {
                "Ensure adequate ventilation in barn"
            }],
        ),
        BlanketCategory::Light => (
            "Light Blanketing",
            "Turnout sheet without neck piece",
            vec!["Monitor for comfort and proper fit"],
        ),
        BlanketCategory::Medium => (
            "Medium Blanketing",
            "Fleece sheet + turnout sheet with neck piece over it",
            vec!["Check layering is secure and comfortable"],
        ),
        BlanketCategory::Heavy => (
            "Heavy Blanketing",
            "Weighted blanket with neck piece + turnout sheet without neck piece over it",
            vec![
                "Check animals hourly for signs of cold stress",
                if outdoor {
                    "Ensure adequate shelter and windbreak"
                } else {
                    "Monitor closely even in barn environment"
                },
            ],
        ),
    };

    let blanket = match (animal, category) {
        (AnimalType::Donkey, BlanketCategory::Heavy) => "Weighted blanket",
        (AnimalType::Donkey, _) => "No blanketing required",
        (AnimalType::Horse, _) => horse_blanket,
    };

    CareInstructions {
        title: title.into(),
        blanket: blanket.into(),
        notes: notes.into_iter().map(String::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heavy_outdoor_horse() {
        let ci = care_instructions(BlanketCategory::Heavy, AnimalType::Horse, HousingStatus::Outdoor);
        assert_eq!(ci.title, "Heavy Blanketing");
        assert!(ci.blanket.starts_with("Weighted blanket with neck piece"));
        assert_eq!(ci.notes.len(), 2);
        assert!(ci.summary().contains("windbreak"));
    }

    #[test]
    fn test_donkey_blankets() {
        let heavy = care_instructions(BlanketCategory::Heavy, AnimalType::Donkey, HousingStatus::Indoor);
        assert_eq!(heavy.blanket, "Weighted blanket");
        let none = care_instructions(BlanketCategory::None, AnimalType::Donkey, HousingStatus::Indoor);
        assert_eq!(none.blanket, "No blanketing required");
        assert!(none.summary().contains("ventilation"));
    }
}
