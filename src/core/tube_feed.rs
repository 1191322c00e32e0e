use crate::core::targets::round1;
use crate::models::{FormulaProfile, TubeFeedDelivery};
use thiserror::Error;

/// Errors that can occur when calculating tube feed delivery
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TubeFeedError {
    #[error("Feed rate must be zero or more mL/hr, got {0}")]
    InvalidRate(f64),

    #[error("Feeding time must be at least 1 hour, got {0}")]
    InvalidHours(u32),

    #[error("Formula '{0}' has no nutrient data")]
    MissingNutrients(String),

    #[error("Formula '{0}' has no fluid data")]
    MissingFluids(String),
}

/// Nutrition delivered by a formula running at `rate_ml_per_hour` for `hours`
///
/// Protein is stored per litre and free water as a percentage of volume:
/// - kcals = kcal/mL * volume
/// - protein = protein g/L / 1000 * volume
/// - free water = free water % / 100 * volume
///
/// Results are rounded to one decimal.
pub fn calculate_delivery(
    profile: &FormulaProfile,
    rate_ml_per_hour: f64,
    hours: u32,
) -> Result<TubeFeedDelivery, TubeFeedError> {
    if !rate_ml_per_hour.is_finite() || rate_ml_per_hour < 0.0 {
        return Err(TubeFeedError::InvalidRate(rate_ml_per_hour));
    }
    if hours < 1 {
        return Err(TubeFeedError::InvalidHours(hours));
    }

    let formula = &profile.formula;
    let nutrients = profile
        .nutrients
        .as_ref()
        .ok_or_else(|| TubeFeedError::MissingNutrients(formula.name.clone()))?;
    let fluids = profile
        .fluids
        .as_ref()
        .ok_or_else(|| TubeFeedError::MissingFluids(formula.name.clone()))?;

    let volume_ml = rate_ml_per_hour * hours as f64;

    Ok(TubeFeedDelivery {
        formula_id: formula.id,
        formula_name: formula.name.clone(),
        rate_ml_per_hour,
        hours,
        volume_ml: round1(volume_ml),
        kcals: round1(formula.kcal_per_ml * volume_ml),
        protein_g: round1(nutrients.protein_g / 1000.0 * volume_ml),
        free_water_ml: round1(fluids.free_water_percent / 100.0 * volume_ml),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fluids, Formula, Nutrients};

    fn profile() -> FormulaProfile {
        FormulaProfile {
            formula: Formula {
                id: 1,
                name: "Standard 1.2".to_string(),
                category_id: Some(1),
                kcal_per_ml: 1.2,
                lactose_intolerance: None,
                gluten_free: None,
                kosher: None,
                features: None,
                indications: None,
            },
            category: Some("Standard".to_string()),
            nutrients: Some(Nutrients {
                formula_id: 1,
                kcals: Some(1200),
                protein_g: 55.5,
                fat_g: None,
                carb_g: None,
                fiber_g: None,
                scfos_g: None,
            }),
            minerals: None,
            fluids: Some(Fluids {
                formula_id: 1,
                free_water_percent: 81.0,
                water_ml: Some(810),
                osmolality: None,
            }),
        }
    }

    #[test]
    fn test_delivery_at_60_ml_for_20_hours() {
        let delivery = calculate_delivery(&profile(), 60.0, 20).unwrap();

        assert_eq!(delivery.volume_ml, 1200.0);
        assert_eq!(delivery.kcals, 1440.0);
        assert_eq!(delivery.protein_g, 66.6);
        assert_eq!(delivery.free_water_ml, 972.0);
        assert_eq!(delivery.formula_name, "Standard 1.2");
    }

    #[test]
    fn test_zero_rate_delivers_nothing() {
        let delivery = calculate_delivery(&profile(), 0.0, 24).unwrap();

        assert_eq!(delivery.kcals, 0.0);
        assert_eq!(delivery.protein_g, 0.0);
        assert_eq!(delivery.free_water_ml, 0.0);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert_eq!(
            calculate_delivery(&profile(), -1.0, 10),
            Err(TubeFeedError::InvalidRate(-1.0))
        );
        assert_eq!(
            calculate_delivery(&profile(), 50.0, 0),
            Err(TubeFeedError::InvalidHours(0))
        );
    }

    #[test]
    fn test_missing_composition() {
        let mut no_fluids = profile();
        no_fluids.fluids = None;
        assert!(matches!(
            calculate_delivery(&no_fluids, 50.0, 10),
            Err(TubeFeedError::MissingFluids(_))
        ));

        let mut no_nutrients = profile();
        no_nutrients.nutrients = None;
        assert!(matches!(
            calculate_delivery(&no_nutrients, 50.0, 10),
            Err(TubeFeedError::MissingNutrients(_))
        ));
    }
}
