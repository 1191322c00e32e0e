use crate::models::{NutritionTargets, Range, TargetFactors};

/// Pounds per kilogram, as used on the clinical worksheets
pub const LB_PER_KG: f64 = 2.2;

/// Round to one decimal place for display
#[inline]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Daily calorie, protein and fluid ranges for a body weight in pounds
///
/// Each bound is `weight_kg * factor`, rounded to one decimal.
pub fn nutrition_targets(weight_lb: f64, factors: &TargetFactors) -> NutritionTargets {
    let weight_kg = weight_lb / LB_PER_KG;
    let range = |(low, high): (f64, f64)| Range {
        low: round1(weight_kg * low),
        high: round1(weight_kg * high),
    };

    NutritionTargets {
        weight_kg: round1(weight_kg),
        kcals: range(factors.kcal_per_kg),
        protein_g: range(factors.protein_g_per_kg),
        fluids_ml: range(factors.fluid_ml_per_kg),
    }
}
