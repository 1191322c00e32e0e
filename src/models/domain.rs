use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Name of the role every newly registered user receives
pub const DEFAULT_ROLE: &str = "user";

/// Registered care provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

/// Patient on a provider's roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    #[serde(rename = "nameLast")]
    pub name_last: String,
    #[serde(rename = "nameFirst")]
    pub name_first: String,
    pub age: i32,
    pub bed: String,
    #[serde(rename = "providerId")]
    pub provider_id: i64,
}

impl Patient {
    /// "Last, First" as shown on rosters and pick lists
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name_last, self.name_first)
    }
}

/// A single recorded body weight
///
/// `id` orders records that share a date: the higher id was inserted later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub id: i64,
    #[serde(rename = "patientId")]
    pub patient_id: i64,
    pub date: NaiveDate,
    #[serde(rename = "weightLb")]
    pub weight_lb: f64,
}

impl WeightRecord {
    pub fn new(id: i64, patient_id: i64, date: NaiveDate, weight_lb: f64) -> Self {
        Self {
            id,
            patient_id,
            date,
            weight_lb,
        }
    }
}

/// Weight record together with who entered it and when
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    #[serde(flatten)]
    pub record: WeightRecord,
    #[serde(rename = "enteredBy")]
    pub entered_by: i64,
    #[serde(rename = "recordedAt")]
    pub recorded_at: DateTime<Utc>,
}

/// Stored per-patient weight check summary
///
/// An interval whose computation failed is stored as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightCheck {
    #[serde(rename = "patientId")]
    pub patient_id: i64,
    #[serde(rename = "currentWeightLb")]
    pub current_weight_lb: f64,
    #[serde(rename = "oneMonth")]
    pub one_month: Option<f64>,
    #[serde(rename = "threeMonth")]
    pub three_month: Option<f64>,
    #[serde(rename = "sixMonth")]
    pub six_month: Option<f64>,
    #[serde(rename = "twelveMonth")]
    pub twelve_month: Option<f64>,
    #[serde(rename = "checkedAt")]
    pub checked_at: DateTime<Utc>,
}

/// Formula category (standard, peptide-based, renal, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Enteral formula reference entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub kcal_per_ml: f64,
    #[serde(default)]
    pub lactose_intolerance: Option<String>,
    #[serde(default)]
    pub gluten_free: Option<String>,
    #[serde(default)]
    pub kosher: Option<String>,
    #[serde(default)]
    pub features: Option<String>,
    #[serde(default)]
    pub indications: Option<String>,
}

/// Macronutrients per litre of formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub formula_id: i64,
    #[serde(default)]
    pub kcals: Option<i32>,
    pub protein_g: f64,
    #[serde(default)]
    pub fat_g: Option<f64>,
    #[serde(default)]
    pub carb_g: Option<f64>,
    #[serde(default)]
    pub fiber_g: Option<f64>,
    #[serde(default)]
    pub scfos_g: Option<f64>,
}

/// Minerals per litre of formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minerals {
    pub formula_id: i64,
    #[serde(default)]
    pub sodium_mg: Option<i32>,
    #[serde(default)]
    pub potassium_mg: Option<i32>,
    #[serde(default)]
    pub phosphorus_mg: Option<i32>,
    #[serde(default)]
    pub magnesium_mg: Option<i32>,
    #[serde(default)]
    pub vitk_mcg: Option<i32>,
}

/// Water content of formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fluids {
    pub formula_id: i64,
    pub free_water_percent: f64,
    #[serde(default)]
    pub water_ml: Option<i32>,
    #[serde(default)]
    pub osmolality: Option<i32>,
}

/// Formula joined with its category and per-litre composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaProfile {
    pub formula: Formula,
    pub category: Option<String>,
    pub nutrients: Option<Nutrients>,
    pub minerals: Option<Minerals>,
    pub fluids: Option<Fluids>,
}

/// Formula entry for pick lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaSummary {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
}

/// Low/high bound of a daily requirement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

/// Per-kilogram factors used to derive daily nutrition targets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetFactors {
    pub kcal_per_kg: (f64, f64),
    pub protein_g_per_kg: (f64, f64),
    pub fluid_ml_per_kg: (f64, f64),
}

impl Default for TargetFactors {
    fn default() -> Self {
        Self {
            kcal_per_kg: (25.0, 30.0),
            protein_g_per_kg: (1.2, 1.5),
            fluid_ml_per_kg: (30.0, 35.0),
        }
    }
}

/// Daily nutrition targets for a patient's current weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionTargets {
    #[serde(rename = "weightKg")]
    pub weight_kg: f64,
    pub kcals: Range,
    #[serde(rename = "proteinG")]
    pub protein_g: Range,
    #[serde(rename = "fluidsMl")]
    pub fluids_ml: Range,
}

/// Nutrition delivered by running a formula at a rate for a number of hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeFeedDelivery {
    #[serde(rename = "formulaId")]
    pub formula_id: i64,
    #[serde(rename = "formulaName")]
    pub formula_name: String,
    #[serde(rename = "rateMlPerHour")]
    pub rate_ml_per_hour: f64,
    pub hours: u32,
    #[serde(rename = "volumeMl")]
    pub volume_ml: f64,
    pub kcals: f64,
    #[serde(rename = "proteinG")]
    pub protein_g: f64,
    #[serde(rename = "freeWaterMl")]
    pub free_water_ml: f64,
}
