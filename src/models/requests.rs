use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to register a new user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 6, max = 20, message = "Username must be 6 to 20 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirmation: String,
}

/// Request to log in
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Must provide username"))]
    pub username: String,
    #[validate(length(min = 1, message = "Must provide password"))]
    pub password: String,
}

/// Request to add a patient to the caller's roster
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "name_last", rename = "nameLast")]
    pub name_last: String,
    #[validate(length(min = 1))]
    #[serde(alias = "name_first", rename = "nameFirst")]
    pub name_first: String,
    #[validate(range(min = 1, max = 130))]
    pub age: i32,
    #[validate(length(min = 1))]
    pub bed: String,
}

/// Request to record a patient weight
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordWeightRequest {
    #[serde(alias = "patient_id", rename = "patientId")]
    pub patient_id: i64,
    #[validate(range(min = 1.0, max = 1500.0, message = "Weight must be between 1 and 1500 lb"))]
    #[serde(alias = "weight_lb", rename = "weightLb")]
    pub weight_lb: f64,
    #[serde(alias = "weight_date", rename = "date")]
    pub date: NaiveDate,
}

/// Request to calculate tube feed delivery
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TubeFeedRequest {
    #[serde(alias = "formula_id", rename = "formulaId")]
    pub formula_id: i64,
    #[validate(range(min = 0.0, message = "Rate must be 0 mL/hr or more"))]
    #[serde(alias = "tube_feed_rate", rename = "rateMlPerHour")]
    pub rate_ml_per_hour: f64,
    #[validate(range(min = 1, message = "Time must be at least 1 hour"))]
    pub hours: u32,
}
