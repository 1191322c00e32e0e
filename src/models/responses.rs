use crate::core::{IntervalNote, IntervalOutcome};
use crate::models::domain::{
    FormulaSummary, NutritionTargets, Patient, WeightCheck, WeightEntry, WeightRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Bearer token issued on login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "tokenType")]
    pub token_type: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

/// Patients on the caller's roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterResponse {
    pub patients: Vec<Patient>,
    pub count: usize,
}

/// Everything shown on a patient's page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInfoResponse {
    pub patient: Patient,
    pub weights: Vec<WeightRecord>,
    #[serde(rename = "weightCheck")]
    pub weight_check: Option<WeightCheck>,
    #[serde(rename = "currentWeightLb")]
    pub current_weight_lb: Option<f64>,
    pub targets: Option<NutritionTargets>,
}

/// Weights entered by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightHistoryResponse {
    pub weights: Vec<WeightEntry>,
    pub count: usize,
}

/// Outcome of one interval in a weight check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalResult {
    #[serde(rename = "intervalMonths")]
    pub interval_months: u32,
    #[serde(rename = "targetDate")]
    pub target_date: Option<NaiveDate>,
    #[serde(rename = "percentChange")]
    pub percent_change: Option<f64>,
    #[serde(rename = "baselineLb")]
    pub baseline_lb: Option<f64>,
    pub note: Option<IntervalNote>,
    /// Human readable form of `note` or `error`
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Freshly computed weight check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightCheckResponse {
    pub summary: WeightCheck,
    #[serde(rename = "referenceDate")]
    pub reference_date: NaiveDate,
    pub intervals: Vec<IntervalResult>,
}

/// Formula pick list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaListResponse {
    pub formulas: Vec<FormulaSummary>,
    pub count: usize,
}

impl From<&IntervalOutcome> for IntervalResult {
    fn from(outcome: &IntervalOutcome) -> Self {
        match &outcome.result {
            Ok(change) => IntervalResult {
                interval_months: outcome.interval_months,
                target_date: Some(change.target_date),
                percent_change: Some(change.percent_change),
                baseline_lb: change.baseline_lb,
                note: change.note.clone(),
                message: change.note.as_ref().map(ToString::to_string),
                error: None,
            },
            Err(e) => IntervalResult {
                interval_months: outcome.interval_months,
                target_date: None,
                percent_change: None,
                baseline_lb: None,
                note: None,
                message: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{IntervalChange, WeightChangeError};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_no_data_outcome_carries_message() {
        let outcome = IntervalOutcome {
            interval_months: 12,
            result: Ok(IntervalChange {
                interval_months: 12,
                target_date: date(2022, 7, 15),
                percent_change: 0.0,
                baseline_lb: None,
                note: Some(IntervalNote::NoData {
                    interval_months: 12,
                    reference_date: date(2022, 7, 15),
                }),
            }),
        };

        let result = IntervalResult::from(&outcome);

        assert_eq!(result.percent_change, Some(0.0));
        assert!(result.error.is_none());
        assert!(result.message.unwrap().starts_with("No weight found for given interval 12 months"));
    }

    #[test]
    fn test_failed_outcome_carries_error() {
        let outcome = IntervalOutcome {
            interval_months: 6,
            result: Err(WeightChangeError::InvalidHistoricalWeight {
                date: date(2023, 1, 15),
                weight_lb: 0.0,
            }),
        };

        let result = IntervalResult::from(&outcome);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["intervalMonths"], 6);
        assert!(json["percentChange"].is_null());
        assert!(json["error"].as_str().unwrap().contains("cannot be used as a baseline"));
    }
}
