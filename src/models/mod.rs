// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Category, Fluids, Formula, FormulaProfile, FormulaSummary, Minerals, NutritionTargets, Nutrients, Patient,
    Range, TargetFactors, TubeFeedDelivery, User, WeightCheck, WeightEntry, WeightRecord, DEFAULT_ROLE,
};
pub use requests::{CreatePatientRequest, LoginRequest, RecordWeightRequest, RegisterRequest, TubeFeedRequest};
pub use responses::{
    ErrorResponse, FormulaListResponse, HealthResponse, IntervalResult, PatientInfoResponse, RosterResponse,
    TokenResponse, WeightCheckResponse, WeightHistoryResponse,
};
