use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{IntervalResult, RecordWeightRequest, WeightCheckResponse, WeightHistoryResponse};
use crate::routes::{ApiError, AppState, RequestContext};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/weights", web::post().to(record_weight))
        .route("/weights/history", web::get().to(weight_history))
        .route("/patients/{id}/weight-check", web::post().to(run_weight_check))
        .route("/patients/{id}/weight-check", web::get().to(get_weight_check));
}

/// Record a patient weight
///
/// POST /api/v1/weights
///
/// Request body:
/// ```json
/// {
///   "patientId": 1,
///   "weightLb": 142.5,
///   "date": "2023-07-15"
/// }
/// ```
async fn record_weight(
    state: web::Data<AppState>,
    ctx: RequestContext,
    req: web::Json<RecordWeightRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let entry = state
        .postgres
        .insert_weight(ctx.user_id, req.patient_id, req.date, req.weight_lb)
        .await?;

    tracing::info!(
        "User {} recorded {} lb for patient {} on {}",
        ctx.username,
        req.weight_lb,
        req.patient_id,
        req.date
    );

    Ok(HttpResponse::Created().json(entry))
}

/// Weights the caller has entered
///
/// GET /api/v1/weights/history
async fn weight_history(
    state: web::Data<AppState>,
    ctx: RequestContext,
) -> Result<HttpResponse, ApiError> {
    let weights = state.postgres.weights_entered_by(ctx.user_id).await?;

    Ok(HttpResponse::Ok().json(WeightHistoryResponse {
        count: weights.len(),
        weights,
    }))
}

/// Compute and store a patient's weight check
///
/// POST /api/v1/patients/{id}/weight-check
///
/// The patient's latest weight is compared against each configured
/// interval. Intervals that fail are reported individually and stored as
/// null; the request itself still succeeds.
async fn run_weight_check(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let patient_id = path.into_inner();

    if state.postgres.get_patient(patient_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Patient {} not found", patient_id)));
    }

    let history = state.postgres.weight_history(patient_id).await?;
    tracing::debug!("Checking patient {} against {} weights", patient_id, history.len());

    let current = history.current(patient_id).ok_or_else(|| {
        ApiError::Unprocessable(format!("Patient {} has no recorded weight", patient_id))
    })?;

    let result = state.checker.check(&current, &history);
    let summary = result.to_summary(chrono::Utc::now());

    state.postgres.upsert_weight_check(&summary).await?;

    if result.failures() > 0 {
        tracing::warn!(
            "Weight check for patient {} had {} failed intervals",
            patient_id,
            result.failures()
        );
    }
    tracing::info!("User {} ran weight check for patient {}", ctx.username, patient_id);

    Ok(HttpResponse::Ok().json(WeightCheckResponse {
        summary,
        reference_date: current.date,
        intervals: result.outcomes.iter().map(IntervalResult::from).collect(),
    }))
}

/// Stored weight check for a patient
///
/// GET /api/v1/patients/{id}/weight-check
async fn get_weight_check(
    state: web::Data<AppState>,
    _ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let patient_id = path.into_inner();

    let check = state
        .postgres
        .get_weight_check(patient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No weight check for patient {}", patient_id)))?;

    Ok(HttpResponse::Ok().json(check))
}
