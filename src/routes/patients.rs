use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::nutrition_targets;
use crate::models::{CreatePatientRequest, PatientInfoResponse, RosterResponse};
use crate::routes::{ApiError, AppState, RequestContext};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/patients", web::get().to(roster))
        .route("/patients", web::post().to(create_patient))
        .route("/patients/{id}", web::get().to(patient_info));
}

/// Patients on the caller's roster
///
/// GET /api/v1/patients
async fn roster(
    state: web::Data<AppState>,
    ctx: RequestContext,
) -> Result<HttpResponse, ApiError> {
    let patients = state.postgres.list_patients(ctx.user_id).await?;

    tracing::debug!("Roster for user {} has {} patients", ctx.user_id, patients.len());

    Ok(HttpResponse::Ok().json(RosterResponse {
        count: patients.len(),
        patients,
    }))
}

/// Add a patient with the caller as provider
///
/// POST /api/v1/patients
///
/// Request body:
/// ```json
/// {
///   "nameLast": "string",
///   "nameFirst": "string",
///   "age": 67,
///   "bed": "4B"
/// }
/// ```
async fn create_patient(
    state: web::Data<AppState>,
    ctx: RequestContext,
    req: web::Json<CreatePatientRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let patient = state.postgres.insert_patient(ctx.user_id, &req).await?;

    tracing::info!("User {} added patient {} ({})", ctx.username, patient.display_name(), patient.id);

    Ok(HttpResponse::Created().json(patient))
}

/// Patient page: weights, stored weight check and nutrition targets
///
/// GET /api/v1/patients/{id}
async fn patient_info(
    state: web::Data<AppState>,
    _ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let patient_id = path.into_inner();

    let patient = state
        .postgres
        .get_patient(patient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Patient {} not found", patient_id)))?;

    let history = state.postgres.weight_history(patient_id).await?;
    let weight_check = state.postgres.get_weight_check(patient_id).await?;

    let current_weight_lb = history.current(patient_id).map(|r| r.weight_lb);
    let targets = current_weight_lb.map(|lb| nutrition_targets(lb, &state.targets));

    Ok(HttpResponse::Ok().json(PatientInfoResponse {
        patient,
        weights: history.descending(patient_id),
        weight_check,
        current_weight_lb,
        targets,
    }))
}
