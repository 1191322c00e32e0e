use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::calculate_delivery;
use crate::models::{FormulaListResponse, TubeFeedRequest};
use crate::routes::{ApiError, AppState, RequestContext};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/formulas", web::get().to(list_formulas))
        .route("/formulas/{id}", web::get().to(formula_profile))
        .route("/tubefeed", web::post().to(tube_feed));
}

async fn list_formulas(
    state: web::Data<AppState>,
    _ctx: RequestContext,
) -> Result<HttpResponse, ApiError> {
    let formulas = state.postgres.list_formulas().await?;

    Ok(HttpResponse::Ok().json(FormulaListResponse {
        count: formulas.len(),
        formulas,
    }))
}

async fn formula_profile(
    state: web::Data<AppState>,
    _ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let formula_id = path.into_inner();

    let profile = state
        .formulas
        .get_or_load(formula_id, &state.postgres)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Formula {} not found", formula_id)))?;

    Ok(HttpResponse::Ok().json(profile.as_ref()))
}

/// Nutrition delivered by a tube feed regimen
///
/// POST /api/v1/tubefeed
///
/// Request body:
/// ```json
/// {
///   "formulaId": 1,
///   "rateMlPerHour": 60.0,
///   "hours": 20
/// }
/// ```
async fn tube_feed(
    state: web::Data<AppState>,
    ctx: RequestContext,
    req: web::Json<TubeFeedRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let profile = state
        .formulas
        .get_or_load(req.formula_id, &state.postgres)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Formula {} not found", req.formula_id)))?;

    let delivery = calculate_delivery(&profile, req.rate_ml_per_hour, req.hours)?;

    tracing::debug!(
        "User {} calculated {} at {} mL/hr for {} h",
        ctx.user_id,
        delivery.formula_name,
        req.rate_ml_per_hour,
        req.hours
    );

    Ok(HttpResponse::Ok().json(delivery))
}
