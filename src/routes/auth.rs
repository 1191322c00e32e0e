use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{LoginRequest, RegisterRequest, TokenResponse, User, DEFAULT_ROLE};
use crate::routes::{ApiError, AppState};
use crate::services::{hash_password, reject_unknown_user, verify_password, AuthError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/register", web::post().to(register))
        .route("/auth/login", web::post().to(login));
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let access_token = state.tokens.issue(&user)?;

    Ok(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl_secs(),
        user_id: user.id,
        username: user.username,
        roles: user.roles,
    })
}

/// Register a user and log them in
///
/// POST /api/v1/auth/register
///
/// Request body:
/// ```json
/// {
///   "username": "string",
///   "password": "string",
///   "confirmation": "string"
/// }
/// ```
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    // Hashing is CPU bound, run it on the blocking pool
    let password = req.password.clone();
    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let user = state
        .postgres
        .register_user(&req.username, &password_hash, DEFAULT_ROLE)
        .await?;

    let body = token_response(&state, user)?;
    Ok(HttpResponse::Created().json(body))
}

/// Exchange credentials for a bearer token
///
/// POST /api/v1/auth/login
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let Some((user, stored_hash)) = state.postgres.find_credentials(&req.username).await? else {
        let password = req.password.clone();
        web::block(move || reject_unknown_user(&password))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        tracing::info!("Login failed for unknown user {}", req.username);
        return Err(AuthError::InvalidCredentials.into());
    };

    let password = req.password.clone();
    let verified = web::block(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if !verified {
        tracing::info!("Login failed for user {}", req.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    tracing::info!("User {} logged in", user.username);

    let body = token_response(&state, user)?;
    Ok(HttpResponse::Ok().json(body))
}
