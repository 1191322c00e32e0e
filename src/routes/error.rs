use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::{TubeFeedError, WeightChangeError};
use crate::models::ErrorResponse;
use crate::services::{AuthError, PostgresError};

/// Errors returned from request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_failed",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unprocessable(_) => "unprocessable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: self.status_code().as_u16(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_response_body())
    }
}

impl From<PostgresError> for ApiError {
    fn from(e: PostgresError) -> Self {
        match e {
            PostgresError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            PostgresError::Conflict(message) => ApiError::Conflict(message),
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::HashError(_) => {
                tracing::error!("{}", e);
                ApiError::Internal("Could not process credentials".to_string())
            }
            AuthError::InvalidToken(ref inner) => {
                tracing::debug!("Rejected token: {}", inner);
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<TubeFeedError> for ApiError {
    fn from(e: TubeFeedError) -> Self {
        match e {
            TubeFeedError::InvalidRate(_) | TubeFeedError::InvalidHours(_) => {
                ApiError::Validation(e.to_string())
            }
            other => ApiError::Unprocessable(other.to_string()),
        }
    }
}

impl From<WeightChangeError> for ApiError {
    fn from(e: WeightChangeError) -> Self {
        ApiError::Unprocessable(e.to_string())
    }
}

/// Render malformed JSON bodies with the shared error shape
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::Validation(format!("Invalid JSON: {}", err)).into()
}

/// Render malformed query strings with the shared error shape
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    ApiError::Validation(format!("Invalid query: {}", err)).into()
}

/// Render malformed path segments with the shared error shape
pub fn handle_path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Path error on {}: {}", req.path(), err);
    ApiError::NotFound(format!("Invalid path: {}", err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_errors_map_to_status() {
        let not_found = ApiError::from(PostgresError::NotFound("Patient 7".to_string()));
        let conflict = ApiError::from(PostgresError::Conflict("Patient already exists".to_string()));

        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Patient 7 not found");
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_tube_feed_errors_map_to_status() {
        let bad_rate = ApiError::from(TubeFeedError::InvalidRate(-1.0));
        let missing = ApiError::from(TubeFeedError::MissingFluids("Nepro".to_string()));

        assert_eq!(bad_rate.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::HashError("boom".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_body_shape() {
        let body = ApiError::Conflict("Username nurse01 already taken".to_string()).to_response_body();

        assert_eq!(body.error, "conflict");
        assert_eq!(body.message, "Username nurse01 already taken");
        assert_eq!(body.status_code, 409);
    }
}
