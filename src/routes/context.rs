use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::routes::error::ApiError;
use crate::routes::AppState;
use crate::services::{AuthError, Claims};

/// The authenticated caller of a request
///
/// Extracted from the `Authorization: Bearer <token>` header; handlers that
/// take a `RequestContext` reject unauthenticated requests with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

impl TryFrom<Claims> for RequestContext {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

        Ok(Self {
            user_id,
            username: claims.username,
            roles: claims.roles,
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<RequestContext, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("Application state not configured".to_string()))?;

    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
    let claims = state.tokens.verify(token)?;

    RequestContext::try_from(claims)
}

impl FromRequest for RequestContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authenticate(req);
        if let Err(e) = &result {
            tracing::debug!("Unauthenticated request to {}: {}", req.path(), e);
        }
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));

        let basic = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(bearer_token(&basic), None);

        let empty = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .to_http_request();
        assert_eq!(bearer_token(&empty), None);
    }

    #[test]
    fn test_context_from_claims() {
        let claims = Claims {
            sub: "12".to_string(),
            username: "dietitian".to_string(),
            roles: vec!["user".to_string()],
            iat: 0,
            exp: 0,
            jti: "x".to_string(),
        };

        let context = RequestContext::try_from(claims).unwrap();

        assert_eq!(context.user_id, 12);
        assert_eq!(context.roles, vec!["user"]);
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            username: "dietitian".to_string(),
            roles: vec![],
            iat: 0,
            exp: 0,
            jti: "x".to_string(),
        };

        assert!(matches!(RequestContext::try_from(claims), Err(ApiError::Unauthorized(_))));
    }
}
