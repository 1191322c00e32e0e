// Route exports
pub mod auth;
pub mod context;
pub mod error;
pub mod health;
pub mod patients;
pub mod tubefeed;
pub mod weights;

pub use context::RequestContext;
pub use error::ApiError;

use crate::core::WeightChecker;
use crate::models::TargetFactors;
use crate::services::{FormulaCache, PostgresClient, TokenService};
use actix_web::{http::header, middleware, web};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub formulas: Arc<FormulaCache>,
    pub tokens: TokenService,
    pub checker: WeightChecker,
    pub targets: TargetFactors,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(auth::configure)
            .configure(patients::configure)
            .configure(weights::configure)
            .configure(tubefeed::configure),
    );
}

/// Headers that stop clients and proxies from caching any response
pub fn no_cache_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add((header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .add((header::EXPIRES, "0"))
        .add((header::PRAGMA, "no-cache"))
}
