use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use nutri_track::config::{LoggingSettings, Settings};
use nutri_track::core::WeightChecker;
use nutri_track::models::TargetFactors;
use nutri_track::routes::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use nutri_track::routes::{self, AppState};
use nutri_track::services::{seed_reference_data, FormulaCache, PostgresClient, ReferenceData, TokenService};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize logging; `LOG_LEVEL` and `LOG_FORMAT` override the config file
fn init_tracing(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::other(format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    info!("Starting nutri-track service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;
    settings
        .validate()
        .map_err(|e| startup_error("Invalid configuration", e))?;

    info!("Configuration loaded successfully");

    // Initialize PostgreSQL client
    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL client initialized");

    // Populate empty reference tables
    if settings.reference_data.seed_on_startup {
        let data = ReferenceData::load(&settings.reference_data.path)
            .await
            .map_err(|e| startup_error("Failed to load reference data", e))?;

        match data {
            Some(data) => {
                seed_reference_data(&postgres, &data)
                    .await
                    .map_err(|e| startup_error("Failed to seed reference data", e))?;
            }
            None => warn!("Formula reference tables were not seeded"),
        }
    }

    let formulas = Arc::new(FormulaCache::new(
        settings.cache.formula_cache_size,
        settings.cache.formula_ttl_secs,
    ));

    info!(
        "Formula cache initialized ({} entries, TTL: {}s)",
        settings.cache.formula_cache_size, settings.cache.formula_ttl_secs
    );

    let checker = WeightChecker::new(settings.clinical.intervals.clone());
    let targets = TargetFactors::from(&settings.clinical.targets);

    info!("Weight checker intervals: {:?} months", checker.intervals());

    // Build application state
    let app_state = AppState {
        postgres,
        formulas,
        tokens: TokenService::new(&settings.auth.jwt_secret, settings.auth.token_ttl_secs),
        checker,
        targets,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(routes::no_cache_headers())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
