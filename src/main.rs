mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use config::Settings;
use core::{NearbyLimits, NearbyLocator, RankedSearchEngine, RecommendationEngine, RecommendationLimits};
use routes::discovery::AppState;
use services::{CandidateRepository, IpGeoClient, ListingStoreClient, ResultCache, TokenVerifier};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// JSON error response for payload errors
#[derive(Debug, serde::Serialize)]
pub struct PayloadError {
    pub success: bool,
    pub message: String,
    #[serde(skip)]
    pub status_code: u16,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PayloadError {}

impl error::ResponseError for PayloadError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError {
        success: false,
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    PayloadError {
        success: false,
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting NestDrive discovery service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize listing store client
    let store_timeout = settings.store.timeout_secs.unwrap_or(30);
    let repo: Arc<dyn CandidateRepository> = Arc::new(ListingStoreClient::new(
        settings.store.endpoint,
        settings.store.api_key,
        store_timeout,
    ));

    info!("Listing store client initialized (timeout: {}s)", store_timeout);

    // Initialize geolocation client
    let geoip = Arc::new(IpGeoClient::new(
        settings.geoip.endpoint,
        settings.geoip.timeout_secs,
    ));

    // Initialize recommendation cache
    let cache = Arc::new(ResultCache::new(
        settings.cache.max_entries,
        Duration::from_secs(settings.cache.ttl_secs),
    ));

    info!(
        "Result cache initialized ({} entries, TTL: {}s)",
        settings.cache.max_entries, settings.cache.ttl_secs
    );

    // Initialize discovery engines with configured limits
    let recommendation_limits = RecommendationLimits {
        quota: settings.discovery.recommendation_quota,
        category_cap: settings.discovery.recommendation_category_cap,
        visited_capacity: settings.discovery.visited_capacity,
    };
    let nearby_limits = NearbyLimits {
        property_limit: settings.discovery.nearby_property_limit,
        vehicle_limit: settings.discovery.nearby_vehicle_limit,
    };

    let recommender = Arc::new(RecommendationEngine::new(
        Arc::clone(&repo),
        Arc::clone(&cache),
        recommendation_limits,
    ));
    let searcher = Arc::new(RankedSearchEngine::new(
        Arc::clone(&repo),
        settings.discovery.max_search_candidates,
    ));
    let locator = Arc::new(NearbyLocator::new(
        Arc::clone(&repo),
        geoip,
        nearby_limits,
    ));
    let verifier = Arc::new(TokenVerifier::new(&settings.auth.jwt_secret));

    info!(
        "Discovery engines initialized (quota: {}, search bound: {})",
        recommendation_limits.quota, settings.discovery.max_search_candidates
    );

    // Build application state
    let app_state = AppState {
        recommender,
        searcher,
        locator,
        verifier,
        repo,
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
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
