//! # stagegate HTTP API Module
//!
//! HTTP REST API over the stage-progression engine, using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /check-requirements` - Stateless evaluation of content against requirements
//! - `POST /advance` - Advance decision for a stage given an evaluation
//! - `GET /stages/{mode}` - Stage registry of a writing mode
//! - `POST /projects`, `GET /projects` - Create and list projects
//! - `GET /projects/{id}` - Project with all stages
//! - `PUT /projects/{id}/stages/{stage_id}` - Write stage content
//! - `POST /projects/{id}/stages/{stage_id}/evaluate` - Evaluate and progress
//! - `POST /projects/{id}/archive` - Archive a project
//!
//! ## Transport Configuration (Environment Variables)
//!
//! - `STAGEGATE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `STAGEGATE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)

pub mod handlers;
pub mod middleware;
pub mod types;

pub use middleware::{create_rate_limiter, get_rate_limit_from_env};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use stagegate_core::{Session, StageGateError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB).
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];

/// Build the CORS layer from a `STAGEGATE_CORS_ORIGINS`-style value.
///
/// - `"*"`: any origin
/// - absent, or no valid entries: localhost only
/// - otherwise: the listed origins
pub fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: allowing ALL origins (STAGEGATE_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: allowing origin {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: no valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(ALLOWED_METHODS)
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware, reading transport
/// settings from the environment.
pub fn create_router(state: AppState) -> Router {
    let origins = std::env::var("STAGEGATE_CORS_ORIGINS").ok();
    create_router_with(state, origins.as_deref(), get_rate_limit_from_env())
}

/// Create the router with explicit transport settings.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, rate limit.
pub fn create_router_with(state: AppState, cors_origins: Option<&str>, rate_limit: u32) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/check-requirements", post(handlers::check_requirements_handler))
        .route("/advance", post(handlers::advance_handler))
        .route("/stages/{mode}", get(handlers::stages_handler))
        .route(
            "/projects",
            post(handlers::create_project_handler).get(handlers::list_projects_handler),
        )
        .route("/projects/{id}", get(handlers::get_project_handler))
        .route(
            "/projects/{id}/stages/{stage_id}",
            put(handlers::write_content_handler),
        )
        .route(
            "/projects/{id}/stages/{stage_id}/evaluate",
            post(handlers::evaluate_handler),
        )
        .route("/projects/{id}/archive", post(handlers::archive_handler));

    if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, session: Session) -> Result<(), StageGateError> {
    let router = create_router(AppState::new(session));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StageGateError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("stagegate HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| StageGateError::IoError(format!("Server error: {}", e)))
}
