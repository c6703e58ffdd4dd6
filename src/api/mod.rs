//! REST API server module
//!
//! Exposes the job lifecycle over HTTP: search, launch, poll, fetch. Plus
//! the system surface (health, OpenAPI, SSE events, graceful shutdown).

use crate::{Config, IconHunter, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Search
/// - `POST /search` - Search one or both stores for apps
///
/// ## Jobs
/// - `POST /download` - Launch an icon download job
/// - `GET /status/:id` - Get a job snapshot
/// - `GET /download/:id` - Fetch the archive of a completed job
/// - `DELETE /download/:id` - Cancel a running job
/// - `GET /jobs` - List all known jobs
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
/// - `GET /events` - Server-sent events stream
/// - `POST /shutdown` - Graceful shutdown
pub fn create_router(hunter: Arc<IconHunter>, config: Arc<Config>) -> Router {
    let state = AppState::new(hunter, config.clone());

    let router = Router::new()
        // Search
        .route("/search", post(routes::search_apps))
        // Jobs
        .route("/download", post(routes::start_download))
        .route("/status/:id", get(routes::get_status))
        .route("/download/:id", get(routes::fetch_archive))
        .route("/download/:id", delete(routes::cancel_job))
        .route("/jobs", get(routes::list_jobs))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream))
        .route("/shutdown", post(routes::shutdown));

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The UI gets its own spec URL; /openapi.json stays a plain route.
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    // Apply CORS middleware if enabled in config
    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins ("*" allows any origin)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on an already-bound listener until the server stops
///
/// Split out from [`start_api_server`] so tests can bind to port 0 and
/// discover the address themselves.
pub async fn serve(listener: TcpListener, hunter: Arc<IconHunter>, config: Arc<Config>) -> Result<()> {
    let app = create_router(hunter, config);

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Start the API server on the configured bind address
///
/// Binds a TCP listener and serves the router until shutdown.
///
/// # Example
///
/// ```no_run
/// use icon_hunter::{Config, IconHunter};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let hunter = Arc::new(IconHunter::new((*config).clone())?);
///
/// // Start API server (blocks until shutdown)
/// icon_hunter::api::start_api_server(hunter, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(hunter: Arc<IconHunter>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    serve(listener, hunter, config).await
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
