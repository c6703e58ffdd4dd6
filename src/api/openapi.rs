//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the icon-hunter REST API using
//! utoipa for compile-time spec generation. The spec is served at
//! `/openapi.json`, with interactive docs at `/swagger-ui` when enabled.

use utoipa::OpenApi;

/// OpenAPI documentation for the icon-hunter REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "icon-hunter REST API",
        version = "0.2.0",
        description = "Search apps on the App Store and Google Play and download their icons as ZIP archives via asynchronous jobs",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Search
        crate::api::routes::search_apps,

        // Jobs
        crate::api::routes::start_download,
        crate::api::routes::get_status,
        crate::api::routes::fetch_archive,
        crate::api::routes::cancel_job,
        crate::api::routes::list_jobs,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
        crate::api::routes::shutdown,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobId,
        crate::types::Store,
        crate::types::StoreFilter,
        crate::types::ArchiveFormat,
        crate::types::AppRecord,
        crate::types::DownloadRequest,
        crate::types::JobStatus,
        crate::types::FailedApp,
        crate::types::JobSnapshot,
        crate::types::Event,

        // API request/response types from routes
        crate::api::routes::SearchRequest,
        crate::api::routes::JobStartedResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "search", description = "App search across the App Store and Google Play"),
        (name = "jobs", description = "Icon download jobs - launch, poll, fetch archives, cancel"),
        (name = "system", description = "System endpoints - health checks, OpenAPI spec, events, shutdown"),
    )
)]
pub struct ApiDoc;
