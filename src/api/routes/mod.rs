//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`search`] — App search
//! - [`jobs`] — Download job lifecycle
//! - [`system`] — Health, events, OpenAPI, shutdown

mod jobs;
mod search;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use jobs::*;
pub use search::*;
pub use system::*;

use crate::types::{JobId, StoreFilter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /search`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Search term
    pub term: String,

    /// Store selector (defaults to both)
    #[serde(default)]
    pub store: StoreFilter,

    /// Two-letter country code; omitted means the configured default
    #[serde(default)]
    pub country: Option<String>,

    /// Maximum number of results per store (default: 10)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}

/// Response body for a successfully launched job
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobStartedResponse {
    /// Identifier of the freshly created job
    pub job_id: JobId,
}
