//! Error types for icon-hunter
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error types (Job, Store)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::{JobId, JobStatus, Store};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for icon-hunter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for icon-hunter
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download.output_dir")
        key: Option<String>,
    },

    /// Request rejected before any network activity
    #[error("validation error: {0}")]
    Validation(String),

    /// Job lifecycle error
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// Upstream store responded unusably
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Transport-level failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive assembly failed
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Polling gave up after the caller-supplied deadline elapsed
    #[error("job {job_id} did not reach a terminal state within {waited:?}")]
    DeadlineExceeded {
        /// The job that was being polled
        job_id: JobId,
        /// How long the poller waited before giving up
        waited: Duration,
    },

    /// Operation cancelled via a caller-supplied cancellation token
    #[error("operation cancelled")]
    Cancelled,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Job lifecycle errors
#[derive(Debug, Error)]
pub enum JobError {
    /// No job with this id exists in the registry
    #[error("job {id} not found")]
    NotFound {
        /// The job id that was not found
        id: JobId,
    },

    /// Artifact requested before the job completed
    #[error("job {id} is {status}, archive not available yet")]
    NotReady {
        /// The job whose archive was requested
        id: JobId,
        /// The job's current (non-completed) status
        status: JobStatus,
    },

    /// A status update violated the pending→running→terminal state machine
    #[error("job {id}: illegal transition {from} -> {to}")]
    InvalidTransition {
        /// The job whose status update was rejected
        id: JobId,
        /// Status before the rejected update
        from: JobStatus,
        /// Status the update attempted to set
        to: JobStatus,
    },
}

/// Upstream store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Non-success HTTP status from a store endpoint
    #[error("{store} returned HTTP {status}")]
    BadStatus {
        /// Which store responded
        store: Store,
        /// The HTTP status code received
        status: u16,
    },

    /// Store response body could not be interpreted
    #[error("{store} response could not be parsed: {reason}")]
    MalformedResponse {
        /// Which store responded
        store: Store,
        /// What was wrong with the body
        reason: String,
    },

    /// An icon URL returned a non-success status
    #[error("icon fetch failed for {url}: HTTP {status}")]
    IconUnavailable {
        /// The icon URL that failed
        url: String,
        /// The HTTP status code received
        status: u16,
    },
}

/// API error response format
///
/// Returned by API endpoints when an error occurs: a machine-readable code,
/// a human-readable message, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "job_not_found",
///     "message": "job 3f2a... not found",
///     "details": {
///       "job_id": "3f2a..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "job_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,

            // Job lifecycle
            Error::Job(JobError::NotFound { .. }) => 404,
            Error::Job(JobError::NotReady { .. }) => 409,
            Error::Job(JobError::InvalidTransition { .. }) => 409,

            // 408 Request Timeout - client-side poll deadline
            Error::DeadlineExceeded { .. } => 408,

            // 409 Conflict - cooperative cancellation
            Error::Cancelled => 409,

            // 502 Bad Gateway - upstream problems
            Error::Store(_) => 502,
            Error::Network(_) => 502,

            // 500 Internal Server Error - server-side issues
            Error::Io(_) => 500,
            Error::Archive(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Job(e) => match e {
                JobError::NotFound { .. } => "job_not_found",
                JobError::NotReady { .. } => "job_not_ready",
                JobError::InvalidTransition { .. } => "invalid_transition",
            },
            Error::Store(e) => match e {
                StoreError::BadStatus { .. } => "store_bad_status",
                StoreError::MalformedResponse { .. } => "store_malformed_response",
                StoreError::IconUnavailable { .. } => "icon_unavailable",
            },
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Archive(_) => "archive_error",
            Error::Serialization(_) => "serialization_error",
            Error::DeadlineExceeded { .. } => "deadline_exceeded",
            Error::Cancelled => "cancelled",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Job(JobError::NotFound { id }) => Some(serde_json::json!({
                "job_id": id,
            })),
            Error::Job(JobError::NotReady { id, status }) => Some(serde_json::json!({
                "job_id": id,
                "status": status,
            })),
            Error::Job(JobError::InvalidTransition { id, from, to }) => {
                Some(serde_json::json!({
                    "job_id": id,
                    "from": from,
                    "to": to,
                }))
            }
            Error::Store(StoreError::BadStatus { store, status }) => Some(serde_json::json!({
                "store": store,
                "status": status,
            })),
            Error::Store(StoreError::IconUnavailable { url, status }) => {
                Some(serde_json::json!({
                    "url": url,
                    "status": status,
                }))
            }
            Error::DeadlineExceeded { job_id, waited } => Some(serde_json::json!({
                "job_id": job_id,
                "waited_ms": waited.as_millis() as u64,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
