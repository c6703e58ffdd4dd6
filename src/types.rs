//! Core types for icon-hunter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Unique identifier for a download job
///
/// Opaque to callers; internally a UUID v4 rendered as a string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a fresh random job id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// App store an [`AppRecord`] originates from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    /// Apple App Store
    Appstore,
    /// Google Play
    Googleplay,
}

impl std::fmt::Display for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Store::Appstore => write!(f, "appstore"),
            Store::Googleplay => write!(f, "googleplay"),
        }
    }
}

/// Store selector for search requests
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreFilter {
    /// App Store only
    Appstore,
    /// Google Play only
    Googleplay,
    /// Both stores (App Store results first)
    #[default]
    Both,
}

/// Output archive format for a download job
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// ZIP archive (only supported format)
    #[default]
    Zip,
}

/// A single search result describing one app's metadata and icon location
///
/// Records are immutable once returned from search; the engine never mutates
/// them, only reads `name` and `icon_url` when executing a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppRecord {
    /// Display name of the app
    pub name: String,

    /// Store the record came from
    pub store: Store,

    /// Human-readable price ("Free", "$1.99", ...)
    pub price: String,

    /// Average user rating on the store's scale, when the store reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,

    /// URL of the app icon as published by the store CDN
    pub icon_url: String,

    /// Developer / seller name, when the store reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,

    /// Store-specific identifier (bundle id / package name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

/// A request to download icons for a batch of apps
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// Apps to fetch icons for (order preserved in the resulting archive)
    pub apps: Vec<AppRecord>,

    /// Requested icon sizes in pixels (square)
    pub sizes: Vec<u32>,

    /// Output format (defaults to zip)
    #[serde(default)]
    pub format: ArchiveFormat,
}

/// Job lifecycle status
///
/// Transitions only ever move forward: pending → running → completed|failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, worker not started yet
    Pending,
    /// Worker is fetching icons
    Running,
    /// Finished; archive is available
    Completed,
    /// Finished without a usable archive
    Failed,
}

impl JobStatus {
    /// Whether no further transition can occur from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// An app that could not be downloaded, with the reason
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FailedApp {
    /// App display name
    pub app: String,
    /// Human-readable failure reason
    pub error: String,
}

/// Point-in-time view of a job
///
/// Snapshots are produced by the job registry; `progress` counts fully
/// processed apps and never decreases across successive snapshots of the
/// same job.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobSnapshot {
    /// Job identifier
    pub id: JobId,

    /// Current lifecycle status
    pub status: JobStatus,

    /// Number of apps processed so far (completed or failed)
    pub progress: u32,

    /// Total number of apps in the job
    pub total: u32,

    /// Names of apps whose icons were fetched, in submission order
    pub completed_apps: Vec<String>,

    /// Apps that failed, with reasons, in submission order
    pub failed_apps: Vec<FailedApp>,

    /// Path of the finished archive (set when status is completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_path: Option<PathBuf>,

    /// Why the job failed (set when status is failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the job was accepted
    pub created_at: DateTime<Utc>,

    /// When the job reached a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    /// Create a fresh pending snapshot for a job covering `total` apps
    pub fn new(id: JobId, total: u32) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            total,
            completed_apps: Vec::new(),
            failed_apps: Vec::new(),
            zip_path: None,
            error_message: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Event emitted during the job lifecycle
///
/// Consumers subscribe via [`crate::IconHunter::subscribe`]; the REST API
/// forwards these over the `/events` SSE stream.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted into the registry
    JobQueued {
        /// Job ID
        id: JobId,
        /// Number of apps in the job
        apps: u32,
    },

    /// Worker started executing the job
    JobStarted {
        /// Job ID
        id: JobId,
    },

    /// One icon was fetched successfully
    IconFetched {
        /// Job ID
        id: JobId,
        /// App the icon belongs to
        app: String,
        /// Icon size in pixels
        size: u32,
    },

    /// An app's icons could not be fetched
    IconFailed {
        /// Job ID
        id: JobId,
        /// App the failure belongs to
        app: String,
        /// Failure reason
        error: String,
    },

    /// Job finished with a usable archive
    JobCompleted {
        /// Job ID
        id: JobId,
        /// Path of the finished archive
        zip_path: PathBuf,
    },

    /// Job finished without a usable archive
    JobFailed {
        /// Job ID
        id: JobId,
        /// Failure reason
        error: String,
    },

    /// Engine is shutting down
    Shutdown,
}
