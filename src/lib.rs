//! # icon-hunter
//!
//! Backend library for searching apps on the Apple App Store and Google Play
//! and downloading their icons, packaged as ZIP archives, through
//! asynchronous jobs.
//!
//! ## Design Philosophy
//!
//! icon-hunter is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sensible defaults** - Works out of the box against the public stores
//! - **Event-driven** - Consumers subscribe to job events, no polling required
//! - **Bounded** - Client-side polling carries a deadline and cancellation
//!
//! ## Quick Start
//!
//! ```no_run
//! use icon_hunter::{Config, IconHunter, StoreFilter};
//! use icon_hunter::types::{ArchiveFormat, DownloadRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hunter = IconHunter::new(Config::default())?;
//!
//!     // Search both stores
//!     let apps = hunter.search("Signal", StoreFilter::Both, None, 3).await?;
//!
//!     // Launch a download job for the first hit
//!     let request = DownloadRequest {
//!         apps: apps.into_iter().take(1).collect(),
//!         sizes: vec![64, 128, 256],
//!         format: ArchiveFormat::Zip,
//!     };
//!     let job_id = hunter.start_download(request).await?;
//!
//!     // Subscribe to events instead of polling
//!     let mut events = hunter.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!     # let _ = job_id;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// REST client for a running API server
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Core engine (job registry, worker, archive assembly)
pub mod hunter;
/// Retry logic with exponential backoff
pub mod retry;
/// Upstream store search clients
pub mod stores;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use client::HunterClient;
pub use config::{ApiConfig, Config, DownloadConfig, PollConfig, RetryConfig};
pub use error::{ApiError, Error, ErrorDetail, JobError, Result, StoreError, ToHttpStatus};
pub use hunter::{IconHunter, JobRegistry};
pub use stores::{AppStoreClient, GooglePlayClient, SearchQuery, StoreClient};
pub use types::{
    AppRecord, ArchiveFormat, DownloadRequest, Event, FailedApp, JobId, JobSnapshot, JobStatus,
    Store, StoreFilter,
};

/// Helper function to run the engine with graceful signal handling.
///
/// Waits for a termination signal and then calls the engine's `shutdown()`
/// method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use icon_hunter::{Config, IconHunter, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let hunter = IconHunter::new(Config::default())?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(hunter).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(hunter: IconHunter) -> Result<()> {
    wait_for_signal().await;
    hunter.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
