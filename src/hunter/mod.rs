//! Core engine: search dispatch, job launch, registry access, shutdown
//!
//! The `IconHunter` struct and its collaborators are organized by concern:
//! - [`registry`] - explicit in-memory job registry
//! - [`worker`] - per-job execution task
//! - [`archive`] - ZIP assembly

pub mod archive;
pub mod registry;
mod worker;

pub use registry::JobRegistry;

use crate::config::Config;
use crate::error::{Error, JobError, Result};
use crate::stores::{AppStoreClient, GooglePlayClient, SearchQuery, StoreClient};
use crate::types::{
    AppRecord, DownloadRequest, Event, JobId, JobSnapshot, JobStatus, StoreFilter,
};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

/// Largest icon size a job may request; store CDNs do not serve beyond this
const MAX_ICON_SIZE: u32 = 1024;

/// Capacity of the lifecycle event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Main engine instance (cloneable - all fields are Arc-wrapped or cheap)
#[derive(Clone)]
pub struct IconHunter {
    /// Shared HTTP client for store searches and icon fetches
    http: reqwest::Client,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Job registry, owned here and handed to workers and API handlers
    registry: Arc<JobRegistry>,
    /// App Store search client
    appstore: AppStoreClient,
    /// Google Play search client
    googleplay: GooglePlayClient,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
    /// Cancellation tokens of jobs that have not reached a terminal state
    active_jobs: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
    /// Cleared during shutdown; no new jobs are accepted once false
    accepting_new: Arc<AtomicBool>,
}

impl IconHunter {
    /// Create a new engine from the given configuration
    ///
    /// Validates the configuration, creates the output directory, and builds
    /// the shared HTTP client. No network activity happens here.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        std::fs::create_dir_all(&config.download.output_dir)?;

        let http = reqwest::Client::builder()
            .timeout(config.download.request_timeout)
            .user_agent(concat!("icon-hunter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let appstore = AppStoreClient::new(http.clone(), config.stores.appstore.clone());
        let googleplay = GooglePlayClient::new(http.clone(), config.stores.googleplay.clone());

        Ok(Self {
            http,
            config: Arc::new(config),
            registry: Arc::new(JobRegistry::new()),
            appstore,
            googleplay,
            event_tx,
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// The engine's configuration
    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Subscribe to job lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Search one or both stores for apps matching `term`
    ///
    /// Results are most-relevant-first per upstream ordering; with
    /// [`StoreFilter::Both`] the App Store results come first. Each store is
    /// queried with `limit`, so the combined list holds at most `limit`
    /// records per store. Zero matches is an empty vec, not an error.
    pub async fn search(
        &self,
        term: &str,
        filter: StoreFilter,
        country: Option<String>,
        limit: u32,
    ) -> Result<Vec<AppRecord>> {
        if term.trim().is_empty() {
            return Err(Error::Validation("search term must not be empty".into()));
        }
        if limit == 0 {
            return Err(Error::Validation("limit must be at least 1".into()));
        }

        let query = SearchQuery {
            term: term.to_string(),
            country,
            limit,
        };

        match filter {
            StoreFilter::Appstore => self.appstore.search(&query).await,
            StoreFilter::Googleplay => self.googleplay.search(&query).await,
            StoreFilter::Both => {
                let (mut appstore, googleplay) = tokio::try_join!(
                    self.appstore.search(&query),
                    self.googleplay.search(&query)
                )?;
                appstore.extend(googleplay);
                Ok(appstore)
            }
        }
    }

    /// Launch a download job for the given request
    ///
    /// Validation failures never touch the network. Every submission creates
    /// a new job; identical requests are not deduplicated. An empty `sizes`
    /// list falls back to the configured default sizes.
    pub async fn start_download(&self, request: DownloadRequest) -> Result<JobId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        if request.apps.is_empty() {
            return Err(Error::Validation("apps must not be empty".into()));
        }

        let sizes = if request.sizes.is_empty() {
            self.config.download.default_sizes.clone()
        } else {
            request.sizes
        };
        if let Some(&bad) = sizes.iter().find(|&&s| s == 0 || s > MAX_ICON_SIZE) {
            return Err(Error::Validation(format!(
                "icon size {bad} out of range (1..={MAX_ICON_SIZE})"
            )));
        }

        // Dedupe and order-normalize the requested sizes
        let sizes: Vec<u32> = sizes.into_iter().collect::<BTreeSet<_>>().into_iter().collect();

        let id = JobId::generate();
        let total = request.apps.len() as u32;
        self.registry
            .insert(JobSnapshot::new(id.clone(), total))
            .await;

        tracing::info!(job = %id, apps = total, sizes = ?sizes, "Job queued");
        let _ = self.event_tx.send(Event::JobQueued {
            id: id.clone(),
            apps: total,
        });

        let cancel = CancellationToken::new();
        self.active_jobs
            .lock()
            .await
            .insert(id.clone(), cancel.clone());

        let ctx = worker::JobContext {
            id: id.clone(),
            apps: request.apps,
            sizes,
            http: self.http.clone(),
            config: self.config.clone(),
            registry: self.registry.clone(),
            event_tx: self.event_tx.clone(),
            cancel,
        };
        let active_jobs = self.active_jobs.clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            worker::run_job(ctx).await;
            active_jobs.lock().await.remove(&job_id);
        });

        Ok(id)
    }

    /// Get a point-in-time snapshot of one job
    pub async fn job(&self, id: &JobId) -> Result<JobSnapshot> {
        self.registry.get(id).await
    }

    /// Snapshots of every known job, oldest first
    pub async fn jobs(&self) -> Vec<JobSnapshot> {
        self.registry.list().await
    }

    /// Path of a completed job's archive
    ///
    /// Fails with [`JobError::NotReady`] for jobs that have not completed
    /// (including failed ones) and [`JobError::NotFound`] for unknown ids.
    pub async fn archive_path(&self, id: &JobId) -> Result<PathBuf> {
        let snapshot = self.registry.get(id).await?;
        match snapshot.status {
            JobStatus::Completed => snapshot.zip_path.ok_or_else(|| {
                Error::Other(format!("job {id} completed without an archive path"))
            }),
            status => Err(JobError::NotReady {
                id: id.clone(),
                status,
            }
            .into()),
        }
    }

    /// Cancel a job that has not reached a terminal state
    ///
    /// The job settles as failed with a cancellation message. Cancelling a
    /// terminal job is an error; cancelling an unknown id is NotFound.
    pub async fn cancel(&self, id: &JobId) -> Result<()> {
        let snapshot = self.registry.get(id).await?;
        if snapshot.status.is_terminal() {
            return Err(JobError::InvalidTransition {
                id: id.clone(),
                from: snapshot.status,
                to: JobStatus::Failed,
            }
            .into());
        }

        if let Some(token) = self.active_jobs.lock().await.get(id) {
            token.cancel();
        }
        Ok(())
    }

    /// Stop accepting jobs, cancel active ones, and wait for them to settle
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down");
        self.accepting_new.store(false, Ordering::SeqCst);
        let _ = self.event_tx.send(Event::Shutdown);

        for token in self.active_jobs.lock().await.values() {
            token.cancel();
        }

        // Workers remove themselves from active_jobs as they settle
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if self.active_jobs.lock().await.is_empty() {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!("Shutdown timed out waiting for active jobs");
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
