//! REST client for a running icon-hunter API server
//!
//! Wraps the four lifecycle operations: search, launch, poll, fetch. The
//! poll loop is bounded: [`HunterClient::wait_for_completion`] takes a
//! [`PollConfig`] with a finite default deadline and a cancellation token,
//! so callers cannot end up in an unbounded sleep-and-retry loop by
//! accident. No operation retries on its own; errors surface to the caller.

use crate::config::PollConfig;
use crate::error::{ApiError, Error, JobError, Result};
use crate::types::{
    AppRecord, ArchiveFormat, DownloadRequest, JobId, JobSnapshot, JobStatus, StoreFilter,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Client for the icon-hunter REST API
#[derive(Clone)]
pub struct HunterClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct JobStartedResponse {
    job_id: JobId,
}

impl HunterClient {
    /// Create a client for the API server at `base_url` (e.g. "http://127.0.0.1:8000")
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_http_client(base_url, http))
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    /// Search for apps
    pub async fn search(
        &self,
        term: &str,
        store: StoreFilter,
        country: &str,
        limit: u32,
    ) -> Result<Vec<AppRecord>> {
        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .json(&serde_json::json!({
                "term": term,
                "store": store,
                "country": country,
                "limit": limit,
            }))
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Launch a download job for the given apps and sizes, returning its id
    pub async fn start_download(&self, apps: &[AppRecord], sizes: &[u32]) -> Result<JobId> {
        let request = DownloadRequest {
            apps: apps.to_vec(),
            sizes: sizes.to_vec(),
            format: ArchiveFormat::Zip,
        };

        let response = self
            .http
            .post(format!("{}/download", self.base_url))
            .json(&request)
            .send()
            .await?;

        let started: JobStartedResponse = Self::decode(response).await?;
        Ok(started.job_id)
    }

    /// Fetch the current snapshot of a job
    pub async fn status(&self, id: &JobId) -> Result<JobSnapshot> {
        let response = self
            .http
            .get(format!("{}/status/{}", self.base_url, id))
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Fetch the archive bytes of a completed job
    pub async fn fetch_archive(&self, id: &JobId) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/download/{}", self.base_url, id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch a completed job's archive and persist it at `path`
    ///
    /// Parent directories are created as needed.
    pub async fn save_archive(&self, id: &JobId, path: &Path) -> Result<()> {
        let bytes = self.fetch_archive(id).await?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Poll a job until it reaches a terminal state
    ///
    /// Sleeps `poll.interval` between status fetches. Fails with
    /// [`Error::DeadlineExceeded`] once `poll.deadline` has elapsed and with
    /// [`Error::Cancelled`] when `cancel` fires. The job itself keeps
    /// running server-side in both cases; this only stops the polling.
    pub async fn wait_for_completion(
        &self,
        id: &JobId,
        poll: &PollConfig,
        cancel: &CancellationToken,
    ) -> Result<JobSnapshot> {
        let started = Instant::now();

        loop {
            let snapshot = self.status(id).await?;
            if snapshot.status.is_terminal() {
                return Ok(snapshot);
            }

            let sleep = match poll.deadline {
                Some(deadline) => {
                    let elapsed = started.elapsed();
                    if elapsed >= deadline {
                        return Err(Error::DeadlineExceeded {
                            job_id: id.clone(),
                            waited: elapsed,
                        });
                    }
                    poll.interval.min(deadline - elapsed)
                }
                None => poll.interval,
            };

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(sleep) => {}
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(response.json().await?)
    }

    /// Map an error response back onto the domain taxonomy
    ///
    /// The server answers errors with the structured `{"error": {...}}`
    /// envelope; unparseable bodies degrade to a generic error carrying the
    /// HTTP status.
    async fn error_from_response(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        match response.json::<ApiError>().await {
            Ok(api) => Self::domain_error(api),
            Err(_) => Error::Other(format!("server returned HTTP {status}")),
        }
    }

    fn domain_error(api: ApiError) -> Error {
        let detail_job_id = || -> JobId {
            api.error
                .details
                .as_ref()
                .and_then(|d| d.get("job_id"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .into()
        };

        match api.error.code.as_str() {
            "job_not_found" => Error::Job(JobError::NotFound {
                id: detail_job_id(),
            }),
            "job_not_ready" => {
                let status = api
                    .error
                    .details
                    .as_ref()
                    .and_then(|d| d.get("status"))
                    .and_then(|v| serde_json::from_value::<JobStatus>(v.clone()).ok())
                    .unwrap_or(JobStatus::Pending);
                Error::Job(JobError::NotReady {
                    id: detail_job_id(),
                    status,
                })
            }
            "validation_error" => Error::Validation(api.error.message),
            "config_error" => Error::Config {
                message: api.error.message,
                key: None,
            },
            "shutting_down" => Error::ShuttingDown,
            code => Error::Other(format!("{code}: {}", api.error.message)),
        }
    }
}
