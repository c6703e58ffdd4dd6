//! Job execution
//!
//! One worker task per job. Apps are processed in submission order (progress
//! counts whole apps); within an app the requested sizes are fetched
//! concurrently, bounded by `max_concurrent_fetches`. Transient fetch
//! failures are retried with backoff; the job reacts to cancellation between
//! and during app fetches.

use super::archive::{self, ArchiveEntry};
use super::registry::JobRegistry;
use crate::config::Config;
use crate::error::{Error, Result, StoreError};
use crate::retry::fetch_with_retry;
use crate::stores::sized_icon_url;
use crate::types::{AppRecord, Event, JobId};
use crate::utils::{icon_extension, sanitize_file_name};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Everything a worker task needs to execute one job
pub(crate) struct JobContext {
    pub(crate) id: JobId,
    pub(crate) apps: Vec<AppRecord>,
    pub(crate) sizes: Vec<u32>,
    pub(crate) http: reqwest::Client,
    pub(crate) config: Arc<Config>,
    pub(crate) registry: Arc<JobRegistry>,
    pub(crate) event_tx: broadcast::Sender<Event>,
    pub(crate) cancel: CancellationToken,
}

/// Execute a job to its terminal state
pub(crate) async fn run_job(ctx: JobContext) {
    if let Err(e) = ctx.registry.mark_running(&ctx.id).await {
        tracing::error!(job = %ctx.id, error = %e, "Could not start job");
        return;
    }
    let _ = ctx.event_tx.send(Event::JobStarted { id: ctx.id.clone() });

    let mut entries: Vec<ArchiveEntry> = Vec::new();
    let mut completed = 0usize;
    let mut first_failure: Option<String> = None;

    for app in &ctx.apps {
        let fetched = tokio::select! {
            _ = ctx.cancel.cancelled() => None,
            result = fetch_app_icons(&ctx, app) => Some(result),
        };

        let Some(result) = fetched else {
            finish_cancelled(&ctx).await;
            return;
        };

        match result {
            Ok(app_entries) => {
                entries.extend(app_entries);
                completed += 1;
                if let Err(e) = ctx.registry.record_app_completed(&ctx.id, &app.name).await {
                    tracing::error!(job = %ctx.id, error = %e, "Could not record app completion");
                }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(job = %ctx.id, app = %app.name, error = %message, "App failed");
                if let Err(e) = ctx
                    .registry
                    .record_app_failed(&ctx.id, &app.name, &message)
                    .await
                {
                    tracing::error!(job = %ctx.id, error = %e, "Could not record app failure");
                }
                let _ = ctx.event_tx.send(Event::IconFailed {
                    id: ctx.id.clone(),
                    app: app.name.clone(),
                    error: message.clone(),
                });
                first_failure.get_or_insert(message);
            }
        }
    }

    if completed == 0 {
        let reason = first_failure.unwrap_or_else(|| "no apps in job".to_string());
        let message = format!(
            "all {} app(s) failed, no archive produced: {reason}",
            ctx.apps.len()
        );
        finish_failed(&ctx, message).await;
        return;
    }

    // Assemble the archive on a blocking thread; the zip crate is synchronous
    let zip_path = ctx
        .config
        .download
        .output_dir
        .join(format!("icons_{}.zip", ctx.id));
    let write_path = zip_path.clone();
    let write_result =
        tokio::task::spawn_blocking(move || archive::write_archive(&write_path, &entries)).await;

    match write_result {
        Ok(Ok(())) => {
            if let Err(e) = ctx.registry.complete(&ctx.id, zip_path.clone()).await {
                tracing::error!(job = %ctx.id, error = %e, "Could not mark job completed");
                return;
            }
            tracing::info!(job = %ctx.id, path = %zip_path.display(), completed, "Job completed");
            let _ = ctx.event_tx.send(Event::JobCompleted {
                id: ctx.id.clone(),
                zip_path,
            });
        }
        Ok(Err(e)) => {
            finish_failed(&ctx, format!("archive assembly failed: {e}")).await;
        }
        Err(e) => {
            finish_failed(&ctx, format!("archive task panicked: {e}")).await;
        }
    }
}

/// Fetch every requested size of one app's icon
///
/// Succeeds if at least one size could be fetched; sizes that fail are
/// logged and skipped. Fails with the first fetch error when no size
/// succeeded.
async fn fetch_app_icons(ctx: &JobContext, app: &AppRecord) -> Result<Vec<ArchiveEntry>> {
    let stem = sanitize_file_name(&app.name);
    let ext = icon_extension(&app.icon_url);

    let mut results: Vec<(u32, Result<Vec<u8>>)> =
        futures::stream::iter(ctx.sizes.iter().copied())
            .map(|size| {
                let url = sized_icon_url(app.store, &app.icon_url, size);
                async move { (size, fetch_icon_bytes(ctx, &url).await) }
            })
            .buffer_unordered(ctx.config.download.max_concurrent_fetches)
            .collect()
            .await;

    // buffer_unordered scrambles completion order; keep archive entries
    // sorted by size
    results.sort_by_key(|(size, _)| *size);

    let mut entries = Vec::new();
    let mut first_error: Option<Error> = None;

    for (size, result) in results {
        match result {
            Ok(bytes) => {
                let _ = ctx.event_tx.send(Event::IconFetched {
                    id: ctx.id.clone(),
                    app: app.name.clone(),
                    size,
                });
                entries.push(ArchiveEntry {
                    name: format!("{stem}/{stem}_{size}x{size}.{ext}"),
                    bytes,
                });
            }
            Err(e) => {
                tracing::warn!(
                    job = %ctx.id,
                    app = %app.name,
                    size,
                    error = %e,
                    "Icon size unavailable"
                );
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if entries.is_empty() {
        Err(first_error.unwrap_or_else(|| Error::Other("no sizes requested".to_string())))
    } else {
        Ok(entries)
    }
}

/// Fetch one icon URL with retry on transient failures
async fn fetch_icon_bytes(ctx: &JobContext, url: &str) -> Result<Vec<u8>> {
    fetch_with_retry(&ctx.config.retry, || {
        let http = ctx.http.clone();
        let url = url.to_string();
        async move {
            let response = http.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(StoreError::IconUnavailable {
                    url: url.clone(),
                    status: status.as_u16(),
                }
                .into());
            }
            Ok(response.bytes().await?.to_vec())
        }
    })
    .await
}

async fn finish_cancelled(ctx: &JobContext) {
    tracing::info!(job = %ctx.id, "Job cancelled");
    finish_failed(ctx, "job cancelled before completion".to_string()).await;
}

async fn finish_failed(ctx: &JobContext, message: String) {
    if let Err(e) = ctx.registry.fail(&ctx.id, message.clone()).await {
        tracing::debug!(job = %ctx.id, error = %e, "Job already settled");
        return;
    }
    let _ = ctx.event_tx.send(Event::JobFailed {
        id: ctx.id.clone(),
        error: message,
    });
}
