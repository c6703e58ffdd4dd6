//! Job lifecycle handlers: launch, status, archive fetch, cancel.

use super::JobStartedResponse;
use crate::api::AppState;
use crate::error::Error;
use crate::types::{DownloadRequest, JobId, JobSnapshot};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// POST /download - Launch an icon download job
#[utoipa::path(
    post,
    path = "/download",
    tag = "jobs",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Job accepted", body = JobStartedResponse),
        (status = 400, description = "Invalid request (empty apps, bad sizes)"),
        (status = 503, description = "Server is shutting down")
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Json<JobStartedResponse>, Error> {
    let job_id = state.hunter.start_download(request).await?;
    Ok(Json(JobStartedResponse { job_id }))
}

/// GET /status/{job_id} - Get a job snapshot
#[utoipa::path(
    get,
    path = "/status/{job_id}",
    tag = "jobs",
    params(
        ("job_id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Current job snapshot", body = JobSnapshot),
        (status = 404, description = "Unknown job id")
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobSnapshot>, Error> {
    let snapshot = state.hunter.job(&job_id).await?;
    Ok(Json(snapshot))
}

/// GET /jobs - List all known jobs, oldest first
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "jobs",
    responses(
        (status = 200, description = "Snapshots of all jobs", body = Vec<JobSnapshot>)
    )
)]
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSnapshot>> {
    Json(state.hunter.jobs().await)
}

/// GET /download/{job_id} - Fetch the archive of a completed job
#[utoipa::path(
    get,
    path = "/download/{job_id}",
    tag = "jobs",
    params(
        ("job_id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "ZIP archive bytes", content_type = "application/zip"),
        (status = 404, description = "Unknown job id"),
        (status = 409, description = "Job has not completed")
    )
)]
pub async fn fetch_archive(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<Response, Error> {
    let path = state.hunter.archive_path(&job_id).await?;
    let bytes = tokio::fs::read(&path).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("icons_{job_id}.zip"));

    tracing::debug!(job = %job_id, bytes = bytes.len(), "Archive served");

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// DELETE /download/{job_id} - Cancel a job that has not finished
#[utoipa::path(
    delete,
    path = "/download/{job_id}",
    tag = "jobs",
    params(
        ("job_id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 202, description = "Cancellation requested"),
        (status = 404, description = "Unknown job id"),
        (status = 409, description = "Job already reached a terminal state")
    )
)]
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<StatusCode, Error> {
    state.hunter.cancel(&job_id).await?;
    Ok(StatusCode::ACCEPTED)
}
