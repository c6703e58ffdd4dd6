//! Explicit in-memory job registry
//!
//! The registry is the single owner of job state. It is handed to the worker
//! and the API through the engine handle rather than living in a global, and
//! it is the only place job snapshots are mutated, which is where the status
//! state machine and the monotonic-progress invariant are enforced.

use crate::error::{JobError, Result};
use crate::types::{FailedApp, JobId, JobSnapshot, JobStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Registry mapping job ids to their current snapshots
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobSnapshot>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly created job
    pub async fn insert(&self, snapshot: JobSnapshot) {
        self.jobs.write().await.insert(snapshot.id.clone(), snapshot);
    }

    /// Get a point-in-time snapshot of one job
    pub async fn get(&self, id: &JobId) -> Result<JobSnapshot> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| JobError::NotFound { id: id.clone() }.into())
    }

    /// Snapshots of every known job, oldest first
    pub async fn list(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> = self.jobs.read().await.values().cloned().collect();
        snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        snapshots
    }

    /// Transition a job from pending to running
    pub async fn mark_running(&self, id: &JobId) -> Result<()> {
        self.transition(id, JobStatus::Running, |_| {}).await
    }

    /// Record an app whose icons were all fetched
    ///
    /// No-op if the job already reached a terminal state (a worker racing a
    /// cancellation must not mutate a settled job).
    pub async fn record_app_completed(&self, id: &JobId, app: &str) -> Result<()> {
        self.record_progress(id, |job| {
            job.completed_apps.push(app.to_string());
        })
        .await
    }

    /// Record an app that could not be fetched
    pub async fn record_app_failed(&self, id: &JobId, app: &str, error: &str) -> Result<()> {
        self.record_progress(id, |job| {
            job.failed_apps.push(FailedApp {
                app: app.to_string(),
                error: error.to_string(),
            });
        })
        .await
    }

    /// Transition a job from running to completed and attach the archive path
    pub async fn complete(&self, id: &JobId, zip_path: PathBuf) -> Result<()> {
        self.transition(id, JobStatus::Completed, |job| {
            job.zip_path = Some(zip_path);
            job.finished_at = Some(Utc::now());
        })
        .await
    }

    /// Transition a job into the failed terminal state
    pub async fn fail(&self, id: &JobId, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.transition(id, JobStatus::Failed, |job| {
            job.error_message = Some(message);
            job.finished_at = Some(Utc::now());
        })
        .await
    }

    async fn transition<F>(&self, id: &JobId, to: JobStatus, apply: F) -> Result<()>
    where
        F: FnOnce(&mut JobSnapshot),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound { id: id.clone() })?;

        if !job.status.can_transition_to(to) {
            return Err(JobError::InvalidTransition {
                id: id.clone(),
                from: job.status,
                to,
            }
            .into());
        }

        job.status = to;
        apply(job);
        Ok(())
    }

    async fn record_progress<F>(&self, id: &JobId, apply: F) -> Result<()>
    where
        F: FnOnce(&mut JobSnapshot),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound { id: id.clone() })?;

        if job.status.is_terminal() {
            return Ok(());
        }

        // progress only ever increments, capped by total
        if job.progress < job.total {
            job.progress += 1;
        }
        apply(job);
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn job(id: &str, total: u32) -> JobSnapshot {
        JobSnapshot::new(JobId::from(id), total)
    }

    #[tokio::test]
    async fn get_unknown_job_is_not_found() {
        let registry = JobRegistry::new();
        let err = registry.get(&JobId::from("missing")).await.unwrap_err();
        assert!(matches!(err, Error::Job(JobError::NotFound { .. })));
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let registry = JobRegistry::new();
        registry.insert(job("j1", 2)).await;

        let snapshot = registry.get(&JobId::from("j1")).await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Pending);
        assert_eq!(snapshot.total, 2);
    }

    #[tokio::test]
    async fn lifecycle_happy_path() {
        let registry = JobRegistry::new();
        let id = JobId::from("j1");
        registry.insert(job("j1", 2)).await;

        registry.mark_running(&id).await.unwrap();
        registry.record_app_completed(&id, "Signal").await.unwrap();
        registry.record_app_completed(&id, "WhatsApp").await.unwrap();
        registry
            .complete(&id, PathBuf::from("/tmp/icons_j1.zip"))
            .await
            .unwrap();

        let snapshot = registry.get(&id).await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.progress, 2);
        assert_eq!(snapshot.completed_apps, vec!["Signal", "WhatsApp"]);
        assert_eq!(snapshot.zip_path, Some(PathBuf::from("/tmp/icons_j1.zip")));
        assert!(snapshot.finished_at.is_some());
    }

    #[tokio::test]
    async fn completing_a_pending_job_is_rejected() {
        let registry = JobRegistry::new();
        let id = JobId::from("j1");
        registry.insert(job("j1", 1)).await;

        let err = registry
            .complete(&id, PathBuf::from("/tmp/x.zip"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Job(JobError::InvalidTransition {
                from: JobStatus::Pending,
                to: JobStatus::Completed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn terminal_jobs_reject_further_transitions() {
        let registry = JobRegistry::new();
        let id = JobId::from("j1");
        registry.insert(job("j1", 1)).await;
        registry.mark_running(&id).await.unwrap();
        registry.fail(&id, "icon unreachable").await.unwrap();

        assert!(registry.mark_running(&id).await.is_err());
        assert!(
            registry
                .complete(&id, PathBuf::from("/tmp/x.zip"))
                .await
                .is_err()
        );
        assert!(registry.fail(&id, "again").await.is_err());
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_capped_at_total() {
        let registry = JobRegistry::new();
        let id = JobId::from("j1");
        registry.insert(job("j1", 2)).await;
        registry.mark_running(&id).await.unwrap();

        let mut last = 0;
        for app in ["a", "b", "c", "d"] {
            registry.record_app_completed(&id, app).await.unwrap();
            let snapshot = registry.get(&id).await.unwrap();
            assert!(snapshot.progress >= last, "progress must never decrease");
            assert!(snapshot.progress <= snapshot.total, "progress must not exceed total");
            last = snapshot.progress;
        }
        assert_eq!(last, 2);
    }

    #[tokio::test]
    async fn progress_updates_after_terminal_state_are_ignored() {
        let registry = JobRegistry::new();
        let id = JobId::from("j1");
        registry.insert(job("j1", 3)).await;
        registry.mark_running(&id).await.unwrap();
        registry.fail(&id, "cancelled").await.unwrap();

        // A worker racing the cancellation reports late; the settled job
        // must not change
        registry.record_app_completed(&id, "late").await.unwrap();

        let snapshot = registry.get(&id).await.unwrap();
        assert_eq!(snapshot.progress, 0);
        assert!(snapshot.completed_apps.is_empty());
        assert_eq!(snapshot.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn failed_apps_carry_reasons() {
        let registry = JobRegistry::new();
        let id = JobId::from("j1");
        registry.insert(job("j1", 1)).await;
        registry.mark_running(&id).await.unwrap();
        registry
            .record_app_failed(&id, "Ghost App", "icon fetch failed: HTTP 404")
            .await
            .unwrap();

        let snapshot = registry.get(&id).await.unwrap();
        assert_eq!(snapshot.failed_apps.len(), 1);
        assert_eq!(snapshot.failed_apps[0].app, "Ghost App");
        assert!(snapshot.failed_apps[0].error.contains("404"));
    }

    #[tokio::test]
    async fn list_returns_jobs_oldest_first() {
        let registry = JobRegistry::new();
        registry.insert(job("first", 1)).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        registry.insert(job("second", 1)).await;

        let jobs = registry.list().await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, JobId::from("first"));
        assert_eq!(jobs[1].id, JobId::from("second"));
    }
}
