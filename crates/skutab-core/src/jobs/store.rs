//! In-memory job store.
//!
//! The map is shared by every poller. Each job has exactly one writer, the [`JobHandle`]
//! returned by [`JobStore::create`], which is moved into the task running the job. A handle
//! dropped before it reports a result (the task panicked or was aborted) fails its job with
//! [`FailureKind::Aborted`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::types::{FailureKind, JobFailure, JobId, JobOutcome, JobRecord, JobStatus};
use crate::extract::{ConsolidatedTable, ProgressReporter};

/// Progress never reaches 100 before the job is done.
const MAX_RUNNING_PROGRESS: u8 = 99;

struct TrackedJob {
    record: JobRecord,
    cancel: CancellationToken,
}

/// Tracks jobs in memory. No persistence.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, TrackedJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job and return its single writer.
    pub async fn create(&self) -> JobHandle {
        let id = JobId::new();
        let cancel = CancellationToken::new();
        self.jobs.write().await.insert(
            id.clone(),
            TrackedJob {
                record: JobRecord::new(id.clone()),
                cancel: cancel.clone(),
            },
        );
        tracing::info!(job_id = %id, "Job created");
        JobHandle {
            id,
            store: self.clone(),
            cancel,
            finished: false,
        }
    }

    /// Current progress, 0 for unknown ids.
    pub async fn progress(&self, id: &JobId) -> u8 {
        self.jobs
            .read()
            .await
            .get(id)
            .map(|j| j.record.progress)
            .unwrap_or(0)
    }

    /// Result of a finished job; `NotReady` for unknown or unfinished ones.
    pub async fn outcome(&self, id: &JobId) -> JobOutcome {
        let jobs = self.jobs.read().await;
        let Some(job) = jobs.get(id) else {
            return JobOutcome::NotReady;
        };
        match (&job.record.status, &job.record.result) {
            (JobStatus::Done, Some(table)) => JobOutcome::Done(table.clone()),
            (JobStatus::Failed { kind, error }, _) => {
                JobOutcome::Failed(JobFailure::new(*kind, error.clone()))
            }
            _ => JobOutcome::NotReady,
        }
    }

    /// Snapshot of a job record
    pub async fn record(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.read().await.get(id).map(|j| j.record.clone())
    }

    /// Request cancellation. Returns false if the id is unknown or the job already finished.
    pub async fn cancel(&self, id: &JobId) -> bool {
        let jobs = self.jobs.read().await;
        match jobs.get(id) {
            Some(job) if !job.record.status.is_finished() => {
                job.cancel.cancel();
                tracing::info!(job_id = %id, "Job cancellation requested");
                true
            }
            _ => false,
        }
    }

    /// Drop finished jobs older than `ttl`. Returns how many were removed.
    pub async fn evict_finished(&self, ttl: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };

        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.record.finished_at {
            Some(finished_at) => finished_at > cutoff,
            None => true,
        });
        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted finished jobs");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn update<F: FnOnce(&mut JobRecord)>(&self, id: &JobId, f: F) {
        if let Some(job) = self.jobs.write().await.get_mut(id) {
            f(&mut job.record);
        }
    }
}

fn mark_failed(record: &mut JobRecord, failure: JobFailure) {
    if record.status.is_finished() {
        return;
    }
    record.status = JobStatus::Failed {
        kind: failure.kind,
        error: failure.message,
    };
    record.finished_at = Some(Utc::now());
}

/// Writer for one job. Not `Clone`: only the task running the job updates it.
pub struct JobHandle {
    id: JobId,
    store: JobStore,
    cancel: CancellationToken,
    finished: bool,
}

impl JobHandle {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Mark the job as running.
    pub async fn start(&self) {
        self.store
            .update(&self.id, |r| r.status = JobStatus::Running)
            .await;
        tracing::info!(job_id = %self.id, "Job started");
    }

    /// Record that `done` of `total` units are processed.
    pub async fn set_progress(&self, done: usize, total: usize) {
        let percent = if total == 0 {
            0
        } else {
            (done.min(total) * 100 / total) as u8
        };
        let percent = percent.min(MAX_RUNNING_PROGRESS);
        self.store
            .update(&self.id, |r| r.progress = r.progress.max(percent))
            .await;
    }

    /// Finish with a table. Consumes the handle.
    pub async fn complete(mut self, table: ConsolidatedTable) {
        let rows = table.len();
        self.store
            .update(&self.id, |r| {
                r.progress = 100;
                r.status = JobStatus::Done;
                r.result = Some(table);
                r.finished_at = Some(Utc::now());
            })
            .await;
        self.finished = true;
        tracing::info!(job_id = %self.id, rows, "Job done");
    }

    /// Finish with a failure. Consumes the handle.
    pub async fn fail(mut self, failure: impl Into<JobFailure>) {
        let failure = failure.into();
        tracing::warn!(job_id = %self.id, kind = ?failure.kind, error = %failure, "Job failed");
        self.store
            .update(&self.id, |r| mark_failed(r, failure))
            .await;
        self.finished = true;
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!(job_id = %self.id, "Job handle dropped without a result");
        let failure = JobFailure::new(FailureKind::Aborted, "job task ended without a result");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let store = self.store.clone();
                let id = self.id.clone();
                runtime.spawn(async move {
                    store.update(&id, |r| mark_failed(r, failure)).await;
                });
            }
            Err(_) => match self.store.jobs.try_write() {
                Ok(mut jobs) => {
                    if let Some(job) = jobs.get_mut(&self.id) {
                        mark_failed(&mut job.record, failure);
                    }
                }
                Err(_) => tracing::error!(job_id = %self.id, "Job store busy, job left unfinished"),
            },
        }
    }
}

#[async_trait]
impl ProgressReporter for JobHandle {
    async fn unit_finished(&self, done: usize, total: usize) {
        self.set_progress(done, total).await;
    }
}
