//! Caller-facing extraction service.
//!
//! ```text
//! start_extraction ──► JobStore::create ──► tokio::spawn ──► UnitSource::load
//!        │                                                        │
//!        ▼                                                        ▼
//!   JobId (immediately)                           Orchestrator::run (progress via JobHandle)
//!                                                                 │
//!                                                                 ▼
//!                                                 JobHandle::complete / JobHandle::fail
//! ```

use std::sync::Arc;
use std::time::Duration;

use super::store::{JobHandle, JobStore};
use super::types::{JobId, JobOutcome};
use crate::config::Settings;
use crate::error::Result;
use crate::extract::{ConsolidatedTable, Orchestrator, UnitSource};
use crate::oracle::Oracle;
use crate::refine::{RefinementRequest, Refiner};

/// Default time finished jobs stay pollable.
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(3600);

/// Runs extraction jobs in the background and answers polls about them.
#[derive(Clone)]
pub struct ExtractionService {
    orchestrator: Orchestrator,
    store: JobStore,
    job_ttl: Duration,
}

impl ExtractionService {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            orchestrator: Orchestrator::new(oracle),
            store: JobStore::new(),
            job_ttl: DEFAULT_JOB_TTL,
        }
    }

    /// Build the service described by `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.provider.build())
            .with_oracle_timeout(settings.oracle_timeout())
            .with_job_ttl(settings.job_ttl())
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.orchestrator = self.orchestrator.with_timeout(timeout);
        self
    }

    pub fn with_job_ttl(mut self, ttl: Duration) -> Self {
        self.job_ttl = ttl;
        self
    }

    /// Use an existing store, e.g. one shared with another service.
    pub fn with_store(mut self, store: JobStore) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Start extracting from in-memory units. Returns as soon as the job is registered.
    pub async fn start_extraction(&self, units: Vec<String>, domain_prompt: impl Into<String>) -> JobId {
        self.start_extraction_from_source(UnitSource::Units(units), domain_prompt)
            .await
    }

    /// Start extracting from any unit source. The source is read inside the job, so a
    /// missing column or unreadable file fails the job instead of this call.
    pub async fn start_extraction_from_source(
        &self,
        source: UnitSource,
        domain_prompt: impl Into<String>,
    ) -> JobId {
        let handle = self.store.create().await;
        let id = handle.id().clone();
        let orchestrator = self.orchestrator.clone();
        let domain_prompt = domain_prompt.into();

        tokio::spawn(async move {
            handle.start().await;
            let result = run_job(&orchestrator, &source, &domain_prompt, &handle).await;
            match result {
                Ok(table) => handle.complete(table).await,
                Err(e) => handle.fail(e).await,
            }
        });

        id
    }

    /// Progress 0..=100; 0 for unknown ids.
    pub async fn get_progress(&self, id: &JobId) -> u8 {
        self.store.progress(id).await
    }

    pub async fn get_result(&self, id: &JobId) -> JobOutcome {
        self.store.outcome(id).await
    }

    /// Request cancellation of a running job.
    pub async fn cancel(&self, id: &JobId) -> bool {
        self.store.cancel(id).await
    }

    /// Drop finished jobs older than the configured time-to-live.
    pub async fn evict_finished(&self) -> usize {
        self.store.evict_finished(self.job_ttl).await
    }

    /// Refine selected rows of a table. Blocks until the oracle answers.
    pub async fn refine(&self, request: RefinementRequest) -> Result<ConsolidatedTable> {
        let refiner = Refiner::new(self.orchestrator.oracle().clone())
            .with_timeout(self.orchestrator.timeout());
        refiner
            .refine(
                &request.selected_rows,
                &request.chat_history,
                ConsolidatedTable::new(request.full_table),
            )
            .await
    }
}

async fn run_job(
    orchestrator: &Orchestrator,
    source: &UnitSource,
    domain_prompt: &str,
    handle: &JobHandle,
) -> Result<ConsolidatedTable> {
    let loaded = source.load().await?;
    tracing::debug!(job_id = %handle.id(), units = loaded.units.len(), "Units loaded");
    let (table, _) = orchestrator
        .run(
            &loaded.units,
            loaded.mode,
            domain_prompt,
            handle.cancel_token(),
            handle,
        )
        .await?;
    Ok(table)
}
