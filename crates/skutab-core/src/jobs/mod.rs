//! Asynchronous extraction jobs.
//!
//! A job is one pipeline run in a background task. Callers get its id immediately and poll
//! progress and result through [`ExtractionService`].

mod service;
mod store;
mod types;

pub use service::{ExtractionService, DEFAULT_JOB_TTL};
pub use store::{JobHandle, JobStore};
pub use types::{FailureKind, JobFailure, JobId, JobOutcome, JobRecord, JobStatus};
