//! Job records and the outcomes exposed to pollers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::extract::ConsolidatedTable;

/// Opaque identifier of one extraction job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Mint a fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum JobStatus {
    /// Id minted, task not started yet
    Created,
    /// Units are being processed
    Running,
    /// Finished with a table
    Done,
    /// Aborted by a run-global error
    Failed { kind: FailureKind, error: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed { .. })
    }
}

/// Category of a job failure, matched on instead of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Input rejected: missing column, unreadable rows
    InvalidInput,
    Generation,
    /// Cancelled through the store
    Cancelled,
    /// Source file unreadable
    Io,
    /// The task running the job ended without reporting a result
    Aborted,
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

impl From<&ExtractError> for JobFailure {
    fn from(error: &ExtractError) -> Self {
        let kind = match error {
            ExtractError::Input { .. } => FailureKind::InvalidInput,
            ExtractError::Generation(_) => FailureKind::Generation,
            ExtractError::Cancelled => FailureKind::Cancelled,
            ExtractError::Io { .. } => FailureKind::Io,
        };
        Self::new(kind, error.to_string())
    }
}

impl From<ExtractError> for JobFailure {
    fn from(error: ExtractError) -> Self {
        Self::from(&error)
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Everything tracked about one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: JobId,
    /// 0..=100, never decreasing; 100 only once `status` is `Done`
    pub progress: u8,
    #[serde(flatten)]
    pub status: JobStatus,
    pub result: Option<ConsolidatedTable>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub(crate) fn new(id: JobId) -> Self {
        Self {
            id,
            progress: 0,
            status: JobStatus::Created,
            result: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// What a result poll returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Unknown id, or the job is still running
    NotReady,
    Done(ConsolidatedTable),
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn is_ready(&self) -> bool {
        !matches!(self, JobOutcome::NotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::GenerationError;

    #[test]
    fn test_failure_kind_follows_error_variant() {
        let cases = [
            (ExtractError::input("no column"), FailureKind::InvalidInput),
            (
                ExtractError::from(GenerationError::EmptyResponse),
                FailureKind::Generation,
            ),
            (ExtractError::Cancelled, FailureKind::Cancelled),
            (
                ExtractError::io(
                    "missing.csv",
                    std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                ),
                FailureKind::Io,
            ),
        ];
        for (error, kind) in cases {
            let failure = JobFailure::from(&error);
            assert_eq!(failure.kind, kind);
            assert_eq!(failure.message, error.to_string());
        }
        assert!(JobFailure::from(ExtractError::Cancelled).is_cancelled());
    }

    #[test]
    fn test_cancelled_kind_does_not_depend_on_message() {
        let failure = JobFailure::new(FailureKind::InvalidInput, "extraction cancelled");
        assert!(!failure.is_cancelled());
        let failure = JobFailure::new(FailureKind::Cancelled, "stopped by user");
        assert!(failure.is_cancelled());
    }
}
