//! Error types for the extraction pipeline.
//!
//! Errors local to one unit (a failed oracle call, an unparseable line) are absorbed by the
//! orchestrator and never show up here. [`ExtractError`] covers what aborts a whole run or a
//! synchronous refinement.

use std::path::PathBuf;

use crate::oracle::GenerationError;

/// Run-global failures of an extraction or refinement.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Required input is structurally invalid (missing column, empty selection, ...).
    #[error("invalid input: {message}")]
    Input { message: String },

    /// The oracle failed where a response is required (refinement).
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The run was cancelled before it finished.
    #[error("extraction cancelled")]
    Cancelled,

    /// A source file could not be read.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    /// Create an input error from any displayable message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with the path it came from.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
