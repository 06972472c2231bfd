//! Command error types for the command line surface
//!
//! Provides structured errors that serialize to `{"code": "...", "message": "..."}`.

use serde::Serialize;
use skutab_core::ExtractError;

/// Errors returned by commands
///
/// Each variant serializes with a snake_case `code` field for scripted callers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CommandError {
    // Validation errors
    InvalidInput { message: String },
    InvalidRequest { message: String },

    // Job errors
    ExtractionFailed { message: String, job_id: String },
    Cancelled { message: String },

    // Operation errors
    GenerationError { message: String },
    StorageError { message: String },
    InternalError { message: String },
}

impl CommandError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn extraction_failed(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
            job_id: job_id.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::Cancelled {
            message: "extraction cancelled".to_string(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// The error as a JSON document, for printing.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"internal_error","message":{:?}}}"#, self.to_string())
        })
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "{}", message),
            Self::InvalidRequest { message } => write!(f, "{}", message),
            Self::ExtractionFailed { message, .. } => write!(f, "{}", message),
            Self::Cancelled { message } => write!(f, "{}", message),
            Self::GenerationError { message } => write!(f, "{}", message),
            Self::StorageError { message } => write!(f, "{}", message),
            Self::InternalError { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<ExtractError> for CommandError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Input { message } => Self::InvalidInput { message },
            ExtractError::Generation(e) => Self::GenerationError {
                message: e.to_string(),
            },
            ExtractError::Cancelled => Self::cancelled(),
            e @ ExtractError::Io { .. } => Self::storage(e.to_string()),
        }
    }
}

/// Result type alias for commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Extension trait for converting Results to CommandResult
pub trait ResultExt<T> {
    fn storage_err(self) -> CommandResult<T>;
    fn request_err(self) -> CommandResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn storage_err(self) -> CommandResult<T> {
        self.map_err(|e| CommandError::storage(e.to_string()))
    }

    fn request_err(self) -> CommandResult<T> {
        self.map_err(|e| CommandError::invalid_request(e.to_string()))
    }
}
