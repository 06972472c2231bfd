//! SkuTab Core - Attribute extraction and consolidation for product descriptions
//!
//! This crate contains the pipeline that turns free-text SKU descriptions into a single
//! attribute table:
//! - Unit suppliers (CSV rows, chunked documents, in-memory lists)
//! - Oracle backends (Ollama, OpenAI-compatible, Anthropic)
//! - Response parsing, name normalization and fuzzy consolidation
//! - Background jobs with progress polling and cancellation
//! - Conversational refinement of selected rows

pub mod config;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod oracle;
pub mod refine;

pub use config::{Config, Settings};
pub use error::{ExtractError, Result};
pub use extract::{AttributeRow, ConsolidatedTable, Industry, UnitSource};
pub use jobs::{ExtractionService, FailureKind, JobFailure, JobId, JobOutcome, JobStore};
pub use oracle::{GenerationError, Oracle, ProviderConfig};
pub use refine::{ChatMessage, RefinementRequest, RefinementResponse, Refiner};
