//! Attribute extraction pipeline
//!
//! Units are sent to the oracle one by one, responses are parsed into attribute/value pairs,
//! names are normalized and folded with fuzzy matching, and the result is assembled into a
//! [`ConsolidatedTable`].

pub mod bucket;
pub mod consolidate;
pub mod normalize;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod similarity;
pub mod source;
pub mod table;

pub use bucket::{AttributeBucket, AttributeEntry};
pub use consolidate::{consolidate, Consolidator, SIMILARITY_THRESHOLD};
pub use normalize::normalize_attribute;
pub use orchestrator::{NoProgress, Orchestrator, ProgressReporter, RunStats, DEFAULT_ORACLE_TIMEOUT};
pub use parser::{parse_attributes, parse_pairs, ParsedPair, SplitMode};
pub use prompt::{domain_prompt, unit_prompt, Industry};
pub use similarity::{ratio, ratio_ignore_case};
pub use source::{chunk_text, LoadedUnits, UnitSource, DEFAULT_CHUNK_MAX_CHARS, DEFAULT_DESCRIPTION_COLUMN};
pub use table::{AttributeRow, ConsolidatedTable};
