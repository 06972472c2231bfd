//! Unit suppliers: turn an input into the ordered text units the orchestrator consumes.
//!
//! Reading happens lazily through [`UnitSource::load`] so that an unreadable file or a missing
//! column surfaces as a failed job rather than an error at submission time.

use std::path::{Path, PathBuf};

use text_splitter::TextSplitter;

use super::parser::SplitMode;
use crate::error::{ExtractError, Result};

/// Column holding the free-text description in row-oriented inputs.
pub const DEFAULT_DESCRIPTION_COLUMN: &str = "SKU_Description";

/// Maximum characters per document chunk.
pub const DEFAULT_CHUNK_MAX_CHARS: usize = 3000;

/// Where the units of an extraction come from.
#[derive(Debug, Clone)]
pub enum UnitSource {
    /// Units supplied directly, one response per unit parsed line by line.
    Units(Vec<String>),
    /// CSV file with a header row; one unit per non-blank description cell.
    Rows { path: PathBuf, column: String },
    /// Plain-text document cut into chunks of at most `max_chars` characters.
    Document { path: PathBuf, max_chars: usize },
}

/// Units ready for the orchestrator, with the parse mode suited to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedUnits {
    pub units: Vec<String>,
    pub mode: SplitMode,
}

impl UnitSource {
    /// Read and split the source. File reads go through `tokio::fs` so a slow disk never
    /// stalls the runtime worker driving the job.
    pub async fn load(&self) -> Result<LoadedUnits> {
        match self {
            UnitSource::Units(units) => Ok(LoadedUnits {
                units: units
                    .iter()
                    .map(|u| u.trim())
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
                    .collect(),
                mode: SplitMode::Lines,
            }),
            UnitSource::Rows { path, column } => Ok(LoadedUnits {
                units: read_rows(path, column).await?,
                mode: SplitMode::Lines,
            }),
            UnitSource::Document { path, max_chars } => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| ExtractError::io(path, e))?;
                Ok(LoadedUnits {
                    units: chunk_text(&text, *max_chars),
                    mode: SplitMode::Segments,
                })
            }
        }
    }
}

/// Description cells of the `column` column, skipping blank ones.
async fn read_rows(path: &Path, column: &str) -> Result<Vec<String>> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| ExtractError::io(path, e))?;
    let units = description_cells(&data, column)?;
    tracing::debug!(path = %path.display(), rows = units.len(), "Read description rows");
    Ok(units)
}

fn description_cells(data: &[u8], column: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| ExtractError::input(format!("unreadable header row: {}", e)))?;
    let Some(index) = headers.iter().position(|h| h.trim() == column) else {
        return Err(ExtractError::input(format!(
            "input must contain a column named '{}'",
            column
        )));
    };

    let mut units = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| ExtractError::input(format!("unreadable row {}: {}", line + 1, e)))?;
        match record.get(index).map(str::trim) {
            Some(description) if !description.is_empty() => units.push(description.to_string()),
            _ => tracing::debug!(row = line + 1, "Skipping row without description"),
        }
    }
    Ok(units)
}

/// Collapse whitespace and split into chunks of at most `max_chars` characters,
/// preferring sentence and word boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return Vec::new();
    }

    let splitter = TextSplitter::new(max_chars.max(1));
    splitter
        .chunks(&cleaned)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
