//! Command implementations behind the `skutab` binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use skutab_core::extract::domain_prompt;
use skutab_core::{
    ConsolidatedTable, ExtractionService, Industry, JobFailure, JobId, JobOutcome,
    RefinementRequest, RefinementResponse, Settings, UnitSource,
};

use crate::error::{CommandError, CommandResult, ResultExt};

/// How the input file is cut into units
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// CSV with one description per row
    Rows,
    /// Plain text split into chunks
    Document,
}

impl InputFormat {
    /// `.csv` files are rows, anything else is a document.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Rows,
            _ => InputFormat::Document,
        }
    }
}

/// Parameters of one `extract` invocation.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub path: PathBuf,
    pub industry: Industry,
    pub product_type: Option<String>,
    pub format: Option<InputFormat>,
}

impl ExtractRequest {
    pub fn source(&self, settings: &Settings) -> UnitSource {
        match self.format.unwrap_or_else(|| InputFormat::infer(&self.path)) {
            InputFormat::Rows => UnitSource::Rows {
                path: self.path.clone(),
                column: settings.description_column.clone(),
            },
            InputFormat::Document => UnitSource::Document {
                path: self.path.clone(),
                max_chars: settings.chunk_max_chars,
            },
        }
    }
}

/// Run an extraction job and wait for its table.
///
/// Progress is logged while polling. Ctrl+C cancels the job.
pub async fn extract(
    service: &ExtractionService,
    settings: &Settings,
    request: &ExtractRequest,
    poll_interval: Duration,
) -> CommandResult<ConsolidatedTable> {
    let prompt = domain_prompt(&request.industry, request.product_type.as_deref());
    let id = service
        .start_extraction_from_source(request.source(settings), prompt)
        .await;
    tracing::info!(job_id = %id, path = ?request.path, "Extraction started");

    let mut last_progress = 0;
    loop {
        match service.get_result(&id).await {
            JobOutcome::Done(table) => return Ok(table),
            JobOutcome::Failed(failure) => return Err(failure_error(&id, failure)),
            JobOutcome::NotReady => {}
        }

        let progress = service.get_progress(&id).await;
        if progress != last_progress {
            tracing::info!(job_id = %id, progress, "Extraction progress");
            last_progress = progress;
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!(job_id = %id, "Interrupted, cancelling job");
                service.cancel(&id).await;
            }
        }
    }
}

fn failure_error(id: &JobId, failure: JobFailure) -> CommandError {
    if failure.is_cancelled() {
        CommandError::cancelled()
    } else {
        CommandError::extraction_failed(id.as_str(), failure.message)
    }
}

/// The effective settings, written to `path` when `write` is set.
pub fn settings(settings: &Settings, path: &Path, write: bool) -> CommandResult<Settings> {
    if write {
        settings.save(path).storage_err()?;
        tracing::info!(path = ?path, "Settings saved");
    }
    Ok(settings.clone())
}

/// Read a refinement request file and apply it.
pub async fn refine(service: &ExtractionService, path: &Path) -> CommandResult<RefinementResponse> {
    let content = tokio::fs::read_to_string(path).await.storage_err()?;
    let request: RefinementRequest = serde_json::from_str(&content).request_err()?;
    let table = service.refine(request).await?;
    Ok(RefinementResponse {
        rows: table.into_rows(),
    })
}
