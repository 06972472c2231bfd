//! The per-unit extraction loop.
//!
//! ```text
//! unit ──► unit_prompt ──► oracle (deadline) ──► parse_pairs ──► normalize ──► bucket
//!                               │ error / timeout
//!                               ▼
//!                         log, contribute nothing
//!
//! after the last unit: bucket ──► consolidate ──► ConsolidatedTable
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::bucket::AttributeBucket;
use super::consolidate::consolidate;
use super::normalize::normalize_attribute;
use super::parser::{parse_pairs, SplitMode};
use super::prompt::unit_prompt;
use super::table::ConsolidatedTable;
use crate::error::{ExtractError, Result};
use crate::oracle::{generate_with_timeout, Oracle};

/// Default deadline for a single oracle call.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Receives a notification after every processed unit.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// `done` units out of `total` have been processed (successfully or not).
    async fn unit_finished(&self, done: usize, total: usize);
}

/// No-op reporter for synchronous runs and tests
pub struct NoProgress;

#[async_trait]
impl ProgressReporter for NoProgress {
    async fn unit_finished(&self, _done: usize, _total: usize) {}
}

/// Counters for one run, logged when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub units: usize,
    pub failed_units: usize,
    pub raw_attributes: usize,
    pub canonical_attributes: usize,
}

/// Drives oracle calls over a sequence of units and consolidates the answers.
#[derive(Clone)]
pub struct Orchestrator {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    /// Set the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn oracle(&self) -> &Arc<dyn Oracle> {
        &self.oracle
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Process `units` strictly in order and build the consolidated table.
    ///
    /// A failed or timed-out oracle call only loses that unit. Cancellation is checked before
    /// each unit and raced against the in-flight call; it aborts the run.
    pub async fn run(
        &self,
        units: &[String],
        mode: SplitMode,
        domain_prompt: &str,
        cancel: &CancellationToken,
        reporter: &dyn ProgressReporter,
    ) -> Result<(ConsolidatedTable, RunStats)> {
        let total = units.len();
        let mut bucket = AttributeBucket::new();
        let mut stats = RunStats {
            units: total,
            ..Default::default()
        };

        tracing::info!(
            units = total,
            provider = self.oracle.provider_name(),
            model = self.oracle.model_id(),
            "Starting extraction"
        );

        for (i, unit) in units.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }

            tracing::debug!(unit = i + 1, total, "Processing unit");
            let prompt = unit_prompt(domain_prompt, unit);

            let response = tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(ExtractError::Cancelled),

                response = generate_with_timeout(self.oracle.as_ref(), &prompt, self.timeout) => response,
            };

            match response {
                Ok(text) => {
                    for pair in parse_pairs(&text, mode) {
                        let name = normalize_attribute(&pair.attribute);
                        if name.is_empty() {
                            tracing::trace!(raw = %pair.attribute, "Attribute normalized to nothing");
                            continue;
                        }
                        bucket.extend(&name, &pair.values);
                    }
                }
                Err(e) => {
                    stats.failed_units += 1;
                    tracing::warn!(unit = i + 1, error = %e, "Oracle call failed, skipping unit");
                }
            }

            reporter.unit_finished(i + 1, total).await;
        }

        stats.raw_attributes = bucket.len();
        let merged = consolidate([&bucket]);
        stats.canonical_attributes = merged.len();
        let table = ConsolidatedTable::from_bucket(merged);

        tracing::info!(
            units = stats.units,
            failed_units = stats.failed_units,
            raw_attributes = stats.raw_attributes,
            attributes = stats.canonical_attributes,
            "Extraction finished"
        );

        Ok((table, stats))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::extract::AttributeRow;
    use crate::oracle::{GenerationError, ScriptedOracle};

    fn units(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(usize, usize)>>);

    #[async_trait]
    impl ProgressReporter for Recorder {
        async fn unit_finished(&self, done: usize, total: usize) {
            self.0.lock().unwrap().push((done, total));
        }
    }

    #[tokio::test]
    async fn test_widget_example() {
        let oracle = Arc::new(ScriptedOracle::replies([
            "Memory = 4GB",
            "Memory = 8GB\nColor = Red",
        ]));
        let orchestrator = Orchestrator::new(oracle.clone());

        let (table, stats) = orchestrator
            .run(
                &units(&["Widget A, 4GB RAM", "Widget B, 8GB RAM, red color"]),
                SplitMode::Lines,
                "PREFIX",
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(table.columns(), ["Attribute", "Value1", "Value2"]);
        assert_eq!(
            table.padded_rows(),
            vec![strings(&["Memory", "4GB", "8GB"]), strings(&["Color", "Red", ""])]
        );
        assert_eq!(stats.failed_units, 0);

        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].starts_with("PREFIX"));
        assert!(prompts[1].contains("Widget B, 8GB RAM, red color"));
    }

    #[tokio::test]
    async fn test_failed_unit_does_not_stop_batch() {
        let oracle = Arc::new(ScriptedOracle::new([
            Ok("Color = Red".to_string()),
            Err(GenerationError::Request("connection refused".into())),
            Ok("Weight = 2kg".to_string()),
        ]));
        let recorder = Recorder::default();

        let (table, stats) = Orchestrator::new(oracle)
            .run(
                &units(&["a", "b", "c"]),
                SplitMode::Lines,
                "",
                &CancellationToken::new(),
                &recorder,
            )
            .await
            .unwrap();

        assert_eq!(
            table.rows(),
            [
                AttributeRow::new("Color", strings(&["Red"])),
                AttributeRow::new("Weight", strings(&["2kg"])),
            ]
        );
        assert_eq!(stats.failed_units, 1);
        assert_eq!(*recorder.0.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_normalizes_and_folds_names() {
        let oracle = Arc::new(ScriptedOracle::replies([
            "**battery life**: 10h\nscreen size = 6.1in",
            "Battery-Life: 12h\nColour: Black",
            "Color = White",
        ]));

        let (table, stats) = Orchestrator::new(oracle)
            .run(
                &units(&["a", "b", "c"]),
                SplitMode::Lines,
                "",
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        let names: Vec<_> = table.rows().iter().map(|r| r.attribute.as_str()).collect();
        assert_eq!(names, ["Battery Life", "Screen Size", "Colour"]);
        assert_eq!(table.rows()[0].values, strings(&["10h", "12h"]));
        assert_eq!(table.rows()[2].values, strings(&["Black", "White"]));
        assert_eq!(stats.raw_attributes, 5);
        assert_eq!(stats.canonical_attributes, 3);
    }

    #[tokio::test]
    async fn test_timeout_skips_unit() {
        let oracle = Arc::new(
            ScriptedOracle::replies(["Color = Red"]).with_delay(Duration::from_millis(200)),
        );
        let (table, stats) = Orchestrator::new(oracle)
            .with_timeout(Duration::from_millis(20))
            .run(
                &units(&["a"]),
                SplitMode::Lines,
                "",
                &CancellationToken::new(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert!(table.is_empty());
        assert_eq!(stats.failed_units, 1);
        assert_eq!(table.columns(), ["Attribute", "Value1"]);
    }

    #[tokio::test]
    async fn test_cancelled_run_aborts() {
        let oracle = Arc::new(ScriptedOracle::replies(["Color = Red"]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = Orchestrator::new(oracle.clone())
            .run(&units(&["a"]), SplitMode::Lines, "", &cancel, &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractError::Cancelled));
        assert!(oracle.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_inflight_call() {
        let oracle = Arc::new(
            ScriptedOracle::replies(["Color = Red"]).with_delay(Duration::from_secs(30)),
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = Orchestrator::new(oracle)
            .run(&units(&["a"]), SplitMode::Lines, "", &cancel, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Cancelled));
    }
}
