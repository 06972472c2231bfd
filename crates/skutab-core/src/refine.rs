//! Conversational refinement of selected table rows.
//!
//! The oracle sees the selected rows and the latest feedback message and answers with corrected
//! rows. Corrected rows are spliced back positionally: the `i`-th selected row, located in the
//! full table by value equality, is replaced by the `i`-th corrected row. Everything else in the
//! table keeps its content and position.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};
use crate::extract::{parse_pairs, AttributeRow, ConsolidatedTable, SplitMode, DEFAULT_ORACLE_TIMEOUT};
use crate::oracle::{generate_with_timeout, Oracle};

/// One feedback message. Only `content` is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            content: content.into(),
        }
    }
}

/// Input of a refinement, as sent by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementRequest {
    pub selected_rows: Vec<AttributeRow>,
    pub chat_history: Vec<ChatMessage>,
    pub full_table: Vec<AttributeRow>,
}

/// Output of a refinement: the full table with the selected rows replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementResponse {
    pub rows: Vec<AttributeRow>,
}

/// Runs refinement calls against an oracle.
#[derive(Clone)]
pub struct Refiner {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl Refiner {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask the oracle to correct `selected` according to the latest message in `history` and
    /// splice the answer into `full_table`.
    pub async fn refine(
        &self,
        selected: &[AttributeRow],
        history: &[ChatMessage],
        full_table: ConsolidatedTable,
    ) -> Result<ConsolidatedTable> {
        if selected.is_empty() {
            return Err(ExtractError::input("no rows selected for refinement"));
        }
        let Some(latest) = history.last() else {
            return Err(ExtractError::input("chat history is empty"));
        };
        if latest.content.trim().is_empty() {
            return Err(ExtractError::input("latest chat message is empty"));
        }

        let prompt = refinement_prompt(selected, &latest.content);
        let response = generate_with_timeout(self.oracle.as_ref(), &prompt, self.timeout).await?;

        let refined = parse_refined_rows(&response);
        tracing::info!(
            selected = selected.len(),
            refined = refined.len(),
            "Refinement response parsed"
        );
        Ok(merge_refined(full_table, selected, &refined))
    }
}

/// Prompt embedding the selected rows and the feedback instruction.
pub fn refinement_prompt(selected: &[AttributeRow], instruction: &str) -> String {
    let rows = serde_json::Value::from(
        selected
            .iter()
            .map(|r| serde_json::Value::from(r.to_cells(r.values.len())))
            .collect::<Vec<_>>(),
    );
    format!(
        "You are refining a table of attributes and values. \
         Here are the rows the user selected: {}. \
         The user instruction is: {}. \
         Return ONLY the corrected attribute name and value rows \
         in plain JSON array format, like this:\n\
         [[\"Attribute\", \"Value\"], [\"Another Attribute\", \"Value\"]]",
        rows,
        instruction.trim()
    )
}

/// Read corrected rows from a response, one slot per row of the answer.
///
/// Strict JSON first (the whole text, then a JSON row list starting at any `[` with trailing
/// text allowed); otherwise `attribute = value` lines. An empty JSON row keeps its slot as
/// `None` so later rows stay aligned with the selection.
pub fn parse_refined_rows(text: &str) -> Vec<Option<AttributeRow>> {
    if let Ok(rows) = serde_json::from_str::<Vec<Vec<serde_json::Value>>>(text.trim()) {
        return json_rows(rows);
    }
    if let Some(rows) = embedded_json_rows(text) {
        return rows;
    }

    tracing::debug!("Refinement response is not a JSON row list, parsing lines");
    parse_pairs(text, SplitMode::Lines)
        .into_iter()
        .map(|pair| Some(AttributeRow::new(pair.attribute, pair.values)))
        .collect()
}

/// First non-empty JSON row list found at a `[` in `text`, or an empty one if that is all
/// there is.
fn embedded_json_rows(text: &str) -> Option<Vec<Option<AttributeRow>>> {
    let mut empty_list = false;
    for (start, _) in text.match_indices('[') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Vec<Vec<serde_json::Value>>>();
        match stream.next() {
            Some(Ok(rows)) if rows.is_empty() => empty_list = true,
            Some(Ok(rows)) => return Some(json_rows(rows)),
            _ => {}
        }
    }
    empty_list.then(Vec::new)
}

fn json_rows(rows: Vec<Vec<serde_json::Value>>) -> Vec<Option<AttributeRow>> {
    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            AttributeRow::from_cells(&cells)
        })
        .collect()
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Positional splice of `refined` into `table`.
///
/// The `i`-th refined slot replaces the `i`-th selected row. Empty slots, selected rows missing
/// from the table and selected rows past the end of `refined` leave the table unchanged.
pub fn merge_refined(
    mut table: ConsolidatedTable,
    selected: &[AttributeRow],
    refined: &[Option<AttributeRow>],
) -> ConsolidatedTable {
    for (row, replacement) in selected.iter().zip(refined) {
        let Some(replacement) = replacement else {
            tracing::debug!(attribute = %row.attribute, "Empty refined row, keeping selection");
            continue;
        };
        match table.position(row) {
            Some(index) => table.rows_mut()[index] = replacement.clone(),
            None => {
                tracing::debug!(attribute = %row.attribute, "Selected row not in table, skipping")
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{GenerationError, ScriptedOracle};

    fn row(cells: &[&str]) -> AttributeRow {
        AttributeRow::from_cells(cells).unwrap()
    }

    fn table() -> ConsolidatedTable {
        ConsolidatedTable::new(vec![
            row(&["Memory", "4GB", "8GB"]),
            row(&["Colour", "Red"]),
            row(&["Weight", "2kg"]),
        ])
    }

    #[tokio::test]
    async fn test_refine_replaces_only_selected_rows() {
        let oracle = Arc::new(ScriptedOracle::replies([r#"[["Color", "Red", "Blue"]]"#]));
        let refined = Refiner::new(oracle.clone())
            .refine(
                &[row(&["Colour", "Red", ""])],
                &[
                    ChatMessage::user("ignore this"),
                    ChatMessage::user("use US spelling and add Blue"),
                ],
                table(),
            )
            .await
            .unwrap();

        assert_eq!(
            refined.rows(),
            [
                row(&["Memory", "4GB", "8GB"]),
                row(&["Color", "Red", "Blue"]),
                row(&["Weight", "2kg"]),
            ]
        );

        let prompt = &oracle.prompts()[0];
        assert!(prompt.contains(r#"[["Colour","Red"]]"#));
        assert!(prompt.contains("use US spelling and add Blue"));
        assert!(!prompt.contains("ignore this"));
    }

    #[tokio::test]
    async fn test_fewer_refined_rows_leaves_rest() {
        let oracle = Arc::new(ScriptedOracle::replies([
            "Sure! Here you go:\n[[\"Mass\", \"2 kg\"]]\nLet me know if you need more.",
        ]));
        let refined = Refiner::new(oracle)
            .refine(
                &[row(&["Weight", "2kg"]), row(&["Memory", "4GB", "8GB"])],
                &[ChatMessage::user("rename weight")],
                table(),
            )
            .await
            .unwrap();

        assert_eq!(refined.rows()[2], row(&["Mass", "2 kg"]));
        assert_eq!(refined.rows()[0], row(&["Memory", "4GB", "8GB"]));
        assert_eq!(refined.len(), 3);
    }

    #[tokio::test]
    async fn test_line_fallback() {
        let oracle = Arc::new(ScriptedOracle::replies(["Colour = Crimson"]));
        let refined = Refiner::new(oracle)
            .refine(
                &[row(&["Colour", "Red"])],
                &[ChatMessage::user("be precise")],
                table(),
            )
            .await
            .unwrap();
        assert_eq!(refined.rows()[1], row(&["Colour", "Crimson"]));
    }

    #[tokio::test]
    async fn test_empty_inputs_are_rejected() {
        let oracle = Arc::new(ScriptedOracle::replies(["[]"]));
        let refiner = Refiner::new(oracle.clone());

        let err = refiner
            .refine(&[], &[ChatMessage::user("x")], table())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Input { .. }));

        let err = refiner
            .refine(&[row(&["Colour", "Red"])], &[], table())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Input { .. }));
        assert!(oracle.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_oracle_failure_is_returned() {
        let oracle = Arc::new(ScriptedOracle::new([Err(GenerationError::Request(
            "connection refused".into(),
        ))]));
        let err = Refiner::new(oracle)
            .refine(&[row(&["Colour", "Red"])], &[ChatMessage::user("x")], table())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Generation(_)));
    }

    #[test]
    fn test_parse_refined_rows_stringifies_scalars() {
        let rows = parse_refined_rows(r#"[["Voltage", 220, null, ""], ["Portable", true]]"#);
        assert_eq!(
            rows,
            [Some(row(&["Voltage", "220"])), Some(row(&["Portable", "true"]))]
        );
    }

    #[test]
    fn test_parse_skips_bracketed_commentary() {
        let rows = parse_refined_rows("Note: [see below]\n[[\"Colour\", \"Crimson\"]]");
        assert_eq!(rows, [Some(row(&["Colour", "Crimson"]))]);

        let rows = parse_refined_rows("Rows [1] and [2]:\n[[\"Colour\", \"Crimson\"]] [done]");
        assert_eq!(rows, [Some(row(&["Colour", "Crimson"]))]);
    }

    #[tokio::test]
    async fn test_empty_refined_row_keeps_alignment() {
        let table = ConsolidatedTable::new(vec![
            row(&["Memory", "4GB", "8GB"]),
            row(&["Colour", "Red"]),
        ]);
        let oracle = Arc::new(ScriptedOracle::replies([r#"[[], ["Memory","16GB"]]"#]));
        let refined = Refiner::new(oracle)
            .refine(
                &[row(&["Colour", "Red"]), row(&["Memory", "4GB", "8GB"])],
                &[ChatMessage::user("only 16GB exists")],
                table,
            )
            .await
            .unwrap();

        assert_eq!(
            refined.rows(),
            [row(&["Memory", "16GB"]), row(&["Colour", "Red"])]
        );
    }

    #[test]
    fn test_unselected_rows_survive_any_merge() {
        let original = table();
        let merged = merge_refined(
            original.clone(),
            &[row(&["Missing", "x"]), row(&["Memory", "4GB", "8GB"])],
            &[Some(row(&["A", "1"])), Some(row(&["B", "2"])), None],
        );
        assert_eq!(merged.rows()[0], row(&["B", "2"]));
        assert_eq!(merged.rows()[1..], original.rows()[1..]);
    }

    #[test]
    fn test_request_shape() {
        let json = r#"{
            "selectedRows": [["Colour", "Red", ""]],
            "chatHistory": [{"role": "user", "content": "fix spelling"}],
            "fullTable": [["Memory", "4GB", "8GB"], ["Colour", "Red", ""]]
        }"#;
        let request: RefinementRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.selected_rows, [row(&["Colour", "Red"])]);
        assert_eq!(request.chat_history[0].content, "fix spelling");
        assert_eq!(request.full_table.len(), 2);
    }
}
