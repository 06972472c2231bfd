//! Parsing of free-text oracle responses into attribute/value pairs.
//!
//! Oracle output is not contractually formatted, so nothing here fails: lines that do not
//! look like `attribute : value` or `attribute = value` are dropped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// `<left> <sep> <right>` where the separator is the first `:` or `=`.
static PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:=]+?)\s*[:=]\s*(.+)$").expect("static pattern compiles")
});

/// How a response is cut into candidate lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// One candidate per line. Used for per-row responses.
    #[default]
    Lines,
    /// Candidates delimited by newline or semicolon. Used for dense document-chunk responses.
    Segments,
}

/// One parsed `attribute = values` line, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPair {
    pub attribute: String,
    pub values: Vec<String>,
}

/// Parse a response into ordered pairs, one per matching line.
pub fn parse_pairs(text: &str, mode: SplitMode) -> Vec<ParsedPair> {
    let candidates: Box<dyn Iterator<Item = &str>> = match mode {
        SplitMode::Lines => Box::new(text.lines()),
        SplitMode::Segments => Box::new(text.split(['\n', ';'])),
    };

    candidates.filter_map(parse_line).collect()
}

/// Parse a response into a mapping of raw attribute name to its values.
///
/// Repeated attributes accumulate their values in order of appearance.
pub fn parse_attributes(text: &str, mode: SplitMode) -> HashMap<String, Vec<String>> {
    let mut attributes: HashMap<String, Vec<String>> = HashMap::new();
    for pair in parse_pairs(text, mode) {
        attributes
            .entry(pair.attribute)
            .or_default()
            .extend(pair.values);
    }
    attributes
}

fn parse_line(line: &str) -> Option<ParsedPair> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(caps) = PAIR.captures(line) else {
        tracing::trace!(line, "Dropping line without attribute separator");
        return None;
    };

    let attribute = caps[1].trim();
    let values = split_values(&caps[2]);
    if attribute.is_empty() || values.is_empty() {
        tracing::trace!(line, "Dropping line with empty attribute or value");
        return None;
    }

    Some(ParsedPair {
        attribute: attribute.to_string(),
        values,
    })
}

/// Split a right-hand side on `,` `;` `|`, trimming and dropping empty pieces.
pub fn split_values(right: &str) -> Vec<String> {
    right
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
