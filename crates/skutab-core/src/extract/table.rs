//! Fixed-width attribute table.
//!
//! Rows are stored unpadded (attribute + its values). The padding rule is applied whenever the
//! table is rendered: every row gets `1 + width` cells where `width` is the largest value count
//! in the table, and missing cells are `""`. An empty table still renders one value column.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::bucket::AttributeBucket;

/// One attribute and its values, without padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRow {
    pub attribute: String,
    pub values: Vec<String>,
}

impl AttributeRow {
    pub fn new(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            attribute: attribute.into(),
            values,
        }
    }

    /// Build a row from rendered cells `[attribute, value1, ...]`.
    ///
    /// Trailing empty cells are padding and are dropped, so a row read back from a rendered
    /// table compares equal to the row it was rendered from. Returns `None` for an empty slice.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Option<Self> {
        let (attribute, rest) = cells.split_first()?;
        let mut values: Vec<String> = rest.iter().map(|c| c.as_ref().to_string()).collect();
        while values.last().is_some_and(|v| v.is_empty()) {
            values.pop();
        }
        Some(Self::new(attribute.as_ref(), values))
    }

    /// Render as `[attribute, values..., "" * padding]` with exactly `1 + width` cells.
    ///
    /// Rows wider than `width` are rendered in full.
    pub fn to_cells(&self, width: usize) -> Vec<String> {
        let mut cells = Vec::with_capacity(1 + width.max(self.values.len()));
        cells.push(self.attribute.clone());
        cells.extend(self.values.iter().cloned());
        cells.resize(1 + width.max(self.values.len()), String::new());
        cells
    }
}

impl Serialize for AttributeRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_cells(self.values.len()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttributeRow {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cells = Vec::<String>::deserialize(deserializer)?;
        AttributeRow::from_cells(&cells)
            .ok_or_else(|| serde::de::Error::custom("row must have at least an attribute cell"))
    }
}

/// Ordered rows with unique attribute names, rendered at a common width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidatedTable {
    rows: Vec<AttributeRow>,
}

impl ConsolidatedTable {
    pub fn new(rows: Vec<AttributeRow>) -> Self {
        Self { rows }
    }

    /// Assemble a table from a consolidated bucket, one row per attribute in insertion order.
    pub fn from_bucket(bucket: AttributeBucket) -> Self {
        let rows = bucket
            .into_entries()
            .into_iter()
            .map(|e| AttributeRow::new(e.name, e.values))
            .collect();
        Self { rows }
    }

    /// Build a table from rendered rows, ignoring empty ones.
    pub fn from_cells<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        Self {
            rows: rows
                .iter()
                .filter_map(|r| AttributeRow::from_cells(r))
                .collect(),
        }
    }

    /// Largest value count across rows (0 for an empty table).
    pub fn max_values(&self) -> usize {
        self.rows.iter().map(|r| r.values.len()).max().unwrap_or(0)
    }

    /// Number of rendered value columns: `max_values`, but at least one.
    pub fn width(&self) -> usize {
        if self.rows.is_empty() {
            1
        } else {
            self.max_values()
        }
    }

    /// `["Attribute", "Value1", ..., "ValueN"]`.
    pub fn columns(&self) -> Vec<String> {
        std::iter::once("Attribute".to_string())
            .chain((1..=self.width()).map(|i| format!("Value{}", i)))
            .collect()
    }

    /// Every row padded to `1 + width` cells.
    pub fn padded_rows(&self) -> Vec<Vec<String>> {
        let width = self.width();
        self.rows.iter().map(|r| r.to_cells(width)).collect()
    }

    pub fn rows(&self) -> &[AttributeRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [AttributeRow] {
        &mut self.rows
    }

    /// Index of the first row equal to `row`.
    pub fn position(&self, row: &AttributeRow) -> Option<usize> {
        self.rows.iter().position(|r| r == row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<AttributeRow> {
        self.rows
    }
}

impl Serialize for ConsolidatedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ConsolidatedTable", 2)?;
        state.serialize_field("columns", &self.columns())?;
        state.serialize_field("rows", &self.padded_rows())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ConsolidatedTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Rendered {
            rows: Vec<Vec<String>>,
        }
        let rendered = Rendered::deserialize(deserializer)?;
        Ok(ConsolidatedTable::from_cells(&rendered.rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_assemble_pads_to_common_width() {
        let mut bucket = AttributeBucket::new();
        bucket.extend("Memory", ["4GB", "8GB"]);
        bucket.extend("Color", ["Red"]);
        let table = ConsolidatedTable::from_bucket(bucket);

        assert_eq!(table.columns(), ["Attribute", "Value1", "Value2"]);
        assert_eq!(
            table.padded_rows(),
            vec![strings(&["Memory", "4GB", "8GB"]), strings(&["Color", "Red", ""])]
        );
        for row in table.padded_rows() {
            assert_eq!(row.len(), 1 + table.max_values());
        }
    }

    #[test]
    fn test_empty_table_has_one_value_column() {
        let table = ConsolidatedTable::from_bucket(AttributeBucket::new());
        assert_eq!(table.columns(), ["Attribute", "Value1"]);
        assert!(table.padded_rows().is_empty());
        assert_eq!(table.max_values(), 0);
    }

    #[test]
    fn test_attribute_without_values() {
        let mut bucket = AttributeBucket::new();
        bucket.extend("Weight", Vec::<String>::new());
        let table = ConsolidatedTable::from_bucket(bucket);
        assert_eq!(table.max_values(), 0);
        assert_eq!(table.columns(), ["Attribute"]);
        assert_eq!(table.padded_rows(), vec![strings(&["Weight"])]);
    }

    #[test]
    fn test_row_from_cells_drops_padding() {
        let row = AttributeRow::from_cells(&["Color", "Red", "", ""]).unwrap();
        assert_eq!(row, AttributeRow::new("Color", strings(&["Red"])));
        // Interior empty cells are kept.
        let row = AttributeRow::from_cells(&["Size", "", "M"]).unwrap();
        assert_eq!(row.values, strings(&["", "M"]));
        assert!(AttributeRow::from_cells::<&str>(&[]).is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let table = ConsolidatedTable::new(vec![
            AttributeRow::new("Memory", strings(&["4GB", "8GB"])),
            AttributeRow::new("Color", strings(&["Red"])),
        ]);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "columns": ["Attribute", "Value1", "Value2"],
                "rows": [["Memory", "4GB", "8GB"], ["Color", "Red", ""]]
            })
        );

        let back: ConsolidatedTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
