//! Insertion-ordered attribute -> distinct values mapping.

use std::collections::HashMap;

/// One attribute and its distinct values, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    pub name: String,
    pub values: Vec<String>,
}

/// Attribute name -> set of distinct values.
///
/// Owned by a single extraction run. Attributes and values keep the order they were first
/// inserted in so the assembled table is stable for a given input.
#[derive(Debug, Clone, Default)]
pub struct AttributeBucket {
    entries: Vec<AttributeEntry>,
    index: HashMap<String, usize>,
}

impl AttributeBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` under `name`. Returns false if the exact value was already present.
    pub fn insert(&mut self, name: &str, value: &str) -> bool {
        let entry = self.entry_mut(name);
        if entry.values.iter().any(|v| v == value) {
            return false;
        }
        entry.values.push(value.to_string());
        true
    }

    /// Union `values` into the set for `name`, creating the attribute if needed.
    pub fn extend<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entry_mut(name);
        for value in values {
            self.insert(name, value.as_ref());
        }
    }

    /// Values recorded for `name`, if the attribute exists.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest number of values held by any attribute (0 when empty).
    pub fn max_values(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.values.len())
            .max()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<AttributeEntry> {
        self.entries
    }

    fn entry_mut(&mut self, name: &str) -> &mut AttributeEntry {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.entries.push(AttributeEntry {
                    name: name.to_string(),
                    values: Vec::new(),
                });
                let i = self.entries.len() - 1;
                self.index.insert(name.to_string(), i);
                i
            }
        };
        &mut self.entries[i]
    }
}

impl PartialEq for AttributeBucket {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for AttributeBucket {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_distinct() {
        let mut bucket = AttributeBucket::new();
        assert!(bucket.insert("Color", "Red"));
        assert!(!bucket.insert("Color", "Red"));
        assert!(bucket.insert("Color", "red"));
        assert_eq!(bucket.get("Color").unwrap(), ["Red", "red"]);
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut bucket = AttributeBucket::new();
        bucket.extend("Memory", ["8GB", "4GB"]);
        bucket.extend("Color", ["Red"]);
        bucket.extend("Memory", ["4GB", "16GB"]);

        let names: Vec<_> = bucket.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Memory", "Color"]);
        assert_eq!(bucket.get("Memory").unwrap(), ["8GB", "4GB", "16GB"]);
        assert_eq!(bucket.max_values(), 3);
    }

    #[test]
    fn test_extend_with_no_values_creates_attribute() {
        let mut bucket = AttributeBucket::new();
        bucket.extend("Weight", Vec::<String>::new());
        assert!(bucket.contains("Weight"));
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.max_values(), 0);
        assert_eq!(AttributeBucket::new().max_values(), 0);
    }
}
