//! Accumulated substring search over a table's columns.

use serde::{Deserialize, Serialize};

/// Column name → pattern, in the order columns were first added.
/// Each entry becomes `column LIKE '%pattern%'` (case-sensitive), all entries ANDed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    entries: Vec<(String, String)>,
}

impl SearchFilter {
    pub fn new() -> Self {
        SearchFilter::default()
    }

    /// Add or replace the pattern for `column`. A replaced column keeps its original position.
    pub fn set(&mut self, column: impl Into<String>, pattern: impl Into<String>) {
        let column = column.into();
        let pattern = pattern.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = pattern,
            None => self.entries.push((column, pattern)),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries.iter().find(|(c, _)| c == column).map(|(_, p)| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, p)| (c.as_str(), p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_merges_and_keeps_order() {
        let mut f = SearchFilter::new();
        f.set("name", "ali");
        f.set("city", "par");
        f.set("name", "bob");
        let entries: Vec<_> = f.iter().collect();
        assert_eq!(entries, vec![("name", "bob"), ("city", "par")]);
        f.clear();
        assert!(f.is_empty());
    }
}
