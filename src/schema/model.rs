//! Introspected table model: what the engine knows about a table for one operation.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    /// Position in the engine's native column order.
    pub cid: i64,
    pub name: String,
    /// Declared type as written in the table definition (`TEXT`, `INTEGER`, `DATETIME`, ...).
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    /// Declared default as SQL text, e.g. `CURRENT_TIMESTAMP` or `'draft'`.
    pub default_value: Option<String>,
    /// Current autoincrement counter; `None` when the column is not backed by a sequence.
    pub autoincrement_seq: Option<i64>,
}

impl Column {
    pub fn is_autoincrement(&self) -> bool {
        self.autoincrement_seq.is_some()
    }

    /// Default is the server's current time (rendered read-only on forms).
    pub fn defaults_to_current_timestamp(&self) -> bool {
        self.default_value
            .as_deref()
            .map(|d| d.trim().eq_ignore_ascii_case("CURRENT_TIMESTAMP"))
            .unwrap_or(false)
    }
}

/// An index and the columns it covers, in index order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Flattened index columns, in index creation order, duplicates kept.
    pub indexed: Vec<String>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The table's primary-key column when the key is a single column.
    /// Composite keys return `None`: their rows cannot be addressed by one value.
    pub fn primary_key(&self) -> Option<&Column> {
        let mut pks = self.columns.iter().filter(|c| c.primary_key);
        match (pks.next(), pks.next()) {
            (Some(pk), None) => Some(pk),
            _ => None,
        }
    }

    pub fn is_indexed(&self, column: &str) -> bool {
        self.indexed.iter().any(|c| c == column)
    }
}

/// Row of `sqlite_sequence`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sequence {
    pub name: String,
    pub seq: i64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn column(cid: i64, name: &str, declared_type: &str) -> Column {
        Column {
            cid,
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            not_null: false,
            primary_key: false,
            default_value: None,
            autoincrement_seq: None,
        }
    }

    /// `people(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, created DATETIME DEFAULT CURRENT_TIMESTAMP)`
    pub fn people() -> Table {
        let mut id = column(0, "id", "INTEGER");
        id.primary_key = true;
        id.not_null = true;
        id.autoincrement_seq = Some(0);
        let mut name = column(1, "name", "TEXT");
        name.not_null = true;
        let mut created = column(2, "created", "DATETIME");
        created.default_value = Some("CURRENT_TIMESTAMP".into());
        Table {
            name: "people".into(),
            columns: vec![id, name, created],
            indexed: vec!["name".into()],
        }
    }
}
