//! What a non-mutating request renders: the table listing and the create/modify forms.

use crate::controller::{field_name, null_flag_name};
use crate::schema::{Column, Table};
use crate::service::Row;
use crate::sql::{SqlValue, AUTO_INCREMENT, CURRENT_TIMESTAMP};
use serde::Serialize;

/// Where the client is in the select → list/search → create/modify → save/remove cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "token", rename_all = "snake_case")]
pub enum ViewState {
    NoTableSelected,
    Listing,
    /// Listing with search filters applied.
    Searching,
    Creating,
    Modifying(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Zero-based page index being shown.
    pub page: u32,
    pub pages: u64,
    pub total: u64,
    pub page_size: u32,
    /// First and last 1-based page numbers offered as direct links.
    pub window_start: u64,
    pub window_end: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(total: u64, page: u32, page_size: u32) -> Self {
        let size = page_size.max(1) as u64;
        let pages = total.div_ceil(size).max(1);
        let current = page as u64;
        let window_start = if current >= 5 { current - 3 } else { 1 };
        let window_end = (current + 5).min(pages);
        Pagination {
            page,
            pages,
            total,
            page_size,
            window_start,
            window_end,
            has_previous: current >= 1,
            has_next: current + 1 < pages,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ColumnView {
    pub name: String,
    pub declared_type: String,
    pub primary_key: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct RowView {
    /// Present only for rows addressable by a single-column primary key.
    pub token: Option<String>,
    pub cells: Vec<SqlValue>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchLabel {
    pub column: String,
    pub pattern: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TableListing {
    pub table: String,
    pub columns: Vec<ColumnView>,
    pub rows: Vec<RowView>,
    pub pagination: Pagination,
    pub search: Vec<SearchLabel>,
    /// Choices for the search column selector.
    pub indexed: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ListingView {
    #[serde(flatten)]
    pub state: ViewState,
    pub tables: Vec<String>,
    pub selected: Option<String>,
    pub message: Option<String>,
    pub listing: Option<TableListing>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FormField {
    pub column: String,
    /// Form input name carrying the value.
    pub input: String,
    /// Companion checkbox that forces NULL; absent for NOT NULL columns.
    pub null_flag: Option<String>,
    pub declared_type: String,
    pub value: String,
    pub readonly: bool,
    pub required: bool,
    pub nullable: bool,
    pub primary_key: bool,
    /// Long text gets a multi-line editor.
    pub multiline: bool,
    /// Offer a date-time picker.
    pub datetime: bool,
}

impl FormField {
    fn new(column: &Column, existing: Option<&SqlValue>) -> Self {
        let value = match existing {
            Some(v) => v.display(),
            None if column.is_autoincrement() => AUTO_INCREMENT.to_string(),
            None => column.default_value.as_deref().map(unquote).unwrap_or_default(),
        };
        let readonly = column.is_autoincrement() || value == CURRENT_TIMESTAMP;
        let declared = column.declared_type.to_ascii_uppercase();
        FormField {
            column: column.name.clone(),
            input: field_name(&column.name),
            null_flag: (!column.not_null).then(|| null_flag_name(&column.name)),
            declared_type: column.declared_type.clone(),
            datetime: declared == "DATETIME" && value != CURRENT_TIMESTAMP,
            multiline: declared == "TEXT",
            value,
            readonly,
            required: column.not_null,
            nullable: !column.not_null,
            primary_key: column.primary_key,
        }
    }
}

/// Declared defaults are SQL text; string literals lose their quotes for display.
fn unquote(default: &str) -> String {
    let d = default.trim();
    match d.strip_prefix('\'').and_then(|d| d.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => d.to_string(),
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FormView {
    #[serde(flatten)]
    pub state: ViewState,
    pub table: String,
    /// Value to echo back in the `action-flow` field on save.
    pub action_flow: String,
    pub fields: Vec<FormField>,
}

impl FormView {
    /// Empty form prefilled with column defaults.
    pub fn create(table: &Table) -> Self {
        FormView {
            state: ViewState::Creating,
            table: table.name.clone(),
            action_flow: "create".to_string(),
            fields: table.columns.iter().map(|c| FormField::new(c, None)).collect(),
        }
    }

    /// Form prefilled from an existing row.
    pub fn modify(table: &Table, token: &str, row: &Row) -> Self {
        FormView {
            state: ViewState::Modifying(token.to_string()),
            table: table.name.clone(),
            action_flow: format!("modify-{}", token),
            fields: table
                .columns
                .iter()
                .map(|c| FormField::new(c, Some(row.get(&c.name).unwrap_or(&SqlValue::Null))))
                .collect(),
        }
    }
}
