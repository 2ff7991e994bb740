//! Action keys and the submitted form they arrive in.

use crate::sql::{FieldValue, SET_NULL};
use std::collections::HashMap;

pub const ACTION_FIELD: &str = "action";
pub const ACTION_FLOW_FIELD: &str = "action-flow";
pub const SEARCH_COLUMN_FIELD: &str = "search-column";
pub const SEARCH_VALUE_FIELD: &str = "search-value";

const FIELD_PREFIX: &str = "_";
const NULL_SUFFIX: &str = "-null";

/// Form input carrying the value for `column`.
pub fn field_name(column: &str) -> String {
    format!("{}{}", FIELD_PREFIX, column)
}

/// Companion checkbox that forces `column` to NULL.
pub fn null_flag_name(column: &str) -> String {
    format!("{}{}{}", FIELD_PREFIX, column, NULL_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// `list-<table>`
    List(String),
    SearchAdd,
    SearchClear,
    /// `remove-<token>`
    Remove(String),
    Save,
    Create,
    /// `modify-<token>`
    Modify(String),
}

impl Action {
    /// Dispatch by prefix; anything else is not an action.
    pub fn parse(key: &str) -> Option<Action> {
        if let Some(table) = key.strip_prefix("list-") {
            return Some(Action::List(table.to_string()));
        }
        if key.starts_with("search-add") {
            return Some(Action::SearchAdd);
        }
        if key.starts_with("search-clear") {
            return Some(Action::SearchClear);
        }
        if key.starts_with("save") {
            return Some(Action::Save);
        }
        if let Some(token) = key.strip_prefix("remove-") {
            return Some(Action::Remove(token.to_string()));
        }
        if key.starts_with("create") {
            return Some(Action::Create);
        }
        if let Some(token) = key.strip_prefix("modify-") {
            return Some(Action::Modify(token.to_string()));
        }
        None
    }
}

/// What a `save` completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionFlow {
    Create,
    Modify(String),
}

impl ActionFlow {
    pub fn parse(flow: &str) -> Option<ActionFlow> {
        if flow == "create" {
            return Some(ActionFlow::Create);
        }
        flow.strip_prefix("modify-")
            .filter(|t| !t.is_empty())
            .map(|t| ActionFlow::Modify(t.to_string()))
    }
}

/// One submitted form, keyed by input name.
#[derive(Clone, Debug, Default)]
pub struct ActionForm {
    fields: HashMap<String, String>,
}

impl From<HashMap<String, String>> for ActionForm {
    fn from(fields: HashMap<String, String>) -> Self {
        ActionForm { fields }
    }
}

impl ActionForm {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn action(&self) -> Option<Action> {
        self.get(ACTION_FIELD).and_then(Action::parse)
    }

    pub fn action_flow(&self) -> Option<ActionFlow> {
        self.get(ACTION_FLOW_FIELD).and_then(ActionFlow::parse)
    }

    pub fn search(&self) -> Option<(&str, &str)> {
        Some((self.get(SEARCH_COLUMN_FIELD)?, self.get(SEARCH_VALUE_FIELD).unwrap_or("")))
    }

    /// Decoded value for `column`, or `None` when the form carries neither its input nor its null flag.
    pub fn column_value(&self, column: &str) -> Option<FieldValue> {
        let text = self.get(&field_name(column));
        let null_flag = self.get(&null_flag_name(column)) == Some(SET_NULL);
        if text.is_none() && !null_flag {
            return None;
        }
        Some(FieldValue::from_form_text(text.unwrap_or(""), null_flag))
    }
}
