//! Per-client state carried between requests, with its lifecycle rules as methods.

use crate::sql::{SearchFilter, SqlValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque token → primary-key value for the rows of the last listing render.
/// A render builds a new set and replaces the previous one wholesale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RowTokens {
    table: Option<String>,
    pk_column: Option<String>,
    pk_type: Option<String>,
    keys: HashMap<String, SqlValue>,
}

/// A token resolved against the table it was minted for.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedKey<'a> {
    pub value: &'a SqlValue,
    pub pk_column: &'a str,
    pub pk_type: Option<&'a str>,
}

impl RowTokens {
    /// Empty set for one listing of `table` keyed by `pk_column` of declared type `pk_type`.
    pub fn for_table(table: impl Into<String>, pk_column: impl Into<String>, pk_type: impl Into<String>) -> Self {
        RowTokens {
            table: Some(table.into()),
            pk_column: Some(pk_column.into()),
            pk_type: Some(pk_type.into()),
            keys: HashMap::new(),
        }
    }

    /// Record `value` under a fresh random token and return the token.
    pub fn mint(&mut self, value: SqlValue) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.keys.insert(token.clone(), value);
        token
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key behind `token`, only if the token was minted for `table`.
    pub fn resolve(&self, table: &str, token: &str) -> Option<ResolvedKey<'_>> {
        if self.table.as_deref() != Some(table) {
            return None;
        }
        let value = self.keys.get(token)?;
        Some(ResolvedKey {
            value,
            pk_column: self.pk_column.as_deref()?,
            pk_type: self.pk_type.as_deref().filter(|t| !t.is_empty()),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    database: Option<String>,
    table: Option<String>,
    search: SearchFilter,
    tokens: RowTokens,
    message: Option<String>,
}

impl SessionState {
    pub fn new(database: impl Into<String>) -> Self {
        SessionState {
            database: Some(database.into()),
            ..SessionState::default()
        }
    }

    /// Start over when the session was created against another database. Returns true on reset.
    pub fn reset_if_database_changed(&mut self, database: &str) -> bool {
        if self.database.as_deref() == Some(database) {
            return false;
        }
        *self = SessionState::new(database);
        true
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn selected_table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Replace the selection; search filters and row tokens belong to the old one and are dropped.
    pub fn select_table(&mut self, table: Option<String>) {
        self.table = table;
        self.search.clear();
        self.tokens = RowTokens::default();
    }

    pub fn search(&self) -> &SearchFilter {
        &self.search
    }

    pub fn add_search(&mut self, column: impl Into<String>, pattern: impl Into<String>) {
        self.search.set(column, pattern);
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    pub fn tokens(&self) -> &RowTokens {
        &self.tokens
    }

    pub fn replace_tokens(&mut self, tokens: RowTokens) {
        self.tokens = tokens;
    }

    /// Key behind `token` for the selected table.
    pub fn resolve_token(&self, token: &str) -> Option<ResolvedKey<'_>> {
        let table = self.table.as_deref()?;
        self.tokens.resolve(table, token)
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// One-shot read: returns the message and clears it.
    pub fn take_message(&mut self) -> Option<String> {
        self.message.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(state: &mut SessionState, ids: &[i64]) -> Vec<String> {
        let mut tokens = RowTokens::for_table("people", "id", "INTEGER");
        let minted = ids.iter().map(|id| tokens.mint(SqlValue::Integer(*id))).collect();
        state.replace_tokens(tokens);
        minted
    }

    #[test]
    fn tokens_resolve_until_next_render() {
        let mut s = SessionState::new("sample.db");
        s.select_table(Some("people".into()));
        let first = listed(&mut s, &[1, 2]);
        let key = s.resolve_token(&first[1]).unwrap();
        assert_eq!(key.value, &SqlValue::Integer(2));
        assert_eq!(key.pk_column, "id");
        assert_eq!(key.pk_type, Some("INTEGER"));

        let second = listed(&mut s, &[1, 2]);
        assert!(s.resolve_token(&first[0]).is_none());
        assert!(s.resolve_token(&first[1]).is_none());
        assert!(s.resolve_token(&second[0]).is_some());
        assert_ne!(first[0], second[0]);
    }

    #[test]
    fn tokens_do_not_cross_tables() {
        let mut s = SessionState::new("sample.db");
        s.select_table(Some("people".into()));
        let minted = listed(&mut s, &[1]);
        s.select_table(Some("orders".into()));
        assert!(s.resolve_token(&minted[0]).is_none());
        assert!(s.tokens().is_empty());
    }

    #[test]
    fn selecting_a_table_clears_search() {
        let mut s = SessionState::new("sample.db");
        s.select_table(Some("people".into()));
        s.add_search("name", "ali");
        s.select_table(Some("people".into()));
        assert!(s.search().is_empty());
    }

    #[test]
    fn message_is_read_once() {
        let mut s = SessionState::new("sample.db");
        s.set_message("Successfully saved entry.");
        assert_eq!(s.take_message().as_deref(), Some("Successfully saved entry."));
        assert_eq!(s.take_message(), None);
    }

    #[test]
    fn database_change_resets_everything() {
        let mut s = SessionState::new("a.db");
        s.select_table(Some("people".into()));
        s.set_message("hello");
        assert!(!s.reset_if_database_changed("a.db"));
        assert_eq!(s.selected_table(), Some("people"));
        assert!(s.reset_if_database_changed("b.db"));
        assert_eq!(s.selected_table(), None);
        assert_eq!(s.message(), None);
        assert_eq!(s.database(), Some("b.db"));
    }

    #[test]
    fn fresh_default_state_is_reset_on_first_use() {
        let mut s = SessionState::default();
        assert!(s.reset_if_database_changed("sample.db"));
    }
}
