//! Action dispatch over per-request session state.

use super::action::{Action, ActionFlow, ActionForm};
use crate::error::AppError;
use crate::schema::Table;
use crate::service::Dao;
use crate::session::{RowTokens, SessionState};
use crate::sql::SqlValue;
use crate::view::{ColumnView, FormView, ListingView, Pagination, RowView, SearchLabel, TableListing, ViewState};

pub const SAVE_OK: &str = "Successfully saved entry.";
pub const REMOVE_OK: &str = "Successfully removed entry.";
pub const SAVE_FAILED: &str = "Failed to save data.";
pub const REMOVE_FAILED: &str = "Failed to remove data.";

/// What the caller answers with after dispatch.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Send the client back to the listing.
    Redirect,
    Form(FormView),
}

#[derive(Clone, Debug)]
pub struct Controller {
    dao: Dao,
    hide_primary_key: bool,
}

impl Controller {
    pub fn new(dao: Dao, hide_primary_key: bool) -> Self {
        Controller { dao, hide_primary_key }
    }

    /// Run one submitted action against `session`. Every failure becomes a one-shot message.
    pub async fn dispatch(&self, session: &mut SessionState, form: &ActionForm) -> Outcome {
        let Some(action) = form.action() else {
            tracing::debug!(action = ?form.get(super::ACTION_FIELD), "ignoring unrecognised action");
            return Outcome::Redirect;
        };
        tracing::info!(?action, table = ?session.selected_table(), "dispatch");
        match action {
            Action::List(name) => {
                self.select(session, &name).await;
                Outcome::Redirect
            }
            Action::SearchAdd => {
                if let Err(e) = self.search_add(session, form).await {
                    session.set_message(e.to_string());
                }
                Outcome::Redirect
            }
            Action::SearchClear => {
                session.clear_search();
                Outcome::Redirect
            }
            Action::Remove(token) => {
                let message = match self.remove(session, &token).await {
                    Ok(()) => REMOVE_OK.to_string(),
                    Err(e) => {
                        tracing::warn!(error = %e, "remove failed");
                        format!("{} {}", REMOVE_FAILED, e)
                    }
                };
                session.set_message(message);
                Outcome::Redirect
            }
            Action::Save => {
                let message = match self.save(session, form).await {
                    Ok(()) => SAVE_OK.to_string(),
                    Err(e) => {
                        tracing::warn!(error = %e, "save failed");
                        format!("{} {}", SAVE_FAILED, e)
                    }
                };
                session.set_message(message);
                Outcome::Redirect
            }
            Action::Create => match self.selected(session).await {
                Ok(table) => Outcome::Form(FormView::create(&table)),
                Err(e) => {
                    session.set_message(e.to_string());
                    Outcome::Redirect
                }
            },
            Action::Modify(token) => match self.modify_form(session, &token).await {
                Ok(form) => Outcome::Form(form),
                Err(e) => {
                    session.set_message(e.to_string());
                    Outcome::Redirect
                }
            },
        }
    }

    async fn select(&self, session: &mut SessionState, name: &str) {
        match self.dao.table_names().await {
            Ok(names) => {
                let matched = names.into_iter().find(|n| n == name);
                if matched.is_none() {
                    session.set_message(format!("Unknown table '{}'.", name));
                }
                session.select_table(matched);
            }
            Err(e) => {
                tracing::warn!(error = %e, "listing tables failed");
                session.select_table(None);
                session.set_message(format!("Failed to load tables. {}", e));
            }
        }
    }

    /// The selected table's current schema. A table dropped since selection clears the selection.
    async fn selected(&self, session: &mut SessionState) -> Result<Table, AppError> {
        let name = session
            .selected_table()
            .ok_or_else(|| AppError::Validation("no table selected".into()))?
            .to_string();
        match self.dao.table(&name).await? {
            Some(table) => Ok(table),
            None => {
                session.select_table(None);
                Err(AppError::NotFound(format!("table {}", name)))
            }
        }
    }

    async fn search_add(&self, session: &mut SessionState, form: &ActionForm) -> Result<(), AppError> {
        let table = self.selected(session).await?;
        let (column, pattern) = form
            .search()
            .ok_or_else(|| AppError::BadRequest("missing search column".into()))?;
        if !table.is_indexed(column) {
            return Err(AppError::Validation(format!("column {} is not searchable", column)));
        }
        session.add_search(column, pattern);
        Ok(())
    }

    async fn remove(&self, session: &mut SessionState, token: &str) -> Result<(), AppError> {
        let table = self.selected(session).await?;
        let key = session.resolve_token(token).ok_or_else(stale_token)?;
        let removed = self.dao.remove(&table, key.value, key.pk_column, key.pk_type).await?;
        if removed == 0 {
            return Err(AppError::NotFound("entry no longer exists".into()));
        }
        Ok(())
    }

    async fn save(&self, session: &mut SessionState, form: &ActionForm) -> Result<(), AppError> {
        let flow = form
            .action_flow()
            .ok_or_else(|| AppError::Validation("invalid flow, error processing request".into()))?;
        let table = self.selected(session).await?;
        let values: Vec<_> = table
            .columns
            .iter()
            .filter_map(|c| form.column_value(&c.name).map(|v| (c.name.clone(), v)))
            .collect();
        match flow {
            ActionFlow::Create => {
                let rowid = self.dao.insert(&table, &values).await?;
                tracing::info!(table = %table.name, rowid, "created");
            }
            ActionFlow::Modify(token) => {
                let key = session.resolve_token(&token).ok_or_else(stale_token)?;
                let changed = self
                    .dao
                    .update(&table, &values, key.value, key.pk_column, key.pk_type)
                    .await?;
                if changed == 0 {
                    return Err(AppError::NotFound("entry no longer exists".into()));
                }
            }
        }
        Ok(())
    }

    async fn modify_form(&self, session: &mut SessionState, token: &str) -> Result<FormView, AppError> {
        let table = self.selected(session).await?;
        let key = session.resolve_token(token).ok_or_else(stale_token)?;
        let row = self
            .dao
            .get(&table, key.value, key.pk_column, key.pk_type)
            .await?
            .ok_or_else(|| AppError::NotFound("entry no longer exists".into()))?;
        Ok(FormView::modify(&table, token, &row))
    }

    /// Build the listing for zero-based `page`, mint row tokens for it and consume the message.
    pub async fn render(&self, session: &mut SessionState, page: u32) -> Result<ListingView, AppError> {
        let tables = self.dao.table_names().await?;
        let table = match session.selected_table() {
            Some(name) => {
                let name = name.to_string();
                let table = self.dao.table(&name).await?;
                if table.is_none() {
                    session.select_table(None);
                }
                table
            }
            None => None,
        };
        let listing = match table {
            Some(table) => Some(self.listing(session, table, page).await?),
            None => None,
        };
        let state = match &listing {
            None => ViewState::NoTableSelected,
            Some(_) if session.search().is_empty() => ViewState::Listing,
            Some(_) => ViewState::Searching,
        };
        Ok(ListingView {
            state,
            tables,
            selected: session.selected_table().map(str::to_string),
            message: session.take_message(),
            listing,
        })
    }

    async fn listing(&self, session: &mut SessionState, table: Table, page: u32) -> Result<TableListing, AppError> {
        let fetched = self.dao.list(&table, session.search(), page.saturating_add(1)).await?;
        let pk = table.primary_key();
        let mut tokens = match pk {
            Some(pk) => RowTokens::for_table(&table.name, &pk.name, &pk.declared_type),
            None => RowTokens::default(),
        };
        let shown = |name: &str| !(self.hide_primary_key && pk.map(|p| p.name == name).unwrap_or(false));

        let rows = fetched
            .rows
            .into_iter()
            .map(|row| {
                let token = pk
                    .and_then(|pk| row.get(&pk.name))
                    .filter(|v| !v.is_null())
                    .map(|v| tokens.mint(v.clone()));
                let cells: Vec<SqlValue> = row
                    .cells
                    .into_iter()
                    .filter(|c| shown(&c.column))
                    .map(|c| c.value)
                    .collect();
                RowView { token, cells }
            })
            .collect();
        tracing::debug!(table = %table.name, tokens = tokens.len(), "minted row tokens");
        session.replace_tokens(tokens);

        Ok(TableListing {
            columns: table
                .columns
                .iter()
                .filter(|c| shown(&c.name))
                .map(|c| ColumnView {
                    name: c.name.clone(),
                    declared_type: c.declared_type.clone(),
                    primary_key: c.primary_key,
                })
                .collect(),
            rows,
            pagination: Pagination::new(fetched.total, page, self.dao.page_size()),
            search: session
                .search()
                .iter()
                .map(|(column, pattern)| SearchLabel {
                    column: column.to_string(),
                    pattern: pattern.to_string(),
                })
                .collect(),
            indexed: table.indexed.clone(),
            table: table.name,
        })
    }
}

fn stale_token() -> AppError {
    AppError::Validation("entry is no longer available, reload the listing".into())
}
