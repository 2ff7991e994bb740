//! Schema-driven CRUD engine for SQLite: discovers tables, columns and indexes at runtime and
//! serves paginated listing, substring search, create, modify and remove over any table.

pub mod config;
pub mod controller;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod logging;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod session;
pub mod sql;
pub mod state;
pub mod view;

pub use config::Settings;
pub use controller::{Action, ActionFlow, ActionForm, Controller, Outcome};
pub use error::{AppError, ConfigError};
pub use logging::init_tracing;
pub use routes::{common_routes, crud_routes};
pub use service::Dao;
pub use session::{MemorySessionStore, SessionState, SessionStore};
pub use state::AppState;

use axum::Router;

/// Every route the server exposes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(crud_routes(state))
}
