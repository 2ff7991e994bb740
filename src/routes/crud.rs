//! The listing page and its form actions, both on `/`.

use crate::handlers::crud::{act, render};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted form body.
pub const MAX_FORM_BYTES: usize = 1024 * 1024;

pub fn crud_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(render).post(act))
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .with_state(state)
}
