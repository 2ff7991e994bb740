//! GET renders the listing; POST applies one action and redirects back, or returns a form.

use crate::controller::Outcome;
use crate::error::AppError;
use crate::extractors::SessionId;
use crate::response::success_one_ok;
use crate::session::SessionState;
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use std::collections::HashMap;

/// Query parameter carrying the zero-based page index.
pub const PAGE_PARAM: &str = "o";

async fn load_session(state: &AppState, session_id: &SessionId) -> Result<SessionState, AppError> {
    let database = state.settings.database_key();
    let mut session = state.sessions.load(&session_id.id).await?.unwrap_or_default();
    if session.reset_if_database_changed(&database) {
        tracing::debug!(session = %session_id.id, database = %database, "new session state");
    }
    Ok(session)
}

fn with_cookie(mut response: Response, session_id: &SessionId) -> Response {
    if let Some(cookie) = session_id.set_cookie() {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

pub async fn render(
    State(state): State<AppState>,
    session_id: SessionId,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let page = query
        .get(PAGE_PARAM)
        .and_then(|o| o.trim().parse::<u32>().ok())
        .unwrap_or(0);
    let mut session = load_session(&state, &session_id).await?;
    let view = state.controller().render(&mut session, page).await;
    state.sessions.save(&session_id.id, session).await?;
    Ok(with_cookie(success_one_ok(view?).into_response(), &session_id))
}

pub async fn act(
    State(state): State<AppState>,
    session_id: SessionId,
    OriginalUri(uri): OriginalUri,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let mut session = load_session(&state, &session_id).await?;
    let outcome = state.controller().dispatch(&mut session, &fields.into()).await;
    state.sessions.save(&session_id.id, session).await?;
    let response = match outcome {
        Outcome::Redirect => Redirect::to(uri.path()).into_response(),
        Outcome::Form(form) => success_one_ok(form).into_response(),
    };
    Ok(with_cookie(response, &session_id))
}
