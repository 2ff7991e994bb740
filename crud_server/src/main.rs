//! HTTP server around the schema-crud engine.
//!
//! Run from repo root: `cargo run -p crud-server`
//! Configuration comes from `CRUD_*` environment variables or a `.env` file.

use schema_crud::{app, init_tracing, AppState, MemorySessionStore, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing();

    let bind = settings.bind.clone();
    tracing::info!(
        database = %settings.database.display(),
        page_size = settings.page_size,
        "opening database"
    );
    let sessions = Arc::new(MemorySessionStore::new(settings.session_ttl));
    spawn_session_purge(sessions.clone(), settings.session_ttl);
    let state = AppState::with_sessions(settings, sessions);
    state.dao.ping().await?;

    let listener = TcpListener::bind(&bind).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn spawn_session_purge(sessions: Arc<MemorySessionStore>, ttl: std::time::Duration) {
    let period = ttl.max(std::time::Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired sessions dropped");
            }
        }
    });
}
