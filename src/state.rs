//! Shared application state for all routes.

use crate::config::Settings;
use crate::controller::Controller;
use crate::service::Dao;
use crate::session::{MemorySessionStore, SessionStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dao: Dao,
    pub sessions: Arc<dyn SessionStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// State backed by the in-process session store.
    pub fn new(settings: Settings) -> Self {
        let sessions = Arc::new(MemorySessionStore::new(settings.session_ttl));
        Self::with_sessions(settings, sessions)
    }

    pub fn with_sessions(settings: Settings, sessions: Arc<dyn SessionStore>) -> Self {
        AppState {
            dao: Dao::new(&settings),
            sessions,
            settings: Arc::new(settings),
        }
    }

    pub fn controller(&self) -> Controller {
        Controller::new(self.dao.clone(), self.settings.hide_primary_key)
    }
}
