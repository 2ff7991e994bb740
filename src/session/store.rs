//! Session persistence seam and the in-process store.

use crate::error::AppError;
use crate::session::SessionState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// Where session state lives between requests. One in-flight request per session is assumed.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionState>, AppError>;
    async fn save(&self, id: &str, state: SessionState) -> Result<(), AppError>;
}

struct Stored {
    state: SessionState,
    touched: DateTime<Utc>,
}

/// Process-local store; sessions idle longer than `ttl` are dropped.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Stored>>,
    ttl: chrono::Duration,
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Session("session store lock poisoned".into())
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        MemorySessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365)),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, touched: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - touched > self.ttl
    }

    fn load_at(&self, id: &str, now: DateTime<Utc>) -> Result<Option<SessionState>, AppError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let expired = match sessions.get(id) {
            Some(s) => self.expired(s.touched, now),
            None => return Ok(None),
        };
        if expired {
            tracing::debug!(session = %id, "session expired");
            sessions.remove(id);
            return Ok(None);
        }
        Ok(sessions.get(id).map(|s| s.state.clone()))
    }

    fn save_at(&self, id: &str, state: SessionState, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(id.to_string(), Stored { state, touched: now });
        Ok(())
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        match self.sessions.write() {
            Ok(mut sessions) => {
                let before = sessions.len();
                sessions.retain(|_, s| !self.expired(s.touched, now));
                before - sessions.len()
            }
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionState>, AppError> {
        self.load_at(id, Utc::now())
    }

    async fn save(&self, id: &str, state: SessionState) -> Result<(), AppError> {
        self.save_at(id, state, Utc::now())
    }
}
