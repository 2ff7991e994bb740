//! Runtime settings read from the process environment (`CRUD_*` variables).

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "sample.db";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct Settings {
    /// Path of the SQLite database all tables are introspected from.
    pub database: PathBuf,
    /// Rows per listing page.
    pub page_size: u32,
    /// Leave the primary-key column out of listing views.
    pub hide_primary_key: bool,
    pub create_if_missing: bool,
    /// Idle lifetime of a session in the in-memory store.
    pub session_ttl: Duration,
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database: PathBuf::from(DEFAULT_DATABASE),
            page_size: DEFAULT_PAGE_SIZE,
            hide_primary_key: false,
            create_if_missing: true,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Settings {
    /// Settings for the given database path, everything else at defaults.
    pub fn for_database(database: impl Into<PathBuf>) -> Self {
        Settings {
            database: database.into(),
            ..Settings::default()
        }
    }

    /// Load `.env` (if present) and read settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Settings::default();
        if let Some(v) = lookup("CRUD_DATABASE").filter(|v| !v.trim().is_empty()) {
            s.database = PathBuf::from(v.trim());
        }
        if let Some(v) = lookup("CRUD_PAGE_SIZE") {
            s.page_size = match v.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(ConfigError::Invalid { key: "CRUD_PAGE_SIZE", value: v }),
            };
        }
        if let Some(v) = lookup("CRUD_HIDE_PRIMARY_KEY") {
            s.hide_primary_key = parse_flag("CRUD_HIDE_PRIMARY_KEY", &v)?;
        }
        if let Some(v) = lookup("CRUD_CREATE_IF_MISSING") {
            s.create_if_missing = parse_flag("CRUD_CREATE_IF_MISSING", &v)?;
        }
        if let Some(v) = lookup("CRUD_SESSION_TTL_SECS") {
            let secs = v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid { key: "CRUD_SESSION_TTL_SECS", value: v.clone() })?;
            s.session_ttl = Duration::from_secs(secs);
        }
        if let Some(v) = lookup("CRUD_BIND").filter(|v| !v.trim().is_empty()) {
            s.bind = v.trim().to_string();
        }
        Ok(s)
    }

    /// Database path as stored in session state; a change resets every session.
    pub fn database_key(&self) -> String {
        self.database.to_string_lossy().into_owned()
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
