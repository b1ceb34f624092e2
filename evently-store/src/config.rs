//! Database configuration sourced from the process environment.
//!
//! `DATABASE_URL` is required. Its absence is a [`StoreError::Configuration`],
//! raised before any connection attempt is made.

use std::time::Duration;

use crate::error::{StoreError, StoreResult};

/// Environment variable holding the PostgreSQL connection string.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Optional pool size override.
pub const MAX_CONNECTIONS_VAR: &str = "EVENTLY_DB_MAX_CONNECTIONS";
/// Optional acquire timeout override, in seconds.
pub const ACQUIRE_TIMEOUT_VAR: &str = "EVENTLY_DB_ACQUIRE_TIMEOUT_SECS";

/// Default maximum connections for the pool.
/// Kept low; one process serves one small site.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the backing database.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL usually carries credentials.
        f.debug_struct("DatabaseConfig")
            .field("database_url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl DatabaseConfig {
    /// Build a config with defaults for everything but the URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] when `DATABASE_URL` is unset or
    /// blank, or when an optional override does not parse.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Used by `from_env` and by tests
    /// that must not touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_VAR)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                StoreError::configuration(format!(
                    "{DATABASE_URL_VAR} is not set; define it in the environment or .env.local"
                ))
            })?;

        let mut config = Self::new(database_url);

        if let Some(raw) = lookup(MAX_CONNECTIONS_VAR) {
            config.max_connections = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    StoreError::configuration(format!(
                        "{MAX_CONNECTIONS_VAR} must be a positive integer, got '{raw}'"
                    ))
                })?;
        }

        if let Some(raw) = lookup(ACQUIRE_TIMEOUT_VAR) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                StoreError::configuration(format!(
                    "{ACQUIRE_TIMEOUT_VAR} must be a number of seconds, got '{raw}'"
                ))
            })?;
            config.acquire_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
