//! Environment loading
//!
//! `.env.local` wins over `.env`; both lose to variables already set in the
//! process. Missing `DATABASE_URL` is fatal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use evently_store::DatabaseConfig;

const ENV_FILES: &[&str] = &[".env.local", ".env"];

/// Load dotenv files from the working directory, if present.
///
/// Runs before tracing is set up so a `RUST_LOG` from these files takes
/// effect; returns the files that were loaded for logging afterwards.
pub fn load_env_files() -> Vec<PathBuf> {
    // dotenvy never overrides variables that are already set.
    ENV_FILES
        .iter()
        .filter_map(|file| dotenvy::from_filename(file).ok())
        .collect()
}

/// Database settings, or a fatal error explaining what is missing.
pub fn database_config() -> Result<DatabaseConfig> {
    DatabaseConfig::from_env().context("cannot start without database configuration")
}
