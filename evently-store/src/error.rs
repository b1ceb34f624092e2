//! Error types for evently-store
//!
//! Library callers get a structured [`StoreError`]; binaries are free to
//! wrap it in `anyhow`.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::models::ValidationError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Missing or malformed process configuration. Not retryable.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// Connection attempt failed. The next `acquire()` retries.
    ///
    /// The cause is shared by every caller that waited on the same attempt.
    #[error("database connection failed: {source}")]
    Connection {
        #[source]
        source: Arc<sqlx::Error>,
    },

    #[error("connection cache is closed")]
    ConnectionClosed,

    #[error("validation failed on {}: {0}", .0.field())]
    Validation(#[from] ValidationError),

    #[error("conflict: {resource} with {field} '{value}' already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{resource} does not exist: {id}")]
    Reference { resource: &'static str, id: Uuid },

    #[error("failed to validate {context}: {source}")]
    Dependency {
        context: &'static str,
        #[source]
        source: Box<StoreError>,
    },

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Wrap an upstream failure that happened while checking a dependency.
    pub fn dependency(context: &'static str, source: StoreError) -> Self {
        Self::Dependency {
            context,
            source: Box::new(source),
        }
    }

    /// Whether retrying the same operation later can succeed without the
    /// caller changing its input.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::Dependency { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_names_field() {
        let err: StoreError = ValidationError::Empty { field: "time" }.into();
        assert_eq!(err.to_string(), "validation failed on time: time cannot be empty");
    }

    #[test]
    fn reference_display_names_id() {
        let id = Uuid::nil();
        let err = StoreError::Reference {
            resource: "event",
            id,
        };
        assert_eq!(
            err.to_string(),
            "event does not exist: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn dependency_wraps_cause() {
        let cause = StoreError::Connection {
            source: Arc::new(sqlx::Error::PoolTimedOut),
        };
        let err = StoreError::dependency("event reference", cause);

        assert!(err.to_string().starts_with("failed to validate event reference:"));
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            StoreError::Dependency { ref source, .. } if matches!(**source, StoreError::Connection { .. })
        ));
    }

    #[test]
    fn configuration_is_not_retryable() {
        assert!(!StoreError::configuration("DATABASE_URL is not set").is_retryable());
    }
}
