//! evently-store: persistence layer for the event listing site
//!
//! Provides the cached database connection, the Event and Booking
//! entities with their normalization rules, and stores that validate
//! before every write.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod registry;

pub use config::DatabaseConfig;
pub use db::{ConnectionCache, Database, PgConnector};
pub use error::{StoreError, StoreResult};
pub use registry::Models;
