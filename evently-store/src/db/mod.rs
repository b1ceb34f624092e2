//! Database layer - connection cache, schema and stores
//!
//! # Design Principles
//!
//! - One shared connection per cache owner, opened once
//! - Stores take a resolved [`Database`]; nothing queues before connect
//! - Normalize and validate in Rust before any write
//! - Rely on the unique slug index for conflicts, no check-then-insert

pub mod pool;
pub mod repos;
pub mod schema;

pub use pool::{ConnectionCache, Connector, Database, PgConnector};
pub use repos::*;
