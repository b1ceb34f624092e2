//! Stores for the `events` and `bookings` tables
//!
//! Each store borrows a resolved [`Database`](crate::db::Database) and:
//! - normalizes and validates in Rust before touching SQL
//! - maps unique-index violations to `Conflict`
//! - checks cross-entity references as an explicit step before the write

pub mod bookings;
pub mod events;

pub use bookings::{ensure_event_exists, BookingStore, EventLookup};
pub use events::EventStore;
