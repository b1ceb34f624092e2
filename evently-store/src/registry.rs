//! One import surface for callers
//!
//! ```ignore
//! use evently_store::registry::{Models, EventFields, BookingFields};
//!
//! let db = cache.acquire().await?;
//! let models = Models::new(db);
//! let event = models.events().create(fields).await?;
//! ```

pub use crate::db::{BookingStore, Database, EventStore};
pub use crate::models::{
    Booking, BookingFields, BookingPatch, Event, EventFields, EventFilter, EventMode, EventPatch,
    Paginated, Pagination,
};

/// Hands out stores bound to one resolved connection.
#[derive(Debug, Clone)]
pub struct Models {
    db: Database,
}

impl Models {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn events(&self) -> EventStore<'_> {
        EventStore::new(&self.db)
    }

    pub fn bookings(&self) -> BookingStore<'_> {
        BookingStore::new(&self.db)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
