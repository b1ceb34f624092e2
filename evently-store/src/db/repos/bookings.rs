//! Booking store
//!
//! Bookings reference events by id. The reference is checked here, in
//! application code, right before the write:
//! - event missing: `Reference`
//! - lookup failed: `Dependency` wrapping the cause
//!
//! The check and the insert are separate statements. An event deleted in
//! between leaves an orphaned booking; that window is accepted.

use async_trait::async_trait;
use uuid::Uuid;

use super::EventStore;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{Booking, BookingFields, BookingPatch, Email};

const BOOKING_COLUMNS: &str = "id, event_id, email, created_at, updated_at";

/// Answers "does this event exist?" for the booking reference check.
#[async_trait]
pub trait EventLookup: Sync {
    async fn event_exists(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
impl<'a> EventLookup for EventStore<'a> {
    async fn event_exists(&self, id: Uuid) -> StoreResult<bool> {
        self.exists(id).await
    }
}

/// Fail unless `event_id` names an existing event.
pub async fn ensure_event_exists<L>(lookup: &L, event_id: Uuid) -> StoreResult<()>
where
    L: EventLookup + ?Sized,
{
    match lookup.event_exists(event_id).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::warn!(%event_id, "booking rejected: event does not exist");
            Err(StoreError::Reference {
                resource: "event",
                id: event_id,
            })
        }
        Err(err) => {
            tracing::error!(%event_id, error = %err, "event lookup failed during booking validation");
            Err(StoreError::dependency("event reference", err))
        }
    }
}

/// Booking store
pub struct BookingStore<'a> {
    db: &'a Database,
    events: EventStore<'a>,
}

impl<'a> BookingStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            events: EventStore::new(db),
        }
    }

    /// Check the event reference, normalize the email, insert.
    ///
    /// A missing event is reported as `Reference` even when the email is
    /// also invalid.
    pub async fn create(&self, fields: BookingFields) -> StoreResult<Booking> {
        ensure_event_exists(&self.events, fields.event_id).await?;
        let email = Email::new(&fields.email)?;

        let sql = format!(
            r#"
            INSERT INTO bookings (event_id, email)
            VALUES ($1, $2)
            RETURNING {BOOKING_COLUMNS}
            "#
        );

        let booking: Booking = sqlx::query_as(&sql)
            .bind(fields.event_id)
            .bind(email.as_str())
            .fetch_one(self.db.pool())
            .await?;

        tracing::info!(booking_id = %booking.id, event_id = %booking.event_id, "booking created");
        Ok(booking)
    }

    /// Change a booking's event and/or email. The event reference is only
    /// re-checked when it actually changes.
    pub async fn update(&self, id: Uuid, patch: BookingPatch) -> StoreResult<Booking> {
        let current = self.get(id).await?;

        let event_id = patch.event_id.unwrap_or(current.event_id);
        if event_id != current.event_id {
            ensure_event_exists(&self.events, event_id).await?;
        }

        let email = match patch.email {
            Some(raw) => Email::new(&raw)?.into_string(),
            None => current.email,
        };

        let sql = format!(
            r#"
            UPDATE bookings SET event_id = $1, email = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {BOOKING_COLUMNS}
            "#
        );

        let booking: Booking = sqlx::query_as(&sql)
            .bind(event_id)
            .bind(&email)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(booking_id = %id, event_id = %event_id, "booking updated");
        Ok(booking)
    }

    /// All bookings for an event, oldest first.
    pub async fn find_by_event(&self, event_id: Uuid) -> StoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE event_id = $1 ORDER BY created_at ASC"
        );

        let bookings = sqlx::query_as(&sql)
            .bind(event_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(bookings)
    }

    /// Bookings for one event and address. Duplicates are allowed, so this
    /// is how callers detect them.
    pub async fn find_by_event_and_email(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> StoreResult<Vec<Booking>> {
        let email = Email::new(email)?;
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE event_id = $1 AND email = $2 ORDER BY created_at ASC"
        );

        let bookings = sqlx::query_as(&sql)
            .bind(event_id)
            .bind(email.as_str())
            .fetch_all(self.db.pool())
            .await?;
        Ok(bookings)
    }

    /// Get a single booking by id.
    pub async fn get(&self, id: Uuid) -> StoreResult<Booking> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");

        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> StoreError {
    StoreError::NotFound {
        resource: "booking",
        id: id.to_string(),
    }
}
