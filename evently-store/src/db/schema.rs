//! Table and index declarations for events and bookings
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so this runs safely on
//! every startup. It declares the current shape only and does not migrate
//! older ones.

use crate::db::Database;
use crate::error::StoreResult;

/// Name of the unique index that enforces slug uniqueness.
pub(crate) const EVENTS_SLUG_INDEX: &str = "events_slug_key";

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title TEXT NOT NULL,
        slug TEXT NOT NULL,
        description TEXT NOT NULL,
        overview TEXT NOT NULL,
        image TEXT NOT NULL,
        venue TEXT NOT NULL,
        location TEXT NOT NULL,
        date DATE NOT NULL,
        time TEXT NOT NULL,
        mode TEXT NOT NULL CHECK (mode IN ('online', 'offline', 'hybrid')),
        audience TEXT NOT NULL,
        agenda TEXT[] NOT NULL CHECK (cardinality(agenda) > 0),
        organizer TEXT NOT NULL,
        tags TEXT[] NOT NULL CHECK (cardinality(tags) > 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS events_slug_key ON events (slug)",
    "CREATE INDEX IF NOT EXISTS events_date_idx ON events (date)",
    "CREATE INDEX IF NOT EXISTS events_mode_idx ON events (mode)",
    "CREATE INDEX IF NOT EXISTS events_tags_idx ON events USING GIN (tags)",
    // No foreign key: the event reference is checked by BookingStore.
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        event_id UUID NOT NULL,
        email TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS bookings_event_id_idx ON bookings (event_id)",
    "CREATE INDEX IF NOT EXISTS bookings_event_id_email_idx ON bookings (event_id, email)",
];

/// Create the `events` and `bookings` tables and their indexes.
pub async fn ensure(db: &Database) -> StoreResult<()> {
    tracing::info!("Ensuring event and booking tables...");

    for statement in STATEMENTS {
        sqlx::query(statement).execute(db.pool()).await?;
    }

    tracing::debug!(statements = STATEMENTS.len(), "schema up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_index_name_matches_statement() {
        assert!(STATEMENTS
            .iter()
            .any(|s| s.contains(EVENTS_SLUG_INDEX) && s.contains("UNIQUE")));
    }

    #[test]
    fn every_statement_is_idempotent() {
        assert!(STATEMENTS.iter().all(|s| s.contains("IF NOT EXISTS")));
    }
}
