//! Event store
//!
//! Every write goes through the same steps:
//! - `before_persist` for the fields that changed (slug, date, time)
//! - field validation
//! - one INSERT/UPDATE; a taken slug surfaces as `Conflict`

use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::db::schema::EVENTS_SLUG_INDEX;
use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Event, EventDraft, EventField, EventFields, EventFilter, EventPatch, Paginated, ValidEvent,
};

const EVENT_COLUMNS: &str = "id, title, slug, description, overview, image, venue, location, \
     date, time, mode, audience, agenda, organizer, tags, created_at, updated_at";

/// Event store
pub struct EventStore<'a> {
    db: &'a Database,
}

impl<'a> EventStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Normalize, validate and insert a new event.
    ///
    /// # Errors
    ///
    /// `Validation` for bad fields, `Conflict` when another event already
    /// has the derived slug.
    pub async fn create(&self, fields: EventFields) -> StoreResult<Event> {
        let mut draft = EventDraft::new(fields);
        draft.before_persist(&EventField::ALL)?;
        let event = draft.validate()?;

        let sql = format!(
            r#"
            INSERT INTO events
                (title, slug, description, overview, image, venue, location,
                 date, time, mode, audience, agenda, organizer, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {EVENT_COLUMNS}
            "#
        );

        let row = bind_event(sqlx::query(&sql), &event)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| write_error(e, &event.slug))?;

        let created = event_from_row(&row)?;
        tracing::info!(event_id = %created.id, slug = %created.slug, "event created");
        Ok(created)
    }

    /// Apply a partial update. Only patched fields count as changed, so the
    /// slug is recomputed only when the title is part of the patch.
    pub async fn update(&self, id: Uuid, patch: EventPatch) -> StoreResult<Event> {
        let current = self.get(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let mut draft = current.to_draft();
        let changed = patch.apply(&mut draft.fields);
        draft.before_persist(&changed)?;
        let event = draft.validate()?;

        let sql = format!(
            r#"
            UPDATE events SET
                title = $1, slug = $2, description = $3, overview = $4, image = $5,
                venue = $6, location = $7, date = $8, time = $9, mode = $10,
                audience = $11, agenda = $12, organizer = $13, tags = $14,
                updated_at = NOW()
            WHERE id = $15
            RETURNING {EVENT_COLUMNS}
            "#
        );

        let row = bind_event(sqlx::query(&sql), &event)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| write_error(e, &event.slug))?
            .ok_or_else(|| not_found(id))?;

        let updated = event_from_row(&row)?;
        tracing::info!(event_id = %id, ?changed, "event updated");
        Ok(updated)
    }

    /// Look an event up by slug. Input is trimmed and lower-cased first.
    pub async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = $1");

        sqlx::query(&sql)
            .bind(slug.trim().to_lowercase())
            .fetch_optional(self.db.pool())
            .await?
            .map(|row| event_from_row(&row))
            .transpose()
    }

    /// Get a single event by id.
    pub async fn get(&self, id: Uuid) -> StoreResult<Event> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| not_found(id))?;

        event_from_row(&row)
    }

    pub async fn exists(&self, id: Uuid) -> StoreResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    /// List events matching a filter, soonest first.
    ///
    /// Each filter hits its own index (date, mode, GIN on tags).
    pub async fn list(&self, filter: &EventFilter) -> StoreResult<Paginated<Event>> {
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}, COUNT(*) OVER() AS total
            FROM events
            WHERE ($1::date IS NULL OR date = $1)
              AND ($2::text IS NULL OR mode = $2)
              AND ($3::text IS NULL OR tags @> ARRAY[$3::text])
            ORDER BY date ASC, created_at ASC
            LIMIT $4 OFFSET $5
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(filter.date)
            .bind(filter.mode.map(|m| m.as_str()))
            .bind(filter.tag.as_deref())
            .bind(filter.page.limit())
            .bind(filter.page.offset())
            .fetch_all(self.db.pool())
            .await?;

        let total = rows
            .first()
            .map(|r| r.try_get::<i64, _>("total"))
            .transpose()?
            .unwrap_or(0);
        let items = rows
            .iter()
            .map(event_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Paginated {
            items,
            total,
            page: filter.page.page,
            per_page: filter.page.per_page,
        })
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Bind `$1..=$14` in column order.
fn bind_event<'q>(query: PgQuery<'q>, event: &'q ValidEvent) -> PgQuery<'q> {
    query
        .bind(&event.title)
        .bind(&event.slug)
        .bind(&event.description)
        .bind(&event.overview)
        .bind(&event.image)
        .bind(&event.venue)
        .bind(&event.location)
        .bind(event.date)
        .bind(&event.time)
        .bind(event.mode.as_str())
        .bind(&event.audience)
        .bind(&event.agenda)
        .bind(&event.organizer)
        .bind(&event.tags)
}

fn event_from_row(row: &PgRow) -> StoreResult<Event> {
    let mode: String = row.try_get("mode")?;

    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        overview: row.try_get("overview")?,
        image: row.try_get("image")?,
        venue: row.try_get("venue")?,
        location: row.try_get("location")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        mode: mode.parse()?,
        audience: row.try_get("audience")?,
        agenda: row.try_get("agenda")?,
        organizer: row.try_get("organizer")?,
        tags: row.try_get("tags")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Map a unique-slug violation to `Conflict`; anything else stays a
/// database error.
fn write_error(err: sqlx::Error, slug: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(EVENTS_SLUG_INDEX) {
            tracing::warn!(slug, "event slug already taken");
            return StoreError::Conflict {
                resource: "event",
                field: "slug",
                value: slug.to_owned(),
            };
        }
    }
    StoreError::Database(err)
}

fn not_found(id: Uuid) -> StoreError {
    StoreError::NotFound {
        resource: "event",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_pass_through() {
        let err = write_error(sqlx::Error::RowNotFound, "some-slug");
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn column_list_covers_every_field() {
        for column in ["slug", "date", "mode", "agenda", "tags", "created_at", "updated_at"] {
            assert!(EVENT_COLUMNS.contains(column), "missing {column}");
        }
    }
}
