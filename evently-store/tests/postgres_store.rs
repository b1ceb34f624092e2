//! Store tests against a real PostgreSQL database
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p evently-store -- --ignored

use evently_store::db::schema;
use evently_store::models::{BookingFields, BookingPatch, EventFields, EventFilter, EventPatch};
use evently_store::{ConnectionCache, Database, DatabaseConfig, Models, StoreError};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Store logs are captured per test; filter with RUST_LOG.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn connect() -> Database {
    init_tracing();
    let config = DatabaseConfig::from_env().expect("DATABASE_URL required");
    let cache = ConnectionCache::postgres(config);
    let db = cache.acquire().await.expect("connect failed");
    schema::ensure(&db).await.expect("schema failed");
    db
}

/// Titles carry a random suffix so reruns never collide on slug.
fn event_fields(title: &str) -> EventFields {
    EventFields {
        title: format!("{title} {}", Uuid::new_v4().simple()),
        description: "A gathering".into(),
        overview: "Talks, food, and hacking".into(),
        image: "/images/event.png".into(),
        venue: "Main Hall".into(),
        location: "Berlin".into(),
        date: "October 5, 2030".into(),
        time: " 18:00 ".into(),
        mode: "Offline".into(),
        audience: "Everyone".into(),
        agenda: vec!["Welcome".into(), "Lightning talks".into()],
        organizer: "Local Rust Group".into(),
        tags: vec!["rust".into(), "meetup".into()],
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_normalizes_and_finds_by_slug() {
    let models = Models::new(connect().await);
    let fields = event_fields("Hacktoberfest 2030!!");
    let expected_slug = evently_store::models::slugify(&fields.title);

    let created = models.events().create(fields).await.expect("create failed");
    assert_eq!(created.slug, expected_slug);
    assert!(created.slug.starts_with("hacktoberfest-2030-"));
    assert_eq!(created.date.to_string(), "2030-10-05");
    assert_eq!(created.time, "18:00");
    assert_eq!(created.mode.as_str(), "offline");

    let found = models
        .events()
        .find_by_slug(&created.slug)
        .await
        .unwrap()
        .expect("event should be found by slug");
    assert_eq!(found.id, created.id);
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_slug_is_conflict() {
    let models = Models::new(connect().await);
    let first = event_fields("Same Title");
    let mut second = first.clone();
    second.title = format!("  {}!!", first.title.to_uppercase());

    models.events().create(first).await.expect("first create failed");
    let err = models.events().create(second).await.unwrap_err();

    assert!(matches!(err, StoreError::Conflict { field: "slug", .. }), "got {err:?}");
}

#[tokio::test]
#[ignore = "requires database"]
async fn empty_tags_never_persist() {
    let models = Models::new(connect().await);
    let mut fields = event_fields("No Tags");
    fields.tags.clear();
    let slug = evently_store::models::slugify(&fields.title);

    let err = models.events().create(fields).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(models.events().find_by_slug(&slug).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires database"]
async fn update_recomputes_slug_only_for_title() {
    let models = Models::new(connect().await);
    let created = models.events().create(event_fields("Before")).await.unwrap();

    let venue_only = EventPatch {
        venue: Some("Annex".into()),
        ..Default::default()
    };
    let updated = models.events().update(created.id, venue_only).await.unwrap();
    assert_eq!(updated.slug, created.slug);
    assert_eq!(updated.venue, "Annex");
    assert!(updated.updated_at >= created.updated_at);

    let retitled = EventPatch {
        title: Some(format!("After {}", Uuid::new_v4().simple())),
        ..Default::default()
    };
    let updated = models.events().update(created.id, retitled).await.unwrap();
    assert!(updated.slug.starts_with("after-"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn list_filters_by_tag_and_mode() {
    let models = Models::new(connect().await);
    let tag = format!("tag-{}", Uuid::new_v4().simple());
    let mut fields = event_fields("Tagged");
    fields.tags.push(tag.clone());
    fields.mode = "hybrid".into();
    let created = models.events().create(fields).await.unwrap();

    let filter = EventFilter::default()
        .with_tag(&tag)
        .unwrap()
        .with_mode("HYBRID")
        .unwrap();
    let page = models.events().list(&filter).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, created.id);

    let filter = EventFilter::default().with_tag(&tag).unwrap().with_mode("online").unwrap();
    assert_eq!(models.events().list(&filter).await.unwrap().total, 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn booking_normalizes_email() {
    let models = Models::new(connect().await);
    let event = models.events().create(event_fields("Bookable")).await.unwrap();

    let booking = models
        .bookings()
        .create(BookingFields {
            event_id: event.id,
            email: "  USER@Example.com ".into(),
        })
        .await
        .unwrap();
    assert_eq!(booking.email, "user@example.com");

    // Duplicates are allowed; callers detect them with this query.
    models
        .bookings()
        .create(BookingFields {
            event_id: event.id,
            email: "user@example.com".into(),
        })
        .await
        .unwrap();
    let dupes = models
        .bookings()
        .find_by_event_and_email(event.id, "User@Example.com")
        .await
        .unwrap();
    assert_eq!(dupes.len(), 2);
    assert_eq!(models.bookings().find_by_event(event.id).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires database"]
async fn booking_for_missing_event_is_reference_error() {
    let models = Models::new(connect().await);
    let missing = Uuid::new_v4();

    for email in ["user@example.com", "not-an-email"] {
        let err = models
            .bookings()
            .create(BookingFields {
                event_id: missing,
                email: email.into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Reference { id, .. } if id == missing), "got {err:?}");
    }
    assert!(models.bookings().find_by_event(missing).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires database"]
async fn booking_move_checks_new_event() {
    let models = Models::new(connect().await);
    let event = models.events().create(event_fields("Origin")).await.unwrap();
    let booking = models
        .bookings()
        .create(BookingFields {
            event_id: event.id,
            email: "mover@example.com".into(),
        })
        .await
        .unwrap();

    let err = models
        .bookings()
        .update(
            booking.id,
            BookingPatch {
                event_id: Some(Uuid::new_v4()),
                email: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Reference { .. }));

    let updated = models
        .bookings()
        .update(
            booking.id,
            BookingPatch {
                event_id: None,
                email: Some("MOVED@example.com".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.email, "moved@example.com");
    assert_eq!(updated.event_id, event.id);
}
