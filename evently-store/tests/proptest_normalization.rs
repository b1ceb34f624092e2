use chrono::NaiveDate;
use evently_store::models::{normalize_date, slugify, Email, EventDraft, EventField, EventFields};
use proptest::prelude::*;

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1970i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("day <= 28 is always valid"))
}

fn base_fields(title: String) -> EventFields {
    EventFields {
        title,
        description: "d".into(),
        overview: "o".into(),
        image: "/i.png".into(),
        venue: "v".into(),
        location: "l".into(),
        date: "2025-01-01".into(),
        time: "10:00".into(),
        mode: "online".into(),
        audience: "a".into(),
        agenda: vec!["intro".into()],
        organizer: "org".into(),
        tags: vec!["tag".into()],
    }
}

proptest! {
    /// Property: slugify is idempotent for arbitrary titles
    #[test]
    fn prop_slugify_idempotent(title in ".*") {
        let once = slugify(&title);
        prop_assert_eq!(slugify(&once), once);
    }

    /// Property: slugs only contain lower-case ASCII word chars and hyphens,
    /// never start or end with a hyphen, never contain "--"
    #[test]
    fn prop_slug_shape(title in ".*") {
        let slug = slugify(&title);
        prop_assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
    }

    /// Property: normalizing a date twice gives the same canonical value
    #[test]
    fn prop_date_normalization_idempotent(date in arb_date(), style in 0usize..5) {
        // Mid-morning with a small offset keeps the UTC date unchanged.
        let at = date.and_hms_opt(10, 30, 0).expect("valid time");
        let raw = match style {
            0 => date.format("%Y-%m-%d").to_string(),
            1 => date.format("%Y/%m/%d").to_string(),
            2 => date.format("%B %d, %Y").to_string(),
            3 => at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            _ => at.format("%Y-%m-%dT%H:%M:%S+02:00").to_string(),
        };
        let once = normalize_date(&raw).unwrap();
        prop_assert_eq!(&once, &date.format("%Y-%m-%d").to_string());
        prop_assert_eq!(normalize_date(&once).unwrap(), once);
    }

    /// Property: strings without digits never parse as dates
    #[test]
    fn prop_digitless_dates_rejected(raw in "[a-zA-Z ,!?-]{0,24}") {
        prop_assert!(normalize_date(&raw).is_err());
    }

    /// Property: any title with at least one ASCII alphanumeric yields a
    /// non-empty slug and a valid draft
    #[test]
    fn prop_alphanumeric_titles_validate(prefix in "[^a-zA-Z0-9]{0,8}", core in "[a-zA-Z0-9]{1,12}", suffix in ".{0,8}") {
        let mut draft = EventDraft::new(base_fields(format!("{prefix}{core}{suffix}")));
        draft.before_persist(&EventField::ALL).unwrap();
        let event = draft.validate().unwrap();
        prop_assert!(!event.slug.is_empty());
    }

    /// Property: email normalization ignores case and surrounding whitespace
    #[test]
    fn prop_email_case_insensitive(local in "[a-zA-Z0-9.]{1,12}", domain in "[a-zA-Z]{1,10}", pad in " {0,3}") {
        let raw = format!("{pad}{local}@{domain}.COM{pad}");
        let email = Email::new(&raw).unwrap();
        prop_assert_eq!(email.as_str(), raw.trim().to_lowercase());
    }
}
