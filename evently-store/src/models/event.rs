//! Event fields, normalization and validation
//!
//! Raw input arrives as [`EventFields`]. Before every write the store runs
//! [`EventDraft::before_persist`] for the fields that changed, then
//! [`EventDraft::validate`] to get a [`ValidEvent`] ready for SQL.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Pagination, ValidationError};

/// Anything outside ASCII word characters, whitespace and hyphen.
static SLUG_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("invalid slug strip regex"));
static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));
static HYPHEN_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("invalid hyphen regex"));

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Canonical stored form of an event date.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Derive a URL-safe slug from a title.
///
/// Lower-case, trim, drop everything but ASCII word characters, whitespace
/// and hyphens, turn whitespace runs into single hyphens, squeeze repeated
/// hyphens, then strip hyphens from both ends.
///
/// # Example
/// ```
/// use evently_store::models::slugify;
///
/// assert_eq!(slugify("Hacktoberfest 2023!!"), "hacktoberfest-2023");
/// assert_eq!(slugify("  Multiple   Spaces -- Here "), "multiple-spaces-here");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(lowered.trim(), "");
    let hyphenated = WHITESPACE_RUN_RE.replace_all(&stripped, "-");
    let squeezed = HYPHEN_RUN_RE.replace_all(&hyphenated, "-");
    squeezed.trim_matches('-').to_owned()
}

/// Parse a date in any accepted input form.
///
/// Timestamps with an offset are converted to UTC before the calendar date
/// is taken.
pub fn parse_event_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "date" });
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        })
        .ok_or(ValidationError::InvalidFormat {
            field: "date",
            reason: "invalid date format",
        })
}

/// Parse a date and render it as `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Result<String, ValidationError> {
    parse_event_date(raw).map(|d| d.format(CANONICAL_DATE_FORMAT).to_string())
}

/// Trim a time string; it must not end up empty.
pub fn normalize_time(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "time" });
    }
    Ok(trimmed.to_owned())
}

/// How attendees take part in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventMode {
    Online,
    Offline,
    Hybrid,
}

impl EventMode {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Hybrid => "hybrid",
        }
    }
}

impl FromStr for EventMode {
    type Err = ValidationError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(ValidationError::InvalidVariant {
                field: "mode",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for EventMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writable event fields, used to track what changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Title,
    Description,
    Overview,
    Image,
    Venue,
    Location,
    Date,
    Time,
    Mode,
    Audience,
    Agenda,
    Organizer,
    Tags,
}

impl EventField {
    /// Every field; a fresh insert counts all of them as changed.
    pub const ALL: [EventField; 13] = [
        Self::Title,
        Self::Description,
        Self::Overview,
        Self::Image,
        Self::Venue,
        Self::Location,
        Self::Date,
        Self::Time,
        Self::Mode,
        Self::Audience,
        Self::Agenda,
        Self::Organizer,
        Self::Tags,
    ];
}

/// Raw, caller-supplied event fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    pub title: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub mode: String,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
}

/// Partial update. `Some` fields are written and count as changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub overview: Option<String>,
    pub image: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub mode: Option<String>,
    pub audience: Option<String>,
    pub agenda: Option<Vec<String>>,
    pub organizer: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl EventPatch {
    /// Write the patch into `fields`, returning the fields it touched.
    pub fn apply(self, fields: &mut EventFields) -> Vec<EventField> {
        let EventPatch {
            title,
            description,
            overview,
            image,
            venue,
            location,
            date,
            time,
            mode,
            audience,
            agenda,
            organizer,
            tags,
        } = self;
        let mut changed = Vec::new();

        macro_rules! set {
            ($name:ident, $field:expr) => {
                if let Some(value) = $name {
                    fields.$name = value;
                    changed.push($field);
                }
            };
        }

        set!(title, EventField::Title);
        set!(description, EventField::Description);
        set!(overview, EventField::Overview);
        set!(image, EventField::Image);
        set!(venue, EventField::Venue);
        set!(location, EventField::Location);
        set!(date, EventField::Date);
        set!(time, EventField::Time);
        set!(mode, EventField::Mode);
        set!(audience, EventField::Audience);
        set!(agenda, EventField::Agenda);
        set!(organizer, EventField::Organizer);
        set!(tags, EventField::Tags);

        changed
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.overview.is_none()
            && self.image.is_none()
            && self.venue.is_none()
            && self.location.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.mode.is_none()
            && self.audience.is_none()
            && self.agenda.is_none()
            && self.organizer.is_none()
            && self.tags.is_none()
    }
}

/// An event on its way to storage: raw fields plus the derived slug.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub fields: EventFields,
    pub slug: String,
}

impl EventDraft {
    /// Draft for a new event. The slug is derived in `before_persist`.
    pub fn new(fields: EventFields) -> Self {
        Self {
            fields,
            slug: String::new(),
        }
    }

    /// Normalization that runs right before each write.
    ///
    /// - `Title` changed: recompute the slug. A title with nothing
    ///   slug-worthy in it is rejected rather than stored with an empty key.
    /// - `Date` changed: canonicalize to `YYYY-MM-DD`.
    /// - `Time` changed: trim, reject if empty.
    pub fn before_persist(&mut self, changed: &[EventField]) -> Result<(), ValidationError> {
        if changed.contains(&EventField::Title) {
            if self.fields.title.trim().is_empty() {
                return Err(ValidationError::Empty { field: "title" });
            }
            let slug = slugify(&self.fields.title);
            if slug.is_empty() {
                return Err(ValidationError::InvalidFormat {
                    field: "title",
                    reason: "title must contain at least one letter or digit",
                });
            }
            self.slug = slug;
        }

        if changed.contains(&EventField::Date) {
            self.fields.date = normalize_date(&self.fields.date)?;
        }

        if changed.contains(&EventField::Time) {
            self.fields.time = normalize_time(&self.fields.time)?;
        }

        Ok(())
    }

    /// Field-level validation run on every persist.
    pub fn validate(self) -> Result<ValidEvent, ValidationError> {
        let EventDraft { fields, slug } = self;

        if slug.is_empty() {
            return Err(ValidationError::Empty { field: "slug" });
        }

        Ok(ValidEvent {
            title: required("title", fields.title)?,
            slug,
            description: required("description", fields.description)?,
            overview: required("overview", fields.overview)?,
            image: required("image", fields.image)?,
            venue: required("venue", fields.venue)?,
            location: required("location", fields.location)?,
            date: parse_event_date(&fields.date)?,
            time: normalize_time(&fields.time)?,
            mode: fields.mode.parse()?,
            audience: required("audience", fields.audience)?,
            agenda: items("agenda", "agenda item", fields.agenda)?,
            organizer: required("organizer", fields.organizer)?,
            tags: dedup(items("tags", "tag", fields.tags)?),
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_owned())
}

fn items(
    field: &'static str,
    item_field: &'static str,
    values: Vec<String>,
) -> Result<Vec<String>, ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::EmptyList { field });
    }
    values
        .into_iter()
        .map(|v| required(item_field, v))
        .collect()
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Normalized, validated event ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEvent {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: NaiveDate,
    pub time: String,
    pub mode: EventMode,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
}

/// Stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub time: String,
    pub mode: EventMode,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Draft carrying this event's current values, for updates.
    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            fields: EventFields {
                title: self.title.clone(),
                description: self.description.clone(),
                overview: self.overview.clone(),
                image: self.image.clone(),
                venue: self.venue.clone(),
                location: self.location.clone(),
                date: self.date.format(CANONICAL_DATE_FORMAT).to_string(),
                time: self.time.clone(),
                mode: self.mode.as_str().to_owned(),
                audience: self.audience.clone(),
                agenda: self.agenda.clone(),
                organizer: self.organizer.clone(),
                tags: self.tags.clone(),
            },
            slug: self.slug.clone(),
        }
    }
}

/// Query filter for listing events. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub date: Option<NaiveDate>,
    pub mode: Option<EventMode>,
    pub tag: Option<String>,
    pub page: Pagination,
}

impl EventFilter {
    /// Restrict to one calendar day; accepts any supported date form.
    pub fn with_date(mut self, raw: &str) -> Result<Self, ValidationError> {
        self.date = Some(parse_event_date(raw)?);
        Ok(self)
    }

    pub fn with_mode(mut self, raw: &str) -> Result<Self, ValidationError> {
        self.mode = Some(raw.parse()?);
        Ok(self)
    }

    pub fn with_tag(mut self, tag: &str) -> Result<Self, ValidationError> {
        self.tag = Some(required("tag", tag.to_owned())?);
        Ok(self)
    }

    pub fn with_page(mut self, page: Pagination) -> Self {
        self.page = page;
        self
    }
}
