//! Entity shapes with validation at construction
//!
//! Invalid input returns [`ValidationError`], never a panic, and never
//! reaches the database.

pub mod booking;
pub mod event;
pub mod pagination;
pub mod validation;

pub use booking::{Booking, BookingFields, BookingPatch, Email};
pub use event::{
    normalize_date, normalize_time, parse_event_date, slugify, Event, EventDraft, EventField,
    EventFields, EventFilter, EventMode, EventPatch, ValidEvent,
};
pub use pagination::{Paginated, Pagination};
pub use validation::ValidationError;
