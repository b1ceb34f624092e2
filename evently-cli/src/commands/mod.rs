//! Command implementations for the evently CLI

pub mod booking;
pub mod event;
pub mod schema;

pub use booking::run_booking;
pub use event::run_event;
pub use schema::run_schema;

use anyhow::Result;
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
