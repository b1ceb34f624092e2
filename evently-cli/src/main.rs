//! evently CLI - operator tooling for the event listing database
//!
//! Drives the evently-store operations from the terminal:
//! - Table and index setup (`schema`)
//! - Event creation, updates and queries (`event`)
//! - Bookings against existing events (`booking`)
//!
//! Configuration comes from the environment (`DATABASE_URL`), with
//! `.env.local` and `.env` loaded first.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evently_store::{ConnectionCache, Models};

mod commands;
mod config;
mod tracing_setup;

use commands::booking::BookingArgs;
use commands::event::EventArgs;

#[derive(Parser, Debug)]
#[command(
    name = "evently",
    author,
    version,
    about = "Manage events and bookings for the event listing site"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the events and bookings tables and indexes if missing
    Schema,
    /// Create and query events
    Event(EventArgs),
    /// Create and query bookings
    Booking(BookingArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_files = config::load_env_files();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();
    for path in &env_files {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let db_config = config::database_config()?;

    let cache = ConnectionCache::postgres(db_config);
    let db = cache
        .acquire()
        .await
        .context("could not connect to the database")?;
    let models = Models::new(db);

    let result = match cli.command {
        Commands::Schema => commands::run_schema(&models).await,
        Commands::Event(args) => commands::run_event(args, &models).await,
        Commands::Booking(args) => commands::run_booking(args, &models).await,
    };

    cache.close().await;
    result
}
