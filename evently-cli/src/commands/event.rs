//! Event commands - create, show, list
//!
//! `create` reads a JSON object with the event fields:
//!   { "title": "...", "date": "2025-10-05", "mode": "online", "tags": [...], ... }

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use evently_store::models::{EventFields, EventFilter, EventPatch, Pagination};
use evently_store::Models;
use uuid::Uuid;

use super::print_json;

#[derive(Parser, Debug)]
#[command(about = "Create and query events")]
pub struct EventArgs {
    #[command(subcommand)]
    pub command: EventCommand,
}

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Create an event from a JSON file ("-" reads stdin)
    Create {
        /// Path to a JSON file with the event fields
        file: PathBuf,
    },
    /// Update fields of an existing event from a JSON patch file ("-" reads stdin)
    Update {
        /// Event id
        id: Uuid,
        /// Path to a JSON file with the fields to change
        file: PathBuf,
    },
    /// Show one event by slug
    Show {
        /// Event slug, e.g. "hacktoberfest-2023"
        slug: String,
    },
    /// List events, optionally filtered
    List {
        /// Only events on this date (any supported date form)
        #[arg(long)]
        date: Option<String>,
        /// Only events with this mode (online, offline, hybrid)
        #[arg(long)]
        mode: Option<String>,
        /// Only events carrying this tag
        #[arg(long)]
        tag: Option<String>,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Events per page (max 100)
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
}

pub async fn run_event(args: EventArgs, models: &Models) -> Result<()> {
    match args.command {
        EventCommand::Create { file } => {
            let fields: EventFields = read_json(&file)?;
            let event = models.events().create(fields).await?;
            print_json(&event)
        }
        EventCommand::Update { id, file } => {
            let patch: EventPatch = read_json(&file)?;
            let event = models.events().update(id, patch).await?;
            print_json(&event)
        }
        EventCommand::Show { slug } => match models.events().find_by_slug(&slug).await? {
            Some(event) => print_json(&event),
            None => bail!("no event with slug '{slug}'"),
        },
        EventCommand::List {
            date,
            mode,
            tag,
            page,
            per_page,
        } => {
            let mut filter = EventFilter::default().with_page(Pagination::new(page, per_page));
            if let Some(date) = date {
                filter = filter.with_date(&date)?;
            }
            if let Some(mode) = mode {
                filter = filter.with_mode(&mode)?;
            }
            if let Some(tag) = tag {
                filter = filter.with_tag(&tag)?;
            }
            let events = models.events().list(&filter).await?;
            print_json(&events)
        }
    }
}

/// Parse JSON from a file path, or from stdin when the path is "-".
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };

    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}
