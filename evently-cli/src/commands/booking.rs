//! Booking commands - create and list reservations

use anyhow::Result;
use clap::{Parser, Subcommand};
use evently_store::models::BookingFields;
use evently_store::Models;
use uuid::Uuid;

use super::print_json;

#[derive(Parser, Debug)]
#[command(about = "Create and query bookings")]
pub struct BookingArgs {
    #[command(subcommand)]
    pub command: BookingCommand,
}

#[derive(Subcommand, Debug)]
pub enum BookingCommand {
    /// Book a seat at an event
    Create {
        /// Event id
        #[arg(long = "event")]
        event_id: Uuid,
        /// Attendee email address
        #[arg(long)]
        email: String,
    },
    /// List bookings for an event
    List {
        /// Event id
        #[arg(long = "event")]
        event_id: Uuid,
        /// Only bookings for this email address
        #[arg(long)]
        email: Option<String>,
    },
}

pub async fn run_booking(args: BookingArgs, models: &Models) -> Result<()> {
    match args.command {
        BookingCommand::Create { event_id, email } => {
            let booking = models
                .bookings()
                .create(BookingFields { event_id, email })
                .await?;
            print_json(&booking)
        }
        BookingCommand::List { event_id, email } => {
            let bookings = match email {
                Some(email) => {
                    models
                        .bookings()
                        .find_by_event_and_email(event_id, &email)
                        .await?
                }
                None => models.bookings().find_by_event(event_id).await?,
            };
            print_json(&bookings)
        }
    }
}
