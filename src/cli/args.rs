//! CLI argument definitions using clap
//!
//! Commands:
//! - rollcall create-event --name <name> --date <rfc3339>
//! - rollcall sweep [--now <rfc3339>]
//! - rollcall phase --event <id>
//! - rollcall signup --event <id> --user <id> [--group <id>]...
//! - rollcall remove --event <id> --user <id>
//! - rollcall lists --event <id>

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Rollcall - signup lists for capacity-limited recurring events
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./rollcall.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register an event from the default event-type settings
    CreateEvent {
        #[arg(long)]
        name: String,

        /// Start time
        #[arg(long)]
        date: DateTime<Utc>,

        #[arg(long)]
        max_signups: Option<u32>,

        #[arg(long)]
        roster_group: Option<Uuid>,

        #[arg(long)]
        first_priority_group: Option<Uuid>,

        #[arg(long)]
        second_priority_group: Option<Uuid>,

        /// Pin the phase; sweeps will not move this event
        #[arg(long)]
        manual: bool,
    },

    /// Advance every event to its time-derived phase
    Sweep {
        /// Evaluation time (defaults to the wall clock)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Show the stored and resolved phase of one event
    Phase {
        #[arg(long)]
        event: Uuid,

        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Sign a member up
    Signup {
        #[arg(long)]
        event: Uuid,

        #[arg(long)]
        user: Uuid,

        /// Group the member belongs to (repeatable)
        #[arg(long = "group")]
        groups: Vec<Uuid>,

        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Remove a member from an event
    Remove {
        #[arg(long)]
        event: Uuid,

        #[arg(long)]
        user: Uuid,
    },

    /// Show the three lists of one event
    Lists {
        #[arg(long)]
        event: Uuid,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
