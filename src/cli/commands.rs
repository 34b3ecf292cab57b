//! CLI command implementations
//!
//! Each command opens the state file, runs one engine operation against
//! it and prints the result. The state file is rewritten atomically by
//! the store on every change.
//!
//! A command's `--now` replaces the wall clock everywhere, including the
//! recomputation of legacy phase tags when the state file is read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::lifecycle::resolve_phase;
use crate::model::{Determinant, Event, EventTypeConfig};
use crate::orchestrator::Orchestrator;
use crate::signup::SignupService;
use crate::store::{FileStore, Store};

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::CliResult;
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments, dispatches, and reports failures as a JSON error
/// line before returning them to main.rs.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match run_command(&cli, Utc::now()) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run one command and return its response payload
pub fn run_command(cli: &Cli, wall_clock: DateTime<Utc>) -> CliResult<Value> {
    let config = Config::load(&cli.config)?;
    let now = effective_now(&cli.command, wall_clock);
    let store = Arc::new(FileStore::open(&config.state_file, now)?);

    match &cli.command {
        Command::CreateEvent {
            name,
            date,
            max_signups,
            roster_group,
            first_priority_group,
            second_priority_group,
            manual,
        } => {
            let mut event_type = EventTypeConfig::with_defaults(name.clone());
            if let Some(max) = max_signups {
                event_type.max_signups = *max;
            }
            event_type.roster_group = *roster_group;
            event_type.first_priority_group = *first_priority_group;
            event_type.second_priority_group = *second_priority_group;
            event_type.validate()?;

            let mut event = Event::new(event_type, *date);
            if *manual {
                event.determinant = Determinant::Manual;
            } else {
                event.phase = resolve_phase(&event.config, event.event_date, now);
            }
            store.insert_event(event.clone())?;

            Ok(serde_json::to_value(&event)?)
        }

        Command::Sweep { .. } => {
            let mut orchestrator = Orchestrator::seeded(store, config.shuffle_seed);
            let report = orchestrator.sweep(now)?;

            Ok(json!({
                "clean": report.is_clean(),
                "report": report,
                "metrics": orchestrator.metrics().snapshot(),
            }))
        }

        Command::Phase { event, .. } => phase(store.as_ref(), *event, now),

        Command::Signup {
            event,
            user,
            groups,
            ..
        } => {
            let service = SignupService::new(store);
            let outcome = service.signup(*event, *user, groups, now)?;
            Ok(serde_json::to_value(&outcome)?)
        }

        Command::Remove { event, user } => {
            let service = SignupService::new(store);
            let outcome = service.remove(*event, *user)?;
            Ok(serde_json::to_value(&outcome)?)
        }

        Command::Lists { event } => {
            let service = SignupService::new(store);
            Ok(serde_json::to_value(service.roster_view(*event)?)?)
        }
    }
}

/// The command's `--now` override, or the wall clock.
fn effective_now(command: &Command, wall_clock: DateTime<Utc>) -> DateTime<Utc> {
    match command {
        Command::Sweep { now } | Command::Phase { now, .. } | Command::Signup { now, .. } => {
            now.unwrap_or(wall_clock)
        }
        _ => wall_clock,
    }
}

fn phase<S: Store>(store: &S, event_id: Uuid, now: DateTime<Utc>) -> CliResult<Value> {
    let event = store.get_event(event_id)?;
    let resolved = resolve_phase(&event.config, event.event_date, now);

    Ok(json!({
        "event_id": event.id,
        "stored": event.phase,
        "resolved": resolved,
        "determinant": event.determinant,
        "windows": event.windows(),
    }))
}
