//! Operator CLI
//!
//! Runs single engine operations against a JSON state file:
//! - create-event: register an event
//! - sweep: advance every event to its time-derived phase
//! - phase: inspect one event's phase and windows
//! - signup / remove: per-member list changes
//! - lists: roster, overflow and holding of one event

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
