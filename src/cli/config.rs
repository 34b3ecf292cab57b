//! Configuration file for the operator CLI

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event};

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON snapshot holding events and signups (required)
    pub state_file: PathBuf,

    /// Seed for the holding shuffle; entropy when absent
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config = Self::parse(&content)?;

        let path_str = path.display().to_string();
        let seeded = config.shuffle_seed.is_some().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path_str.as_str()), ("seeded", seeded.as_str())],
        );

        Ok(config)
    }

    fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.state_file.as_os_str().is_empty() {
            return Err(CliError::config_error("state_file must not be empty"));
        }

        if self.state_file.is_dir() {
            return Err(CliError::config_error(format!(
                "state_file {:?} is a directory",
                self.state_file
            )));
        }

        Ok(())
    }
}
