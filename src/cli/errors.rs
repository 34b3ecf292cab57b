//! CLI-specific error types
//!
//! Every CLI error ends the invocation with a JSON error line and a
//! non-zero exit.

use std::fmt;
use std::io;

use crate::model::ConfigError;
use crate::orchestrator::OrchestratorError;
use crate::signup::SignupError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or event-type settings rejected
    ConfigError,
    /// I/O error (stdout, state file)
    IoError,
    /// State file could not be read or written
    StoreError,
    /// Event does not exist
    NotFound,
    /// Signup or removal refused
    Rejected,
    /// Sweep could not run
    SweepFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ROLLCALL_CLI_CONFIG_ERROR",
            Self::IoError => "ROLLCALL_CLI_IO_ERROR",
            Self::StoreError => "ROLLCALL_CLI_STORE_ERROR",
            Self::NotFound => "ROLLCALL_CLI_NOT_FOUND",
            Self::Rejected => "ROLLCALL_CLI_REJECTED",
            Self::SweepFailed => "ROLLCALL_CLI_SWEEP_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        let code = match e {
            StoreError::EventNotFound(_) => CliErrorCode::NotFound,
            _ => CliErrorCode::StoreError,
        };
        Self::new(code, e.to_string())
    }
}

impl From<SignupError> for CliError {
    fn from(e: SignupError) -> Self {
        match e {
            SignupError::Store(inner) => inner.into(),
            missing @ SignupError::NotFound(_) => {
                Self::new(CliErrorCode::NotFound, missing.to_string())
            }
            other => Self::new(
                CliErrorCode::Rejected,
                format!("{}: {}", other.code(), other),
            ),
        }
    }
}

impl From<OrchestratorError> for CliError {
    fn from(e: OrchestratorError) -> Self {
        Self::new(CliErrorCode::SweepFailed, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
