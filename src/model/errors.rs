//! # Configuration Errors

use thiserror::Error;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Invalid event configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{earlier} ({earlier_minutes}) must be >= {later} ({later_minutes})")]
    WindowOrder {
        earlier: &'static str,
        earlier_minutes: u32,
        later: &'static str,
        later_minutes: u32,
    },
}
