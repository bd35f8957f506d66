//! Error types for configuration loading

use thiserror::Error;

/// Errors that can occur while resolving the storage configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// A variable is set but cannot be used
    #[error("Invalid value for {name}: {reason}")]
    Invalid {
        /// Name of the offending variable
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}
