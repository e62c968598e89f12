//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or filter directive could not be parsed.
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// The format name is not one of `json`, `pretty` or `compact`.
    #[error("Unknown log format: {0}")]
    UnknownFormat(String),

    /// A global subscriber is already installed.
    ///
    /// Warm serverless containers run initialization more than once; callers
    /// usually ignore this.
    #[error("Logging is already initialized: {0}")]
    AlreadyInitialized(String),
}
