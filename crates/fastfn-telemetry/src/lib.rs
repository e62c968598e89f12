//! # fastfn Telemetry
//!
//! Logging setup for fastfn functions, built on `tracing-subscriber`.
//!
//! - [`init_logging`] installs a JSON, pretty or compact formatter behind
//!   an `EnvFilter`.
//! - [`request_span`] opens the span one invocation logs under.
//! - [`fields`] lists the field names used across the workspace.

#![doc(html_root_url = "https://docs.rs/fastfn-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, request_span, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
