//! # fastfn Config
//!
//! Typed, layered configuration for fastfn functions.
//!
//! ```toml
//! [app]
//! title = "items"
//! version = "1.2.0"
//! debug = false
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Unknown keys are rejected. Every value can be overridden from the
//! environment with `FASTFN__SECTION__KEY` (or any prefix passed to
//! [`ConfigLoader::with_env_prefix`]).

#![doc(html_root_url = "https://docs.rs/fastfn-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{AppSettings, FastfnConfig, LogFormat, LoggingSettings};
pub use error::ConfigError;
pub use loader::ConfigLoader;
