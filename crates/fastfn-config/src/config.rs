//! Configuration types.

use fastfn_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete function configuration.
///
/// # Example
///
/// ```
/// use fastfn_config::FastfnConfig;
///
/// let config = FastfnConfig::default();
/// assert_eq!(config.app.title, "fastfn");
/// assert!(!config.app.debug);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct FastfnConfig {
    /// Application metadata and behavior.
    #[serde(default)]
    pub app: AppSettings,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl FastfnConfig {
    /// Verbose, human-readable, with fault details in responses.
    #[must_use]
    pub fn development() -> Self {
        Self {
            app: AppSettings {
                debug: true,
                ..AppSettings::default()
            },
            logging: LoggingSettings {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
                ..LoggingSettings::default()
            },
        }
    }

    /// JSON logs at `info`, fault details hidden.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the title is empty or the
    /// log level is not a valid filter directive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.title.trim().is_empty() {
            return Err(ConfigError::invalid_value("app.title", "must not be empty"));
        }
        if self.logging.enabled {
            fastfn_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }
        Ok(())
    }
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct AppSettings {
    /// Application title.
    pub title: String,

    /// Application version.
    pub version: String,

    /// Free-form description.
    pub description: String,

    /// Put fault details into error responses.
    pub debug: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: "fastfn".to_string(),
            version: "0.1.0".to_string(),
            description: String::new(),
            debug: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

impl From<LogFormat> for fastfn_telemetry::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingSettings {
    /// Whether to install a subscriber at all.
    pub enabled: bool,

    /// Filter directive.
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Include file and line of each event.
    pub include_location: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            enabled: settings.enabled,
            level: settings.level.clone(),
            format: settings.format.into(),
            span_events: false,
            include_location: settings.include_location,
            include_target: true,
        }
    }
}
