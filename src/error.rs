//! Error taxonomy shared across the crate.

use thiserror::Error;

/// Out-of-range or empty input to a registry or settings operation.
///
/// The operation that produced it has had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Name of the offending input (e.g. `"power_watts"`).
    pub field: &'static str,
    /// Human-readable constraint description.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure reading or writing the key-value persistence provider.
///
/// Never fatal: readers fall back to defaults and writers log and move on.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"monitor.sample_interval_secs"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

/// Failure delivering a notification.
#[derive(Debug, Clone, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);
