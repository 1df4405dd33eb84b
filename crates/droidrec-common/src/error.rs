use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration. All of these are
/// fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Device reports a zero coordinate range for axis {axis}")]
    ZeroDeviceRange { axis: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Failures reported by external collaborators (screen capture, element tree
/// dump, foreground screen query, event producer).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: &'static str, millis: u64 },

    #[error("Command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the persisted action log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
