//! Domain error types for infiniscroll
//!
//! Provides structured error types for different domains:
//! - `ConfigError` for construction and option updates
//! - `TransportError` for the HTTP collaborator
//! - `PagerError` as the top-level error type

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for infiniscroll
#[derive(Debug, Error)]
pub enum PagerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Could not parse next page URL '{0}'")]
    PathDerivation(String),

    #[error("A template function is required when json responses are auto-appended")]
    TemplateMissing,

    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Errors raised while building or updating a pager
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Paging option `{option}` found no element for '{selector}'")]
    SelectorNotFound { option: &'static str, selector: String },

    #[error("Can not determine path option")]
    PathUndetermined,

    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("Unknown option '{0}'")]
    UnknownOption(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a `Transport`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {0}")]
    Status(u16),
}

/// Result type alias for ConfigError
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for TransportError
pub type TransportResult<T> = std::result::Result<T, TransportError>;
