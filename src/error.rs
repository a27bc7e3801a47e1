// src/error.rs

//! Unified error handling for the section extraction pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Recognizer pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The text source could not produce text for one page
    #[error("Page {page} unavailable: {message}")]
    SourceUnavailable { page: u32, message: String },

    /// The text source's backing file could not be opened at all
    #[error("Cannot open source {path}: {message}")]
    SourceOpen { path: String, message: String },

    /// Persisted inventory could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// No job directory and no default-location artifacts
    #[error("Job not found: {0}")]
    JobNotFound(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a per-page source failure.
    pub fn source_unavailable(page: u32, message: impl fmt::Display) -> Self {
        Self::SourceUnavailable {
            page,
            message: message.to_string(),
        }
    }

    /// Create a fatal source-open failure.
    pub fn source_open(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::SourceOpen {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}
