// src/error.rs

use thiserror::Error;

/// Core error types for Gumshield
#[derive(Error, Debug)]
pub enum Error {
    /// Database-related errors (SQLite index backend)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Index database has a schema this build cannot migrate
    #[error("Index schema error: {0}")]
    SchemaError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O errors with the path or operation that failed
    #[error("I/O error: {0}")]
    IoError(String),

    /// Malformed package definition or embedded metadata
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Source download failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// A lifecycle script could not be spawned or exited unsuccessfully
    #[error("{stage} script failed: {reason}")]
    ScriptFailed { stage: String, reason: String },

    /// Package is already present in the index
    #[error("Package '{0}' is already installed")]
    AlreadyInstalled(String),

    /// Package or file not found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Definition lacks lifecycle scripts or a file list
    #[error("Incomplete package definition '{name}': {reason}")]
    IncompleteDefinition { name: String, reason: String },

    /// Install and uninstall need superuser identity
    #[error("Process not running with elevated permission")]
    NotElevated,

    /// Path escapes its root or cannot be used as a file name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias using Gumshield's Error type
pub type Result<T> = std::result::Result<T, Error>;
