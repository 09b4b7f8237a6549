//! Error types for itvtrack.
//!
//! This module defines all error types used throughout the itvtrack crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for itvtrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// The database was written with a newer schema than this build knows.
    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaVersion {
        /// Version recorded in the database.
        found: i32,
        /// Highest version this build can read.
        supported: i32,
    },

    /// The key-value surface refused a write (quota exhausted, read-only, ...).
    #[error("storage refused write for key '{key}': {message}")]
    StorageQuota {
        /// Key that was being written.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// A form or stored record does not satisfy the record schema.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the validation failure.
        message: String,
    },

    /// A date field is not a `YYYY-MM-DD` calendar date.
    #[error("invalid date for {field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// No record with the given identifier exists.
    #[error("no inspection record with id '{id}'")]
    RecordNotFound {
        /// The identifier that was looked up.
        id: String,
    },

    // === Sync Errors ===
    /// Sign-in against the document store failed.
    #[error("sign-in failed: {0}")]
    AuthFailed(String),

    /// The remote document store reported a failure.
    #[error("sync error: {0}")]
    Sync(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for itvtrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid record error.
    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Create a record-not-found error.
    #[must_use]
    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Create a new sync error.
    #[must_use]
    pub fn sync(message: impl Into<String>) -> Self {
        Self::Sync(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a validation rejection of user input.
    ///
    /// Rejections leave the collection and storage untouched.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidRecord { .. } | Self::InvalidDate { .. } | Self::RecordNotFound { .. }
        )
    }

    /// Check if this error came from the persistence layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::SchemaVersion { .. }
                | Self::StorageQuota { .. }
                | Self::Io(_)
                | Self::DirectoryCreate { .. }
                | Self::Json(_)
        )
    }
}
