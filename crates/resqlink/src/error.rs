//! Error types for resqlink.
//!
//! This module defines all error types used throughout the resqlink crate.
//! Domain errors carry the user-facing message the HTTP layer returns as-is;
//! infrastructure errors keep their source for logging.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for resqlink operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// The request was malformed or violated a business rule.
    #[error("{message}")]
    Validation {
        /// Human-readable description of the problem.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// The record would collide with an existing one.
    #[error("{message}")]
    Conflict {
        /// Human-readable description of the collision.
        message: String,
    },

    /// A distribution asked for more than an inventory line holds.
    #[error("Insufficient stock for {item}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        /// Item name of the inventory line.
        item: String,
        /// Quantity currently on hand.
        available: f64,
        /// Quantity the distribution asked for.
        requested: f64,
    },

    /// Login failed.
    #[error("{message}")]
    InvalidCredentials {
        /// Message shown to the caller.
        message: String,
    },

    /// A bearer token was missing, invalid or lacked the required role.
    #[error("{message}")]
    Unauthorized {
        /// Message shown to the caller.
        message: String,
    },

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

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored document could not be decoded.
    #[error("corrupt {collection} document {id}: {source}")]
    CorruptDocument {
        /// Collection the document lives in.
        collection: &'static str,
        /// Document id.
        id: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
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

    // === Auth Errors ===
    /// Password hashing or verification failed internally.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Signing or decoding a token failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

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

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for resqlink operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an invalid-credentials error with the message shown to the caller.
    #[must_use]
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is the caller's fault (bad input, unknown login,
    /// stock shortfall, duplicate).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Conflict { .. }
                | Self::InsufficientStock { .. }
                | Self::InvalidCredentials { .. }
        )
    }

    /// Check if this error is an authentication or authorization failure.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Check if this error means a referenced record is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
