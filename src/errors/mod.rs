//! # Error Handling
//!
//! Error types for the sealbox secrets manager, using `thiserror`.
//! All domain errors are recovered at the gRPC boundary and mapped to status
//! codes there; nothing in this module leaks sensitive material through
//! `Display`.

/// Custom result type for sealbox operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sealbox secrets manager
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Master key file missing, malformed, or wrong length. Fatal at startup:
    /// the service cannot serve any request without a valid master key.
    #[error("Master key error: {0}")]
    MasterKey(String),

    /// Request validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// A record with the same name already exists within the kind
    #[error("Resource conflict: {resource_type} with key_name '{key_name}' already exists")]
    Conflict {
        resource_type: String,
        key_name: String,
    },

    /// No record with the given name exists within the kind
    #[error("Resource not found: {resource_type} with key_name '{key_name}'")]
    NotFound {
        resource_type: String,
        key_name: String,
    },

    /// Authentication-tag mismatch on decrypt. Deliberately carries no detail:
    /// wrong master key, corruption, and tampering must be indistinguishable
    /// to callers.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Network transport errors (gRPC)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new master key error
    pub fn master_key<S: Into<String>>(message: S) -> Self {
        Self::MasterKey(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error scoped to a single field
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new database error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database {
            source,
            context: context.into(),
        }
    }

    /// Create a new conflict error
    pub fn conflict<R: Into<String>, K: Into<String>>(resource_type: R, key_name: K) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            key_name: key_name.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<R: Into<String>, K: Into<String>>(resource_type: R, key_name: K) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            key_name: key_name.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new I/O error with context
    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation {
            message: errors.to_string(),
            field: None,
        }
    }
}
