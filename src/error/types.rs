//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for plugconf operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PlugconfError {
    /// Configuration Error - missing or invalid tool settings
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Schema Error - plugin configuration schema could not be loaded
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// Validation Error - one or more fields failed validation
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Persistence Error - the configuration store rejected or failed a request
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Filesystem Error - file operation failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },
}

impl PlugconfError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } => 1,
            Self::Schema { .. } => 2,
            Self::Validation { .. } => 3,
            Self::Persistence { .. } => 4,
            Self::Filesystem { .. } => 5,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a schema error
    #[inline]
    pub fn schema<S: Into<String>>(message: S) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a validation error
    #[inline]
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a persistence error
    #[inline]
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }
}

/// Errors raised while loading a plugin configuration schema
///
/// A schema that fails to load is never rendered; callers surface it as
/// "no configuration available".
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("Schema document is malformed: {0}")]
    Malformed(String),

    #[error("Schema document does not match the schema format:\n{0}")]
    Format(String),

    #[error("Field '{key}' is missing a type")]
    MissingType { key: String },

    #[error("Field '{key}' has unknown type '{type_name}'")]
    UnknownType { key: String, type_name: String },

    #[error("Field '{key}' has unknown config scope '{scope}'. Must be 'enterprise' or 'personal'")]
    UnknownScope { key: String, scope: String },

    #[error("Field '{key}' is a {type_name} field and needs at least one option")]
    MissingOptions { key: String, type_name: String },

    #[error("Field '{key}' lists option value '{value}' more than once")]
    DuplicateOption { key: String, value: String },

    #[error("Field key '{key}' is declared more than once")]
    DuplicateKey { key: String },

    #[error("Required key '{key}' is not a declared property")]
    UnknownRequired { key: String },

    #[error("Field '{key}' has an invalid pattern: {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },

    #[error("Field '{key}' has inconsistent constraints: {detail}")]
    InvalidConstraints { key: String, detail: String },

    #[error("Default value for field '{key}' does not fit type {type_name}")]
    InvalidDefault { key: String, type_name: String },
}

/// Errors reported by a persistence collaborator
///
/// Transport failures and application-level rejections are distinct variants
/// so callers can tell a dead network from a backend that said no.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PersistenceError {
    /// Request never produced a usable response (network, timeout, non-2xx status)
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Backend answered with an envelope whose code is not 200
    #[error("{message}")]
    Application { code: i64, message: String },

    /// Local storage failure (file backend)
    #[error("{0}")]
    Io(String),

    /// Response or stored payload could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl PersistenceError {
    /// The message shown to the user for this failure
    #[must_use]
    #[inline]
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether the failure happened below the application protocol
    #[must_use]
    #[inline]
    pub const fn is_transport(&self) -> bool {
        matches!(*self, Self::Transport { .. } | Self::Io(_))
    }
}

impl From<SchemaError> for PlugconfError {
    #[inline]
    fn from(err: SchemaError) -> Self {
        Self::schema(err.to_string())
    }
}

impl From<PersistenceError> for PlugconfError {
    #[inline]
    fn from(err: PersistenceError) -> Self {
        Self::persistence(err.to_string())
    }
}
