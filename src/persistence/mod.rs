//! Persistence collaborators for configuration values
//!
//! The engine never stores values itself; it hands a scope's complete value
//! map to a [`ConfigBackend`] and reads saved values back from it.
//!
//! # Implementations
//! - `HttpBackend`: the plugin registry API
//! - `FileBackend`: JSON files through the [`System`](crate::system::System) abstraction
//! - `MemoryBackend`: in-memory store with scriptable failures, for tests

pub mod envelope;
pub mod file;
pub mod http;
pub mod memory;

pub use envelope::ApiEnvelope;
pub use file::FileBackend;
pub use http::HttpBackend;
pub use memory::MemoryBackend;

use core::fmt;

use crate::error::PersistenceError;
use crate::schema::ConfigScope;
use crate::store::ConfigValues;

/// Plugin version whose configuration is being edited
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigTarget {
    pub plugin_id: String,
    pub version_id: String,
}

impl ConfigTarget {
    #[inline]
    pub fn new<P: Into<String>, V: Into<String>>(plugin_id: P, version_id: V) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            version_id: version_id.into(),
        }
    }
}

impl fmt::Display for ConfigTarget {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.plugin_id, self.version_id)
    }
}

/// External store for scope-local configuration values
///
/// A save replaces the whole value map of one scope; partial writes must
/// never become visible.
pub trait ConfigBackend: Send + Sync {
    /// Read the saved values of one scope; an unknown target yields an empty map
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] when the store cannot be reached or
    /// rejects the request.
    fn load(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
    ) -> Result<ConfigValues, PersistenceError>;

    /// Replace the saved values of one scope
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] when the store cannot be reached or
    /// rejects the values.
    fn save(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
        values: &ConfigValues,
    ) -> Result<(), PersistenceError>;
}
