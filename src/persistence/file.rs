//! File-backed configuration store
//!
//! Layout: `{root}/{plugin}/{version}/{scope}.json`, one JSON object per scope.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::{ConfigBackend, ConfigTarget};
use crate::error::PersistenceError;
use crate::schema::ConfigScope;
use crate::store::ConfigValues;
use crate::system::System;

/// Stores each scope's values as a JSON file under a root directory
pub struct FileBackend<'a> {
    system: &'a dyn System,
    root: PathBuf,
}

impl<'a> FileBackend<'a> {
    #[inline]
    pub fn new<P: Into<PathBuf>>(system: &'a dyn System, root: P) -> Self {
        Self {
            system,
            root: root.into(),
        }
    }

    #[must_use]
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of one scope's value file
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if an identifier could escape the root.
    #[inline]
    pub fn scope_path(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
    ) -> Result<PathBuf, PersistenceError> {
        check_segment(&target.plugin_id)?;
        check_segment(&target.version_id)?;
        Ok(self
            .root
            .join(&target.plugin_id)
            .join(&target.version_id)
            .join(format!("{scope}.json")))
    }
}

/// Identifiers become directory names, so they must be single safe segments
fn check_segment(segment: &str) -> Result<(), PersistenceError> {
    if segment.trim().is_empty()
        || segment == "."
        || segment.contains("..")
        || segment.contains(['/', '\\'])
    {
        return Err(PersistenceError::Io(format!(
            "Invalid identifier for file storage: '{segment}'"
        )));
    }
    Ok(())
}

impl ConfigBackend for FileBackend<'_> {
    fn load(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
    ) -> Result<ConfigValues, PersistenceError> {
        let path = self.scope_path(target, scope)?;
        if !self.system.exists(&path) {
            debug!("No saved {scope} configuration for {target}");
            return Ok(ConfigValues::new());
        }

        let content = self.system.read_to_string(&path).map_err(|e| {
            PersistenceError::Io(format!("Failed to read {}: {e}", path.display()))
        })?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(values)) => Ok(values),
            Ok(_) => Err(PersistenceError::Decode(format!(
                "{} does not contain a JSON object",
                path.display()
            ))),
            Err(e) => Err(PersistenceError::Decode(format!("{}: {e}", path.display()))),
        }
    }

    fn save(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
        values: &ConfigValues,
    ) -> Result<(), PersistenceError> {
        let path = self.scope_path(target, scope)?;
        if let Some(parent) = path.parent() {
            self.system.create_dir_all(parent).map_err(|e| {
                PersistenceError::Io(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let content = serde_json::to_vec_pretty(values)
            .map_err(|e| PersistenceError::Decode(e.to_string()))?;

        self.system.write_atomic(&path, &content).map_err(|e| {
            PersistenceError::Io(format!("Failed to write {}: {e}", path.display()))
        })?;

        debug!("Saved {} {scope} values for {target}", values.len());
        Ok(())
    }
}
