//! In-memory configuration store for tests and demos

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{ConfigBackend, ConfigTarget};
use crate::error::PersistenceError;
use crate::schema::ConfigScope;
use crate::store::ConfigValues;

/// One accepted or attempted save, in call order
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct SaveRecord {
    pub target: ConfigTarget,
    pub scope: ConfigScope,
    pub values: ConfigValues,
    pub accepted: bool,
}

/// In-memory implementation of [`ConfigBackend`]
///
/// Clones share state, so a test can keep a handle while the engine uses
/// another one.
///
/// # Example
/// ```
/// use plugconf::error::PersistenceError;
/// use plugconf::persistence::{ConfigBackend, ConfigTarget, MemoryBackend};
/// use plugconf::schema::ConfigScope;
/// use plugconf::store::ConfigValues;
///
/// let backend = MemoryBackend::new();
/// backend
///     .fail_next_save(PersistenceError::Application {
///         code: 500,
///         message: "db unavailable".to_owned(),
///     })
///     .unwrap();
///
/// let target = ConfigTarget::new("analytics", "1");
/// let result = backend.save(&target, ConfigScope::Enterprise, &ConfigValues::new());
/// assert!(result.is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<(ConfigTarget, ConfigScope), ConfigValues>,
    /// Consumed one per save, before the save is applied
    save_failures: VecDeque<PersistenceError>,
    load_failures: VecDeque<PersistenceError>,
    log: Vec<SaveRecord>,
}

impl MemoryBackend {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, PersistenceError> {
        self.state
            .read()
            .map_err(|e| PersistenceError::Io(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, PersistenceError> {
        self.state
            .write()
            .map_err(|e| PersistenceError::Io(e.to_string()))
    }

    /// Seed saved values (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn with_values(
        self,
        target: &ConfigTarget,
        scope: ConfigScope,
        values: ConfigValues,
    ) -> Result<Self, PersistenceError> {
        let mut state = self.write()?;
        state.values.insert((target.clone(), scope), values);
        drop(state);
        Ok(self)
    }

    /// Make the next save fail with `error`
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn fail_next_save(&self, error: PersistenceError) -> Result<(), PersistenceError> {
        self.write()?.save_failures.push_back(error);
        Ok(())
    }

    /// Make the next load fail with `error`
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn fail_next_load(&self, error: PersistenceError) -> Result<(), PersistenceError> {
        self.write()?.load_failures.push_back(error);
        Ok(())
    }

    /// Values currently stored for one scope
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn stored(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
    ) -> Result<Option<ConfigValues>, PersistenceError> {
        Ok(self.read()?.values.get(&(target.clone(), scope)).cloned())
    }

    /// Every save attempt so far
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn save_log(&self) -> Result<Vec<SaveRecord>, PersistenceError> {
        Ok(self.read()?.log.clone())
    }
}

impl ConfigBackend for MemoryBackend {
    fn load(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
    ) -> Result<ConfigValues, PersistenceError> {
        let mut state = self.write()?;
        if let Some(error) = state.load_failures.pop_front() {
            return Err(error);
        }
        Ok(state
            .values
            .get(&(target.clone(), scope))
            .cloned()
            .unwrap_or_default())
    }

    fn save(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
        values: &ConfigValues,
    ) -> Result<(), PersistenceError> {
        let mut state = self.write()?;
        let failure = state.save_failures.pop_front();

        state.log.push(SaveRecord {
            target: target.clone(),
            scope,
            values: values.clone(),
            accepted: failure.is_none(),
        });

        if let Some(error) = failure {
            return Err(error);
        }

        state.values.insert((target.clone(), scope), values.clone());
        Ok(())
    }
}
