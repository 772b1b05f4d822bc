//! Mock system implementation for testing

use super::System;
use std::collections::{HashMap, HashSet};
use std::env::VarError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory implementation of System trait for testing
///
/// Clones share state, so a test can inspect what the code under test wrote.
///
/// # Example
/// ```
/// use plugconf::system::{MockSystem, System};
/// use std::path::Path;
///
/// let system = MockSystem::new()
///     .with_env("PLUGCONF_DATA_DIR", "/srv/plugconf").unwrap()
///     .with_file("/srv/plugconf/analytics/3/enterprise.json", b"{}").unwrap();
///
/// assert_eq!(system.env_var("PLUGCONF_DATA_DIR").unwrap(), "/srv/plugconf");
/// assert!(system.exists(Path::new("/srv/plugconf/analytics/3")));
/// ```
#[derive(Debug, Clone)]
pub struct MockSystem {
    state: Arc<RwLock<MockSystemState>>,
}

#[derive(Debug)]
struct MockSystemState {
    env_vars: HashMap<String, String>,
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    /// Directories under which every write fails
    read_only: HashSet<PathBuf>,
}

impl MockSystem {
    /// Create a new `MockSystem` with an empty root
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockSystemState {
                env_vars: HashMap::new(),
                files: HashMap::new(),
                dirs: HashSet::from([PathBuf::from("/")]),
                read_only: HashSet::new(),
            })),
        }
    }

    fn read(&self) -> io::Result<RwLockReadGuard<'_, MockSystemState>> {
        self.state
            .read()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn write(&self) -> io::Result<RwLockWriteGuard<'_, MockSystemState>> {
        self.state
            .write()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    /// Set an environment variable (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn with_env(self, key: &str, value: &str) -> io::Result<Self> {
        let mut state = self.write()?;
        state.env_vars.insert(key.to_owned(), value.to_owned());
        drop(state);
        Ok(self)
    }

    /// Add a file with contents, creating its parent directories (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn with_file<P: AsRef<Path>>(self, path: P, contents: &[u8]) -> io::Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut state = self.write()?;
        if let Some(parent) = path_buf.parent() {
            insert_with_ancestors(&mut state.dirs, parent);
        }
        state.files.insert(path_buf, contents.to_vec());
        drop(state);
        Ok(self)
    }

    /// Add a directory (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn with_dir<P: AsRef<Path>>(self, path: P) -> io::Result<Self> {
        let mut state = self.write()?;
        insert_with_ancestors(&mut state.dirs, path.as_ref());
        drop(state);
        Ok(self)
    }

    /// Make every write below `path` fail with `PermissionDenied` (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state lock is poisoned.
    #[inline]
    pub fn with_read_only<P: AsRef<Path>>(self, path: P) -> io::Result<Self> {
        let mut state = self.write()?;
        state.read_only.insert(path.as_ref().to_path_buf());
        drop(state);
        Ok(self)
    }

    /// Current contents of a file as text, if it exists
    #[must_use]
    #[inline]
    pub fn contents<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        let state = self.read().ok()?;
        let bytes = state.files.get(path.as_ref())?;
        String::from_utf8(bytes.clone()).ok()
    }

    fn check_writable(state: &MockSystemState, path: &Path) -> io::Result<()> {
        if state.read_only.iter().any(|dir| path.starts_with(dir)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Read-only location: {}", path.display()),
            ));
        }
        Ok(())
    }
}

fn insert_with_ancestors(dirs: &mut HashSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

impl Default for MockSystem {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl System for MockSystem {
    #[inline]
    #[expect(clippy::map_err_ignore, reason = "VarError carries no detail")]
    fn env_var(&self, key: &str) -> Result<String, VarError> {
        let state = self.read().map_err(|_| VarError::NotPresent)?;
        state.env_vars.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[inline]
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.read()?;
        let bytes = state.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )
        })?;
        drop(state);
        String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {e}")))
    }

    #[inline]
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.write()?;
        Self::check_writable(&state, path)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !state.dirs.contains(parent)
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Parent directory does not exist: {}", parent.display()),
            ));
        }

        state.files.insert(path.to_path_buf(), contents.to_vec());
        drop(state);
        Ok(())
    }

    #[inline]
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write()?;
        Self::check_writable(&state, path)?;
        insert_with_ancestors(&mut state.dirs, path);
        drop(state);
        Ok(())
    }

    #[inline]
    fn exists(&self, path: &Path) -> bool {
        self.read()
            .is_ok_and(|state| state.files.contains_key(path) || state.dirs.contains(path))
    }

    #[inline]
    fn is_file(&self, path: &Path) -> bool {
        self.read().is_ok_and(|state| state.files.contains_key(path))
    }
}
