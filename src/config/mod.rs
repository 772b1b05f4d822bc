//! Settings management module
//!
//! Handles `plugconf.yaml` parsing, JSON schema validation, environment
//! overrides and construction of the persistence backend.

pub mod schema;
pub mod validation;
pub mod yaml;

use core::time::Duration;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PlugconfError;
use crate::persistence::{ConfigBackend, FileBackend, HttpBackend};
use crate::session::SessionSettings;
use crate::system::System;

/// Settings file looked up when `--config` is not given
pub const DEFAULT_SETTINGS_FILE: &str = "./plugconf.yaml";

/// Overrides `backend.baseUrl`
pub const BASE_URL_ENV: &str = "PLUGCONF_BASE_URL";

/// Overrides `backend.root`
pub const DATA_DIR_ENV: &str = "PLUGCONF_DATA_DIR";

/// Which persistence collaborator to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendSettings {
    pub kind: BackendKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    #[inline]
    fn default() -> Self {
        Self {
            kind: BackendKind::File,
            root: None,
            base_url: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub display_interval_ms: u64,
    pub live_validation: bool,
}

impl Default for SessionConfig {
    #[inline]
    fn default() -> Self {
        Self {
            display_interval_ms: 3000,
            live_validation: false,
        }
    }
}

/// Contents of `plugconf.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub session: SessionConfig,
}

impl Settings {
    /// Load settings, falling back to defaults when the default file is absent
    ///
    /// `path` is the value of `--config`; `None` means the default location,
    /// which may be missing. Environment overrides are applied afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any file fails to
    /// parse or validate.
    #[inline]
    pub fn load(system: &dyn System, path: Option<&str>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => yaml::load_settings(system, path)?,
            None if system.exists(std::path::Path::new(DEFAULT_SETTINGS_FILE)) => {
                yaml::load_settings(system, DEFAULT_SETTINGS_FILE)?
            }
            None => {
                debug!("No {DEFAULT_SETTINGS_FILE} found, using built-in settings");
                Self::default()
            }
        };

        settings.apply_env(system);
        validation::validate_settings(&settings).context("Settings validation failed")?;
        Ok(settings)
    }

    /// Apply `PLUGCONF_BASE_URL` and `PLUGCONF_DATA_DIR`
    #[inline]
    pub fn apply_env(&mut self, system: &dyn System) {
        if let Ok(base_url) = system.env_var(BASE_URL_ENV)
            && !base_url.trim().is_empty()
        {
            debug!("Using {BASE_URL_ENV} override");
            self.backend.base_url = Some(base_url);
        }

        if let Ok(root) = system.env_var(DATA_DIR_ENV)
            && !root.trim().is_empty()
        {
            debug!("Using {DATA_DIR_ENV} override");
            self.backend.root = Some(root);
        }
    }

    /// Directory used by the file backend
    ///
    /// Defaults to `<platform data dir>/plugconf`, or `./.plugconf` when the
    /// platform has none.
    #[must_use]
    #[inline]
    pub fn data_root(&self) -> PathBuf {
        self.backend.root.as_ref().map_or_else(
            || {
                dirs::data_dir()
                    .map_or_else(|| PathBuf::from("./.plugconf"), |dir| dir.join("plugconf"))
            },
            PathBuf::from,
        )
    }

    #[must_use]
    #[inline]
    pub const fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            display_interval: Duration::from_millis(self.session.display_interval_ms),
            live_validation: self.session.live_validation,
        }
    }

    /// Build the configured persistence backend
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the http backend has no base URL or
    /// its client cannot be created.
    #[inline]
    pub fn backend<'a>(&self, system: &'a dyn System) -> Result<Box<dyn ConfigBackend + 'a>> {
        match self.backend.kind {
            BackendKind::File => {
                let root = self.data_root();
                debug!("Using file backend at {}", root.display());
                Ok(Box::new(FileBackend::new(system, root)))
            }
            BackendKind::Http => {
                let base_url = self.backend.base_url.as_deref().ok_or_else(|| {
                    PlugconfError::configuration(format!(
                        "The http backend needs backend.baseUrl or {BASE_URL_ENV}"
                    ))
                })?;
                debug!("Using http backend at {base_url}");
                let backend =
                    HttpBackend::new(base_url, Duration::from_secs(self.backend.timeout_secs))
                        .map_err(|e| PlugconfError::configuration(e.user_message()))?;
                Ok(Box::new(backend))
            }
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn missing_default_file_uses_defaults() {
        let system = MockSystem::new();
        let settings = Settings::load(&system, None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.session_settings().display_interval,
            Duration::from_millis(3000)
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let system = MockSystem::new();
        let err = Settings::load(&system, Some("/etc/plugconf.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"), "{err}");
    }

    #[test]
    fn environment_overrides_file_values() {
        let system = MockSystem::new()
            .with_file(
                "/etc/plugconf.yaml",
                b"backend:\n  kind: http\n  baseUrl: http://registry.local\n",
            )
            .unwrap()
            .with_env(BASE_URL_ENV, "https://registry.example.com")
            .unwrap()
            .with_env(DATA_DIR_ENV, "/srv/plugconf")
            .unwrap();

        let settings = Settings::load(&system, Some("/etc/plugconf.yaml")).unwrap();
        assert_eq!(settings.backend.kind, BackendKind::Http);
        assert_eq!(
            settings.backend.base_url.as_deref(),
            Some("https://registry.example.com")
        );
        assert_eq!(settings.data_root(), PathBuf::from("/srv/plugconf"));
    }

    #[test]
    fn http_backend_requires_base_url() {
        let system = MockSystem::new();
        let settings = Settings {
            backend: BackendSettings {
                kind: BackendKind::Http,
                ..BackendSettings::default()
            },
            ..Settings::default()
        };
        let Err(err) = settings.backend(&system) else {
            panic!("expected a configuration error");
        };
        assert!(err.to_string().contains("baseUrl"), "{err}");
    }
}
