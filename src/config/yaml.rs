//! YAML settings loading and parsing

use crate::config::Settings;
use crate::error::PlugconfError;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde_json::Value;
use std::path::Path;

/// Load, parse and schema-check a `plugconf.yaml` file
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, not YAML, or does
/// not match the settings schema.
#[inline]
pub fn load_settings(system: &dyn System, path: &str) -> Result<Settings> {
    let path_obj = Path::new(path);

    if !system.is_file(path_obj) {
        return Err(PlugconfError::configuration(format!(
            "Settings file not found: {path}\n\
            Create a plugconf.yaml file or specify a different path with --config"
        ))
        .into());
    }

    let content = system
        .read_to_string(path_obj)
        .with_context(|| format!("Failed to read settings file: {path}"))?;

    parse_settings(&content).with_context(|| format!("Invalid settings file: {path}"))
}

/// Parse settings text; an empty document yields the defaults
///
/// # Errors
///
/// Returns an error if the text is not YAML or does not match the settings
/// schema.
#[inline]
pub fn parse_settings(content: &str) -> Result<Settings> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    let raw: Value = serde_yaml::from_str(content).map_err(|e| {
        PlugconfError::configuration(format!(
            "Failed to parse YAML settings: {e}\n\
            Please check the syntax and structure of your settings file"
        ))
    })?;

    if raw.is_null() {
        return Ok(Settings::default());
    }

    crate::config::schema::validate_against_schema(&raw)
        .map_err(|e| PlugconfError::configuration(e.to_string()))?;

    serde_json::from_value(raw)
        .map_err(|e| PlugconfError::configuration(format!("Invalid settings: {e}")).into())
}
