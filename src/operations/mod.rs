//! Operations module
//!
//! One module per subcommand. Each operation prints its report to stdout and
//! returns a typed error when the command should fail.

pub mod inspect;
pub mod resolve;
pub mod save;
pub mod validate;

use core::fmt;
use core::str::FromStr;

use anyhow::Result;
use serde_json::Value;

use crate::cli::FieldEdit;
use crate::error::PlugconfError;
use crate::schema::SchemaModel;
use crate::session::{EditError, EditingSession};
use crate::store::{ConfigValues, FieldErrors};
use crate::system::System;

pub use inspect::run_inspect;
pub use resolve::run_resolve;
pub use save::run_save;
pub use validate::run_validate;

/// How command reports are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum OutputFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One pretty-printed JSON document
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {s}. Use 'text' or 'json'")),
        }
    }
}

impl fmt::Display for OutputFormat {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Apply command-line edits to a session in order
///
/// # Errors
///
/// Returns a configuration error naming the first key the schema does not declare.
#[inline]
pub fn apply_edits(session: &mut EditingSession, edits: &[FieldEdit]) -> Result<()> {
    for edit in edits {
        let applied = match *edit {
            FieldEdit::Text { ref key, ref raw } => session.edit(key, raw),
            FieldEdit::Json { ref key, ref value } => session.set(key, value.clone()),
        };
        applied.map_err(|err| match err {
            EditError::UnknownKey(key) => PlugconfError::configuration(format!(
                "Unknown configuration field '{key}'"
            )),
            EditError::Store(err) => PlugconfError::configuration(err.to_string()),
        })?;
    }
    Ok(())
}

/// Read a JSON object of saved values from disk
///
/// # Errors
///
/// Returns a filesystem error if the file is missing or unreadable, or a
/// configuration error if it is not a JSON object.
#[inline]
pub fn load_values_file(system: &dyn System, path: &str) -> Result<ConfigValues> {
    let path_obj = std::path::Path::new(path);
    if !system.is_file(path_obj) {
        return Err(PlugconfError::filesystem(format!("Values file not found: {path}")).into());
    }

    let content = system
        .read_to_string(path_obj)
        .map_err(|e| PlugconfError::filesystem(format!("Failed to read values file {path}: {e}")))?;

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(values)) => Ok(values),
        Ok(_) => Err(PlugconfError::configuration(format!(
            "Values file {path} must contain a JSON object"
        ))
        .into()),
        Err(e) => Err(PlugconfError::configuration(format!(
            "Failed to parse values file {path}: {e}"
        ))
        .into()),
    }
}

/// Field errors as `key: message` lines, labelled with field names
#[must_use]
#[inline]
pub fn format_errors(schema: &SchemaModel, errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(key, message)| {
            let name = schema.field(key).map_or(key.as_str(), |field| field.name.as_str());
            format!("  ✗ {name} ({key}): {message}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
