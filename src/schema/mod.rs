//! Plugin configuration schema module
//!
//! Parses configuration schema documents into a typed, scope-partitioned
//! field model and rejects malformed descriptors at load time.

pub mod field;
pub mod meta;
pub mod model;

pub use field::{ConfigFieldSchema, ConfigScope, Constraints, FieldOption, FieldType};
pub use model::SchemaModel;

use crate::error::{PlugconfError, SchemaError};
use crate::system::System;
use anyhow::{Context as _, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of reading the configuration schema from plugin version metadata
#[derive(Debug)]
#[non_exhaustive]
pub enum SchemaLoad {
    /// The version declares no configuration; nothing should be rendered
    Absent,
    /// The schema loaded and can be edited
    Ready(SchemaModel),
    /// The schema is broken; shown as "no configuration available"
    Unavailable(SchemaError),
}

impl SchemaLoad {
    /// The loaded model, if any
    #[must_use]
    #[inline]
    pub const fn model(&self) -> Option<&SchemaModel> {
        match *self {
            Self::Ready(ref model) => Some(model),
            Self::Absent | Self::Unavailable(_) => None,
        }
    }

    /// Message to show in place of the configuration form, if the form is not shown
    #[must_use]
    #[inline]
    pub const fn placeholder(&self) -> Option<&'static str> {
        match *self {
            Self::Ready(_) | Self::Absent => None,
            Self::Unavailable(_) => Some("No configuration available"),
        }
    }
}

/// Read the configuration schema carried by plugin version metadata
///
/// The schema lives under `configSchema` (or `config_schema_json`). A missing
/// or `null` schema, or one without properties, means the version has no
/// configuration. A schema stored as a JSON string is decoded first.
#[must_use]
#[inline]
pub fn load_version_schema(metadata: &Value) -> SchemaLoad {
    let raw = metadata
        .get("configSchema")
        .or_else(|| metadata.get("config_schema_json"));

    let decoded;
    let raw = match raw {
        None | Some(Value::Null) => return SchemaLoad::Absent,
        Some(Value::String(text)) if text.trim().is_empty() => return SchemaLoad::Absent,
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                decoded = value;
                &decoded
            }
            Err(e) => {
                warn!("Configuration schema is not valid JSON: {e}");
                return SchemaLoad::Unavailable(SchemaError::Malformed(e.to_string()));
            }
        },
        Some(other) => other,
    };

    if declares_no_fields(raw) {
        return SchemaLoad::Absent;
    }

    match SchemaModel::from_value(raw) {
        Ok(model) if model.is_empty() => SchemaLoad::Absent,
        Ok(model) => SchemaLoad::Ready(model),
        Err(err) => {
            warn!("Configuration schema rejected: {err}");
            SchemaLoad::Unavailable(err)
        }
    }
}

fn declares_no_fields(raw: &Value) -> bool {
    match *raw {
        Value::Object(ref doc) => match doc.get("properties") {
            None | Some(Value::Null) => true,
            Some(Value::Object(props)) => props.is_empty(),
            Some(_) => false,
        },
        Value::Array(ref items) => items.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => false,
    }
}

/// Shown in place of the form when a plugin version has no configuration
pub const NO_CONFIGURATION: &str = "This plugin version has no configuration";

/// Read a schema document from a JSON or YAML file
///
/// Files ending in `.json` are parsed as JSON; everything else as YAML. A
/// document that declares no fields reads as [`SchemaLoad::Absent`].
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or cannot be read
/// - The document is not a valid configuration schema
#[inline]
pub fn read_schema_file(system: &dyn System, path: &str) -> Result<SchemaLoad> {
    let path_obj = Path::new(path);

    if !system.exists(path_obj) {
        return Err(PlugconfError::filesystem(format!("Schema file not found: {path}")).into());
    }

    let content = system
        .read_to_string(path_obj)
        .with_context(|| format!("Failed to read schema file: {path}"))?;

    let is_json = path_obj
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let model = if is_json {
        SchemaModel::from_json_str(&content)
    } else {
        SchemaModel::from_yaml_str(&content)
    };

    match model {
        Ok(model) if model.is_empty() => {
            debug!("{path} declares no configuration fields");
            Ok(SchemaLoad::Absent)
        }
        Ok(model) => Ok(SchemaLoad::Ready(model)),
        Err(err) => Err(PlugconfError::schema(format!("{path}: {err}")).into()),
    }
}

/// Load a schema file that must declare at least one field
///
/// # Errors
///
/// Returns the errors of [`read_schema_file`], or a configuration error when
/// the document declares no fields.
#[inline]
pub fn load_schema_file(system: &dyn System, path: &str) -> Result<SchemaModel> {
    match read_schema_file(system, path)? {
        SchemaLoad::Ready(model) => Ok(model),
        SchemaLoad::Absent | SchemaLoad::Unavailable(_) => {
            Err(PlugconfError::configuration(format!("{path}: {NO_CONFIGURATION}")).into())
        }
    }
}
