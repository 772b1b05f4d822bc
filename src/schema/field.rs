//! Field definitions for plugin configuration schemas

use core::fmt;
use core::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ownership domain of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    /// Organization-wide values, saved once for every member
    Enterprise,
    /// Per-user values
    Personal,
}

impl ConfigScope {
    /// Both scopes, enterprise first
    pub const ALL: [Self; 2] = [Self::Enterprise, Self::Personal];

    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enterprise => "enterprise",
            Self::Personal => "personal",
        }
    }

    /// Exact `configScope` spelling used in schema documents
    #[must_use]
    #[inline]
    pub fn from_schema_name(name: &str) -> Option<Self> {
        match name {
            "enterprise" => Some(Self::Enterprise),
            "personal" => Some(Self::Personal),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigScope {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigScope {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enterprise" | "org" | "organization" => Ok(Self::Enterprise),
            "personal" | "user" => Ok(Self::Personal),
            _ => Err(format!(
                "Invalid scope: {s}. Use 'enterprise' or 'personal'"
            )),
        }
    }
}

/// Closed set of field types a schema may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum FieldType {
    Text,
    Password,
    Number,
    Boolean,
    Select,
    #[serde(rename = "multiselect")]
    MultiSelect,
    Array,
    Object,
    Date,
    Time,
}

impl FieldType {
    /// Resolve a descriptor `type` (and optional `format`) into a field type
    ///
    /// Returns the field type and whether the descriptor asked for whole
    /// numbers only. JSON Schema spellings (`string`, `integer`) are accepted.
    #[must_use]
    #[inline]
    pub fn from_descriptor(type_name: &str, format: Option<&str>) -> Option<(Self, bool)> {
        let resolved = match type_name {
            "text" => Self::Text,
            "string" => match format {
                Some("password") => Self::Password,
                Some("date") => Self::Date,
                Some("time") => Self::Time,
                _ => Self::Text,
            },
            "password" => Self::Password,
            "number" => Self::Number,
            "integer" => return Some((Self::Number, true)),
            "boolean" => Self::Boolean,
            "select" => Self::Select,
            "multiselect" => Self::MultiSelect,
            "array" => Self::Array,
            "object" => Self::Object,
            "date" => Self::Date,
            "time" => Self::Time,
            _ => return None,
        };
        Some((resolved, false))
    }

    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Select => "select",
            Self::MultiSelect => "multiselect",
            Self::Array => "array",
            Self::Object => "object",
            Self::Date => "date",
            Self::Time => "time",
        }
    }

    /// Value a field of this type starts from when nothing else is known
    #[must_use]
    #[inline]
    pub fn empty_value(self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Array | Self::MultiSelect => Value::Array(Vec::new()),
            Self::Object => Value::Object(Map::new()),
            Self::Text
            | Self::Password
            | Self::Number
            | Self::Select
            | Self::Date
            | Self::Time => Value::String(String::new()),
        }
    }

    /// Whether the type picks its values from a declared option list
    #[must_use]
    #[inline]
    pub const fn has_options(self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect)
    }

    /// Whether values are edited as free text
    #[must_use]
    #[inline]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Password | Self::Date | Self::Time)
    }

    /// Whether values are JSON documents (lists or maps)
    #[must_use]
    #[inline]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

impl fmt::Display for FieldType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a select or multiselect option list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: Value,
}

/// Constraints applicable to a field; which ones apply depends on the type
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Constraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Number fields declared as `integer` reject fractional values
    pub integer: bool,
}

/// One configurable parameter of a plugin
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ConfigFieldSchema {
    /// Unique key across the whole plugin schema
    pub key: String,

    /// Human label (descriptor title, falling back to the key)
    pub name: String,

    pub description: Option<String>,

    pub field_type: FieldType,

    pub required: bool,

    /// Used only when no saved value exists
    pub default_value: Option<Value>,

    pub options: Vec<FieldOption>,

    pub constraints: Constraints,

    pub scope: ConfigScope,

    pub sort_order: i64,

    /// Placeholder hint shown in empty inputs
    pub example: Option<String>,

    pub format: Option<String>,

    /// Declared item type of array fields (display only)
    pub item_type: Option<String>,

    /// Declared nested property names of object fields (display only)
    pub nested_keys: Vec<String>,
}

impl ConfigFieldSchema {
    /// Resolve the working value: saved value, then default, then the type's empty value
    ///
    /// A saved `null` counts as no saved value.
    #[must_use]
    #[inline]
    pub fn resolve(&self, saved: Option<&Value>) -> Value {
        match saved {
            Some(value) if !value.is_null() => value.clone(),
            _ => self
                .default_value
                .clone()
                .unwrap_or_else(|| self.field_type.empty_value()),
        }
    }

    /// Check whether `value` is one of the declared option values
    #[must_use]
    #[inline]
    pub fn has_option(&self, value: &Value) -> bool {
        self.options.iter().any(|opt| &opt.value == value)
    }

    /// Label for an option value, if declared
    #[must_use]
    #[inline]
    pub fn option_label(&self, value: &Value) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| &opt.value == value)
            .map(|opt| opt.label.as_str())
    }

    /// Whether the value must stay out of logs and plain-text output
    #[must_use]
    #[inline]
    pub const fn is_secret(&self) -> bool {
        matches!(self.field_type, FieldType::Password)
    }
}
