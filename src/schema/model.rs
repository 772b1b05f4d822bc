//! Typed schema model built from raw configuration schema documents

use core::fmt;
use std::collections::HashSet;

use regex::Regex;
use serde::Deserialize;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::{Map, Value};
use tracing::debug;

use super::field::{ConfigFieldSchema, ConfigScope, Constraints, FieldOption, FieldType};
use super::meta::validate_document_shape;
use crate::error::SchemaError;

/// Keyed schema document: `{title, description, properties, required}`
#[derive(Debug, Deserialize)]
struct RawSchema {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    required: Vec<String>,
}

/// One field descriptor, in either the keyed or the flat list form
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldDescriptor {
    key: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    #[serde(alias = "name")]
    title: Option<String>,
    description: Option<String>,
    #[serde(alias = "defaultValue")]
    default: Option<Value>,
    #[serde(default)]
    options: Vec<FieldOption>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    #[serde(alias = "validation")]
    pattern: Option<String>,
    format: Option<String>,
    example: Option<String>,
    items: Option<Value>,
    properties: Option<Map<String, Value>>,
    #[serde(alias = "configType")]
    config_scope: Option<String>,
    sort_order: Option<i64>,
    /// Per-field flag of the list form; nested object schemas may carry a key list here instead
    required: Option<Value>,
}

/// First key declared twice in the document's `properties` map
///
/// Parsing into [`Value`] keeps only the last of repeated keys, so the source
/// text is scanned on its own.
#[derive(Debug, Default)]
struct RepeatedProperty(Option<String>);

impl<'de> Deserialize<'de> for RepeatedProperty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = RepeatedProperty;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration schema document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut found = RepeatedProperty::default();
        while let Some(name) = map.next_key::<String>()? {
            if name == "properties" {
                found = map.next_value::<PropertyKeys>()?.0;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(found)
    }
}

/// Wrapper whose visitor walks the keys of `properties`
struct PropertyKeys(RepeatedProperty);

impl<'de> Deserialize<'de> for PropertyKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PropertyKeysVisitor)
    }
}

struct PropertyKeysVisitor;

impl<'de> Visitor<'de> for PropertyKeysVisitor {
    type Value = PropertyKeys;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field descriptors")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut seen = HashSet::new();
        let mut repeated = None;
        while let Some(key) = map.next_key::<String>()? {
            map.next_value::<IgnoredAny>()?;
            if repeated.is_none() && !seen.insert(key.clone()) {
                repeated = Some(key);
            }
        }
        Ok(PropertyKeys(RepeatedProperty(repeated)))
    }
}

/// Reject a `properties` key the source text declares twice
///
/// Scan failures are ignored: the document was already parsed, and shape
/// errors are reported by [`SchemaModel::from_value`].
fn check_repeated_properties(scan: Option<RepeatedProperty>) -> Result<(), SchemaError> {
    match scan {
        Some(RepeatedProperty(Some(key))) => Err(SchemaError::DuplicateKey { key }),
        Some(RepeatedProperty(None)) | None => Ok(()),
    }
}

impl FieldDescriptor {
    fn flagged_required(&self) -> bool {
        matches!(self.required, Some(Value::Bool(true)))
    }
}

/// Which document form a descriptor came from
///
/// Flat list descriptors store defaults as strings, so their defaults are
/// coerced to the field type instead of being checked verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescriptorForm {
    Keyed,
    List,
}

/// Immutable, validated configuration schema of one plugin version
#[derive(Debug, Clone)]
pub struct SchemaModel {
    title: Option<String>,
    description: Option<String>,
    /// Declaration order
    fields: Vec<ConfigFieldSchema>,
    /// Indices into `fields`, ordered by sort order then declaration order
    enterprise: Vec<usize>,
    personal: Vec<usize>,
}

impl SchemaModel {
    /// Build a schema model from a raw document
    ///
    /// Accepts the keyed form (`{properties: {...}, required: [...]}`) or a flat
    /// list of descriptors each carrying its own `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] for any malformed descriptor; nothing is
    /// deferred to render or validation time.
    #[inline]
    pub fn from_value(raw: &Value) -> Result<Self, SchemaError> {
        validate_document_shape(raw)?;

        let model = match *raw {
            Value::Array(ref items) => Self::from_list(items)?,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Object(_) => {
                Self::from_keyed(raw)?
            }
        };

        debug!(
            "Loaded configuration schema with {} enterprise and {} personal fields",
            model.enterprise.len(),
            model.personal.len()
        );
        Ok(model)
    }

    /// Parse a schema from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] on invalid JSON, or any load error.
    #[inline]
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let raw: Value =
            serde_json::from_str(content).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        check_repeated_properties(serde_json::from_str(content).ok())?;
        Self::from_value(&raw)
    }

    /// Parse a schema from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] on invalid YAML, or any load error.
    #[inline]
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        let raw: Value = serde_yaml::from_str(content).map_err(|e| {
            if let Some(location) = e.location() {
                SchemaError::Malformed(format!(
                    "line {}, column {}: {}",
                    location.line(),
                    location.column(),
                    e
                ))
            } else {
                SchemaError::Malformed(e.to_string())
            }
        })?;
        check_repeated_properties(serde_yaml::from_str(content).ok())?;
        Self::from_value(&raw)
    }

    fn from_keyed(raw: &Value) -> Result<Self, SchemaError> {
        let doc: RawSchema = serde_json::from_value(raw.clone())
            .map_err(|e| SchemaError::Malformed(e.to_string()))?;

        for key in &doc.required {
            if !doc.properties.contains_key(key) {
                return Err(SchemaError::UnknownRequired { key: key.clone() });
            }
        }

        let mut fields = Vec::with_capacity(doc.properties.len());
        for (key, descriptor) in &doc.properties {
            let descriptor: FieldDescriptor = serde_json::from_value(descriptor.clone())
                .map_err(|e| SchemaError::Malformed(format!("field '{key}': {e}")))?;
            let required = descriptor.flagged_required() || doc.required.iter().any(|r| r == key);
            fields.push(build_field(key, descriptor, required, DescriptorForm::Keyed)?);
        }

        Ok(Self::assemble(doc.title, doc.description, fields))
    }

    fn from_list(items: &[Value]) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(items.len());

        for item in items {
            let descriptor: FieldDescriptor = serde_json::from_value(item.clone())
                .map_err(|e| SchemaError::Malformed(e.to_string()))?;
            let key = descriptor
                .key
                .clone()
                .ok_or_else(|| SchemaError::Malformed("list descriptor without a key".to_owned()))?;

            if !seen.insert(key.clone()) {
                return Err(SchemaError::DuplicateKey { key });
            }

            let required = descriptor.flagged_required();
            fields.push(build_field(&key, descriptor, required, DescriptorForm::List)?);
        }

        Ok(Self::assemble(None, None, fields))
    }

    fn assemble(
        title: Option<String>,
        description: Option<String>,
        fields: Vec<ConfigFieldSchema>,
    ) -> Self {
        let partition = |scope: ConfigScope| {
            let mut indices: Vec<usize> = fields
                .iter()
                .enumerate()
                .filter(|&(_, field)| field.scope == scope)
                .map(|(index, _)| index)
                .collect();
            // Stable sort keeps declaration order for equal sort orders
            indices.sort_by_key(|&index| fields[index].sort_order);
            indices
        };

        let enterprise = partition(ConfigScope::Enterprise);
        let personal = partition(ConfigScope::Personal);

        Self {
            title,
            description,
            fields,
            enterprise,
            personal,
        }
    }

    #[must_use]
    #[inline]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// All fields in declaration order
    #[must_use]
    #[inline]
    pub fn fields(&self) -> &[ConfigFieldSchema] {
        &self.fields
    }

    /// Look up a field by key
    #[must_use]
    #[inline]
    pub fn field(&self, key: &str) -> Option<&ConfigFieldSchema> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Fields owned by `scope`, in display order
    #[must_use]
    #[inline]
    pub fn fields_in(&self, scope: ConfigScope) -> Vec<&ConfigFieldSchema> {
        let indices = match scope {
            ConfigScope::Enterprise => &self.enterprise,
            ConfigScope::Personal => &self.personal,
        };
        indices.iter().map(|&index| &self.fields[index]).collect()
    }

    #[must_use]
    #[inline]
    pub fn enterprise_fields(&self) -> Vec<&ConfigFieldSchema> {
        self.fields_in(ConfigScope::Enterprise)
    }

    #[must_use]
    #[inline]
    pub fn personal_fields(&self) -> Vec<&ConfigFieldSchema> {
        self.fields_in(ConfigScope::Personal)
    }

    /// Keys of the required fields owned by `scope`
    #[must_use]
    #[inline]
    pub fn required_keys(&self, scope: ConfigScope) -> Vec<&str> {
        self.fields_in(scope)
            .into_iter()
            .filter(|field| field.required)
            .map(|field| field.key.as_str())
            .collect()
    }

    /// Whether `scope` owns at least one field
    #[must_use]
    #[inline]
    pub fn has_scope(&self, scope: ConfigScope) -> bool {
        !self.fields_in(scope).is_empty()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Turn one descriptor into a validated field
fn build_field(
    key: &str,
    descriptor: FieldDescriptor,
    required: bool,
    form: DescriptorForm,
) -> Result<ConfigFieldSchema, SchemaError> {
    let type_name = descriptor
        .type_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| SchemaError::MissingType {
            key: key.to_owned(),
        })?;

    let (field_type, integer) = FieldType::from_descriptor(type_name, descriptor.format.as_deref())
        .ok_or_else(|| SchemaError::UnknownType {
            key: key.to_owned(),
            type_name: type_name.to_owned(),
        })?;

    let scope = match descriptor.config_scope.as_deref() {
        None => ConfigScope::Enterprise,
        Some(raw) => ConfigScope::from_schema_name(raw).ok_or_else(|| SchemaError::UnknownScope {
            key: key.to_owned(),
            scope: raw.to_owned(),
        })?,
    };

    if field_type.has_options() {
        if descriptor.options.is_empty() {
            return Err(SchemaError::MissingOptions {
                key: key.to_owned(),
                type_name: field_type.to_string(),
            });
        }
        let mut values = Vec::with_capacity(descriptor.options.len());
        for option in &descriptor.options {
            if values.contains(&&option.value) {
                return Err(SchemaError::DuplicateOption {
                    key: key.to_owned(),
                    value: display_json(&option.value),
                });
            }
            values.push(&option.value);
        }
    }

    let constraints = build_constraints(key, &descriptor, integer)?;

    let mut field = ConfigFieldSchema {
        key: key.to_owned(),
        name: descriptor.title.clone().unwrap_or_else(|| key.to_owned()),
        description: descriptor.description.clone(),
        field_type,
        required,
        default_value: None,
        options: descriptor.options,
        constraints,
        scope,
        sort_order: descriptor.sort_order.unwrap_or(0),
        example: descriptor.example,
        format: descriptor.format,
        item_type: descriptor
            .items
            .as_ref()
            .and_then(|items| items.get("type"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        nested_keys: descriptor
            .properties
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default(),
    };

    field.default_value = match descriptor.default {
        None => None,
        Some(value) => {
            let value = match form {
                DescriptorForm::Keyed => value,
                DescriptorForm::List => coerce_list_default(&field, value),
            };
            if !default_fits(&field, &value) {
                return Err(SchemaError::InvalidDefault {
                    key: key.to_owned(),
                    type_name: field_type.to_string(),
                });
            }
            Some(value)
        }
    };

    Ok(field)
}

fn build_constraints(
    key: &str,
    descriptor: &FieldDescriptor,
    integer: bool,
) -> Result<Constraints, SchemaError> {
    if let (Some(min), Some(max)) = (descriptor.minimum, descriptor.maximum)
        && min > max
    {
        return Err(SchemaError::InvalidConstraints {
            key: key.to_owned(),
            detail: format!("minimum {min} is greater than maximum {max}"),
        });
    }

    if let (Some(min), Some(max)) = (descriptor.min_length, descriptor.max_length)
        && min > max
    {
        return Err(SchemaError::InvalidConstraints {
            key: key.to_owned(),
            detail: format!("minLength {min} is greater than maxLength {max}"),
        });
    }

    let pattern = descriptor
        .pattern
        .as_deref()
        .filter(|pattern| !pattern.is_empty())
        .map(Regex::new)
        .transpose()
        .map_err(|source| SchemaError::InvalidPattern {
            key: key.to_owned(),
            source,
        })?;

    Ok(Constraints {
        min_length: descriptor.min_length,
        max_length: descriptor.max_length,
        pattern,
        minimum: descriptor.minimum,
        maximum: descriptor.maximum,
        integer,
    })
}

/// Check that a default value has the JSON kind the field type expects
fn default_fits(field: &ConfigFieldSchema, value: &Value) -> bool {
    match field.field_type {
        FieldType::Text | FieldType::Password | FieldType::Date | FieldType::Time => {
            value.is_string()
        }
        FieldType::Number => value.as_f64().is_some_and(|number| {
            !field.constraints.integer || number.fract() == 0.0
        }),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Select => field.has_option(value),
        FieldType::MultiSelect => value
            .as_array()
            .is_some_and(|items| items.iter().all(|item| field.has_option(item))),
        FieldType::Array => value.is_array(),
        FieldType::Object => value.is_object(),
    }
}

/// Coerce a string default from the flat list form into the field type
fn coerce_list_default(field: &ConfigFieldSchema, value: Value) -> Value {
    let Value::String(ref text) = value else {
        return value;
    };

    match field.field_type {
        FieldType::Number => {
            if let Ok(i) = text.parse::<i64>() {
                return Value::Number(i.into());
            }
            text.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map_or(value, Value::Number)
        }
        FieldType::Boolean => match text.to_lowercase().as_str() {
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" => Value::Bool(false),
            _ => value,
        },
        FieldType::MultiSelect | FieldType::Array | FieldType::Object => {
            serde_json::from_str(text).unwrap_or(value)
        }
        FieldType::Text
        | FieldType::Password
        | FieldType::Select
        | FieldType::Date
        | FieldType::Time => value,
    }
}

fn display_json(value: &Value) -> String {
    match *value {
        Value::String(ref s) => s.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}
