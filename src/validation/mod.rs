//! Field validation against a configuration schema
//!
//! Validation is pure: it reads a [`ValueStore`] and returns a key -> message
//! map without touching the store. Parse failures of structured fields are
//! reported as messages, never raised.

pub mod formats;

use serde_json::Value;

use crate::schema::{ConfigFieldSchema, FieldType, SchemaModel};
use crate::store::{FieldErrors, ValueStore, is_empty_value};

/// Message attached to required fields that have no value
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Validate every field owned by the store's scope
///
/// Calling this repeatedly with the same inputs yields the same map, and the
/// outcome for one field never depends on another.
#[must_use]
#[inline]
pub fn validate(schema: &SchemaModel, store: &ValueStore) -> FieldErrors {
    schema
        .fields_in(store.scope())
        .into_iter()
        .filter_map(|field| {
            check_field(field, store.get(&field.key)).map(|message| (field.key.clone(), message))
        })
        .collect()
}

/// Validate a single key, for live checks while editing
///
/// Returns the same message a full [`validate`] pass would record for `key`.
#[must_use]
#[inline]
pub fn validate_field(schema: &SchemaModel, store: &ValueStore, key: &str) -> Option<String> {
    let field = schema.field(key).filter(|field| field.scope == store.scope())?;
    check_field(field, store.get(key))
}

/// Check one value against its field definition
///
/// Empty values only ever produce the required message; optional empty
/// values pass without further checks.
#[must_use]
#[inline]
pub fn check_field(field: &ConfigFieldSchema, value: Option<&Value>) -> Option<String> {
    match value {
        Some(value) if !is_empty_value(value) => check_value(field, value).err(),
        _ => field.required.then(|| REQUIRED_MESSAGE.to_owned()),
    }
}

/// Type and constraint checks for a non-empty value; the first failing rule wins
fn check_value(field: &ConfigFieldSchema, value: &Value) -> Result<(), String> {
    match field.field_type {
        FieldType::Text | FieldType::Password => check_text(field, value),
        FieldType::Date => {
            let text = expect_string(value)?;
            if !formats::is_valid_date(text) {
                return Err("Must be a date (YYYY-MM-DD)".to_owned());
            }
            check_text(field, value)
        }
        FieldType::Time => {
            let text = expect_string(value)?;
            if !formats::is_valid_time(text) {
                return Err("Must be a time (HH:MM)".to_owned());
            }
            check_text(field, value)
        }
        FieldType::Number => check_number(field, value),
        FieldType::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err("Must be true or false".to_owned())
            }
        }
        FieldType::Select => check_option(field, value),
        FieldType::MultiSelect => {
            let Value::Array(ref items) = *value else {
                return Err("Must be a list of options".to_owned());
            };
            items.iter().try_for_each(|item| check_option(field, item))
        }
        FieldType::Array => check_structured(value, Value::is_array, "Must be a JSON array"),
        FieldType::Object => check_structured(value, Value::is_object, "Must be a JSON object"),
    }
}

fn expect_string(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "Must be a string".to_owned())
}

fn check_text(field: &ConfigFieldSchema, value: &Value) -> Result<(), String> {
    let text = expect_string(value)?;
    let constraints = &field.constraints;
    let length = text.chars().count();

    if let Some(min) = constraints.min_length
        && length < min
    {
        return Err(format!("Must be at least {min} characters"));
    }

    if let Some(max) = constraints.max_length
        && length > max
    {
        return Err(format!("Must be at most {max} characters"));
    }

    if let Some(pattern) = constraints.pattern.as_ref()
        && !pattern.is_match(text)
    {
        return Err("Invalid format".to_owned());
    }

    Ok(())
}

fn check_number(field: &ConfigFieldSchema, value: &Value) -> Result<(), String> {
    let number = value
        .as_f64()
        .ok_or_else(|| "Must be a number".to_owned())?;
    let constraints = &field.constraints;

    if constraints.integer && number.fract() != 0.0 {
        return Err("Must be a whole number".to_owned());
    }

    if let Some(min) = constraints.minimum
        && number < min
    {
        return Err(format!("Must be at least {min}"));
    }

    if let Some(max) = constraints.maximum
        && number > max
    {
        return Err(format!("Must be at most {max}"));
    }

    Ok(())
}

/// Stored values can predate a schema update, so option membership is always checked
fn check_option(field: &ConfigFieldSchema, value: &Value) -> Result<(), String> {
    if field.has_option(value) {
        return Ok(());
    }
    let shown = value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_owned);
    Err(format!("Invalid option: {shown}"))
}

/// Structured fields hold raw text only when an edit failed to parse
///
/// Such text is always an error, even if it happens to parse now, so that a
/// string never reaches the backend in place of a JSON document.
fn check_structured(
    value: &Value,
    is_kind: fn(&Value) -> bool,
    kind_message: &str,
) -> Result<(), String> {
    if is_kind(value) {
        return Ok(());
    }
    if let Value::String(ref text) = *value
        && let Err(e) = serde_json::from_str::<Value>(text)
    {
        return Err(format!("Invalid JSON: {e}"));
    }
    Err(kind_message.to_owned())
}
