//! Field type to editing control dispatch
//!
//! Maps each field to the control a front end should show, and turns raw
//! control text back into typed values. Text that cannot be interpreted is
//! kept as a string so the user can fix it; validation flags it.

use serde_json::Value;

use crate::schema::{ConfigFieldSchema, FieldOption, FieldType};

/// Editing control for one field
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Control {
    /// Single-line text; `masked` hides the input
    TextInput { masked: bool, placeholder: String },
    NumberInput {
        min: Option<f64>,
        max: Option<f64>,
        whole: bool,
        placeholder: String,
    },
    DateInput,
    TimeInput,
    /// On/off switch
    Toggle,
    Select { options: Vec<FieldOption> },
    /// One checkbox per option
    Checklist { options: Vec<FieldOption> },
    /// Multi-line JSON text area
    JsonEditor { rows: u8, placeholder: String },
}

impl Control {
    /// Short name of the control, for listings
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> &'static str {
        match *self {
            Self::TextInput { masked: true, .. } => "password-input",
            Self::TextInput { masked: false, .. } => "text-input",
            Self::NumberInput { .. } => "number-input",
            Self::DateInput => "date-input",
            Self::TimeInput => "time-input",
            Self::Toggle => "toggle",
            Self::Select { .. } => "select",
            Self::Checklist { .. } => "checklist",
            Self::JsonEditor { .. } => "json-editor",
        }
    }
}

/// Pick the control for a field
#[must_use]
#[inline]
pub fn control_for(field: &ConfigFieldSchema) -> Control {
    match field.field_type {
        FieldType::Text => Control::TextInput {
            masked: false,
            placeholder: placeholder(field),
        },
        FieldType::Password => Control::TextInput {
            masked: true,
            placeholder: placeholder(field),
        },
        FieldType::Number => Control::NumberInput {
            min: field.constraints.minimum,
            max: field.constraints.maximum,
            whole: field.constraints.integer,
            placeholder: field
                .default_value
                .as_ref()
                .map_or_else(|| placeholder(field), Value::to_string),
        },
        FieldType::Date => Control::DateInput,
        FieldType::Time => Control::TimeInput,
        FieldType::Boolean => Control::Toggle,
        FieldType::Select => Control::Select {
            options: field.options.clone(),
        },
        FieldType::MultiSelect => Control::Checklist {
            options: field.options.clone(),
        },
        FieldType::Array => Control::JsonEditor {
            rows: 3,
            placeholder: "Array configuration (JSON format)".to_owned(),
        },
        FieldType::Object => Control::JsonEditor {
            rows: 6,
            placeholder: "Object configuration (JSON format)".to_owned(),
        },
    }
}

fn placeholder(field: &ConfigFieldSchema) -> String {
    field
        .example
        .clone()
        .unwrap_or_else(|| format!("Enter {}", field.name.to_lowercase()))
}

/// Secondary hints shown under a control
#[must_use]
#[inline]
pub fn hints(field: &ConfigFieldSchema) -> Vec<String> {
    let mut hints = Vec::new();
    let constraints = &field.constraints;

    if let (Some(min), Some(max)) = (constraints.minimum, constraints.maximum) {
        hints.push(format!("Range: {min} - {max}"));
    }
    if let Some(pattern) = constraints.pattern.as_ref() {
        hints.push(format!("Pattern: {}", pattern.as_str()));
    }
    if let Some(format) = field.format.as_ref() {
        hints.push(format!("Format: {format}"));
    }
    if let Some(item_type) = field.item_type.as_ref() {
        hints.push(format!("Item type: {item_type}"));
    }
    if !field.nested_keys.is_empty() {
        hints.push(format!("Nested properties: {}", field.nested_keys.join(", ")));
    }
    hints
}

/// Interpret raw control text as a value for `field`
///
/// Numbers, booleans and JSON documents that fail to parse come back as the
/// raw string; clearing a control yields the type's empty value.
#[must_use]
#[inline]
pub fn apply_edit(field: &ConfigFieldSchema, raw: &str) -> Value {
    match field.field_type {
        FieldType::Text | FieldType::Password | FieldType::Date | FieldType::Time => {
            Value::String(raw.to_owned())
        }
        FieldType::Number => parse_number(raw),
        FieldType::Boolean => match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Value::Bool(true),
            "false" | "no" | "off" | "0" => Value::Bool(false),
            _ => Value::String(raw.to_owned()),
        },
        FieldType::Select => match_option(field, raw.trim()),
        FieldType::MultiSelect => parse_selection(field, raw),
        FieldType::Array | FieldType::Object => {
            if raw.trim().is_empty() {
                return field.field_type.empty_value();
            }
            serde_json::from_str(raw).unwrap_or_else(|_err| Value::String(raw.to_owned()))
        }
    }
}

fn parse_number(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::String(raw.to_owned()), Value::Number)
}

/// Map control text back to the declared option value it shows
fn match_option(field: &ConfigFieldSchema, text: &str) -> Value {
    field
        .options
        .iter()
        .find(|opt| option_text(&opt.value) == text)
        .map_or_else(|| Value::String(text.to_owned()), |opt| opt.value.clone())
}

/// A JSON list, or a comma-separated list of option values
fn parse_selection(field: &ConfigFieldSchema, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Array(Vec::new());
    }
    if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(raw) {
        return value;
    }
    Value::Array(
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match_option(field, part))
            .collect(),
    )
}

/// Add or remove one option of a multiselect value, keeping declaration order
#[must_use]
#[inline]
pub fn toggle_option(
    field: &ConfigFieldSchema,
    current: &Value,
    option: &Value,
    checked: bool,
) -> Value {
    let selected: Vec<&Value> = current
        .as_array()
        .map(|items| items.iter().collect())
        .unwrap_or_default();

    let mut next: Vec<Value> = field
        .options
        .iter()
        .map(|opt| &opt.value)
        .filter(|&value| {
            if value == option {
                checked
            } else {
                selected.contains(&value)
            }
        })
        .cloned()
        .collect();

    // Stale selections outside the option list stay visible so validation can flag them
    next.extend(
        selected
            .into_iter()
            .filter(|value| !field.has_option(value))
            .cloned(),
    );
    Value::Array(next)
}

/// Text shown in the control for a value; the inverse of [`apply_edit`]
#[must_use]
#[inline]
pub fn display_value(field: &ConfigFieldSchema, value: &Value) -> String {
    match field.field_type {
        FieldType::Array | FieldType::Object if !value.is_string() => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_err| value.to_string())
        }
        FieldType::MultiSelect if value.is_array() => value.to_string(),
        FieldType::Text
        | FieldType::Password
        | FieldType::Number
        | FieldType::Boolean
        | FieldType::Select
        | FieldType::MultiSelect
        | FieldType::Array
        | FieldType::Object
        | FieldType::Date
        | FieldType::Time => option_text(value),
    }
}

fn option_text(value: &Value) -> String {
    match *value {
        Value::String(ref s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
