//! JSON Schema check for raw plugin configuration schema documents

use crate::error::SchemaError;
use jsonschema::Validator;
use serde_json::Value;

/// Compile the embedded schema describing configuration schema documents
///
/// # Errors
///
/// Returns an error if the embedded document is not valid JSON or not a valid
/// draft-07 schema.
#[inline]
pub fn get_meta_schema() -> Result<Validator, SchemaError> {
    let schema_str = include_str!("../../docs/config-schema.json");
    let schema: Value = serde_json::from_str(schema_str).map_err(|e| {
        SchemaError::Malformed(format!("Failed to parse embedded schema format: {e}"))
    })?;

    jsonschema::draft7::new(&schema).map_err(|e| {
        SchemaError::Malformed(format!("Failed to compile embedded schema format: {e}"))
    })
}

/// Check the overall shape of a raw schema document before typed parsing
///
/// # Errors
///
/// Returns [`SchemaError::Format`] listing every violation.
#[inline]
pub fn validate_document_shape(raw: &Value) -> Result<(), SchemaError> {
    let validator = get_meta_schema()?;

    let error_messages: Vec<String> = validator
        .iter_errors(raw)
        .map(|e| format!("  - {e}"))
        .collect();

    if !error_messages.is_empty() {
        return Err(SchemaError::Format(error_messages.join("\n")));
    }

    Ok(())
}
