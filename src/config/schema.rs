//! JSON Schema validation for plugconf settings files

use anyhow::{Result, anyhow};
use jsonschema::Validator;
use serde_json::Value;

/// Get the embedded JSON schema for `plugconf.yaml`
///
/// # Errors
///
/// Returns an error if the embedded schema does not parse or compile.
#[inline]
pub fn get_schema() -> Result<Validator> {
    let schema_str = include_str!("../../docs/settings.schema.json");
    let schema: Value = serde_json::from_str(schema_str)
        .map_err(|e| anyhow!("Failed to parse embedded settings schema: {e}"))?;

    jsonschema::draft7::new(&schema)
        .map_err(|e| anyhow!("Failed to compile settings schema: {e}"))
}

/// Validate a raw settings document against the schema
///
/// # Errors
///
/// Returns an error listing every violation found.
#[inline]
pub fn validate_against_schema(settings: &Value) -> Result<()> {
    let schema = get_schema()?;

    let error_messages: Vec<String> = schema
        .iter_errors(settings)
        .map(|e| format!("  - Path '{}': {e}", e.instance_path))
        .collect();

    if !error_messages.is_empty() {
        return Err(anyhow!(
            "Settings validation failed:\n{}",
            error_messages.join("\n")
        ));
    }

    Ok(())
}
