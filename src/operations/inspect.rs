//! `plugconf inspect`: list fields per scope with their controls

use anyhow::{Context as _, Result};
use serde_json::{Value, json};
use tracing::debug;

use crate::cli::InspectArgs;
use crate::error::PlugconfError;
use crate::operations::OutputFormat;
use crate::render::{self, Control};
use crate::schema::{self, ConfigFieldSchema, ConfigScope, SchemaLoad, SchemaModel};
use crate::system::System;

pub use crate::schema::NO_CONFIGURATION;

/// Run the inspect command
///
/// # Errors
///
/// Returns an error if the schema or metadata file cannot be read, or a
/// schema file is malformed.
#[inline]
pub fn run_inspect(system: &dyn System, args: &InspectArgs, format: OutputFormat) -> Result<()> {
    let load = match (args.schema.as_deref(), args.metadata.as_deref()) {
        (Some(path), _) => schema::read_schema_file(system, path)?,
        (None, Some(path)) => load_metadata(system, path)?,
        (None, None) => {
            return Err(
                PlugconfError::configuration("Either --schema or --metadata is required").into(),
            );
        }
    };

    println!("{}", describe(&load, format)?);
    Ok(())
}

fn load_metadata(system: &dyn System, path: &str) -> Result<SchemaLoad> {
    let path_obj = std::path::Path::new(path);
    if !system.is_file(path_obj) {
        return Err(PlugconfError::filesystem(format!("Metadata file not found: {path}")).into());
    }

    let content = system
        .read_to_string(path_obj)
        .with_context(|| format!("Failed to read metadata file: {path}"))?;
    let metadata: Value = serde_json::from_str(&content).map_err(|e| {
        PlugconfError::configuration(format!("Metadata file {path} is not valid JSON: {e}"))
    })?;

    debug!("Reading configuration schema from {path}");
    Ok(schema::load_version_schema(&metadata))
}

/// Render the inspect report
///
/// # Errors
///
/// Returns an error if the JSON report cannot be serialized.
#[inline]
pub fn describe(load: &SchemaLoad, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(describe_text(load)),
        OutputFormat::Json => {
            let report = match *load {
                SchemaLoad::Ready(ref model) => schema_json(model),
                SchemaLoad::Absent => json!({"available": false, "message": NO_CONFIGURATION}),
                SchemaLoad::Unavailable(ref err) => json!({
                    "available": false,
                    "message": load.placeholder(),
                    "reason": err.to_string(),
                }),
            };
            serde_json::to_string_pretty(&report).context("Failed to serialize inspect report")
        }
    }
}

fn describe_text(load: &SchemaLoad) -> String {
    let model = match *load {
        SchemaLoad::Ready(ref model) => model,
        SchemaLoad::Absent => return NO_CONFIGURATION.to_owned(),
        SchemaLoad::Unavailable(_) => {
            return load
                .placeholder()
                .unwrap_or("No configuration available")
                .to_owned();
        }
    };

    let mut lines = Vec::new();
    if let Some(title) = model.title() {
        lines.push(title.to_owned());
    }
    if let Some(description) = model.description() {
        lines.push(description.to_owned());
    }

    for scope in ConfigScope::ALL {
        let fields = model.fields_in(scope);
        if fields.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{} configuration ({} fields)", scope_heading(scope), fields.len()));

        for field in fields {
            let control = render::control_for(field);
            let marker = if field.required { " *" } else { "" };
            lines.push(format!(
                "  {}{marker} [{}] {}: {}",
                field.key,
                field.field_type,
                field.name,
                control_summary(&control)
            ));
            if let Some(description) = field.description.as_ref() {
                lines.push(format!("      {description}"));
            }
            for hint in render::hints(field) {
                lines.push(format!("      {hint}"));
            }
        }
    }

    lines.join("\n")
}

const fn scope_heading(scope: ConfigScope) -> &'static str {
    match scope {
        ConfigScope::Enterprise => "Enterprise",
        ConfigScope::Personal => "Personal",
    }
}

fn control_summary(control: &Control) -> String {
    match *control {
        Control::Select { ref options } | Control::Checklist { ref options } => {
            let labels: Vec<&str> = options.iter().map(|opt| opt.label.as_str()).collect();
            format!("{} ({})", control.kind(), labels.join(", "))
        }
        Control::TextInput { .. }
        | Control::NumberInput { .. }
        | Control::DateInput
        | Control::TimeInput
        | Control::Toggle
        | Control::JsonEditor { .. } => control.kind().to_owned(),
    }
}

fn field_json(field: &ConfigFieldSchema) -> Value {
    let control = render::control_for(field);
    json!({
        "key": field.key,
        "name": field.name,
        "type": field.field_type,
        "required": field.required,
        "control": control.kind(),
        "default": field.default_value,
        "options": field.options,
        "hints": render::hints(field),
    })
}

fn schema_json(model: &SchemaModel) -> Value {
    json!({
        "available": true,
        "title": model.title(),
        "description": model.description(),
        "enterprise": model.enterprise_fields().into_iter().map(field_json).collect::<Vec<_>>(),
        "personal": model.personal_fields().into_iter().map(field_json).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn load() -> SchemaLoad {
        SchemaLoad::Ready(
            SchemaModel::from_value(&json!({
                "title": "Analytics",
                "properties": {
                    "region": {
                        "type": "select",
                        "required": true,
                        "options": [
                            {"label": "Europe", "value": "eu"},
                            {"label": "United States", "value": "us"}
                        ]
                    },
                    "token": {"type": "password", "configScope": "personal"}
                }
            }))
            .unwrap(),
        )
    }

    #[test]
    fn text_report_groups_by_scope() {
        let text = describe(&load(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Analytics"));
        assert!(text.contains("Enterprise configuration (1 fields)"));
        assert!(text.contains("region * [select] region: select (Europe, United States)"));
        assert!(text.contains("Personal configuration (1 fields)"));
        assert!(text.contains("token [password] token: password-input"));
    }

    #[test]
    fn json_report_lists_controls() {
        let report: Value =
            serde_json::from_str(&describe(&load(), OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(report["enterprise"][0]["control"], "select");
        assert_eq!(report["personal"][0]["type"], "password");
    }

    #[test]
    fn absent_schema_has_no_form() {
        assert_eq!(
            describe(&SchemaLoad::Absent, OutputFormat::Text).unwrap(),
            NO_CONFIGURATION
        );
    }
}
