//! `plugconf validate`: check values without saving them

use anyhow::{Context as _, Result};
use serde_json::json;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::PlugconfError;
use crate::operations::{OutputFormat, apply_edits, format_errors, load_values_file};
use crate::persistence::ConfigTarget;
use crate::schema::{self, ConfigScope};
use crate::session::{EditingSession, SessionSettings};
use crate::store::{ConfigValues, FieldErrors};
use crate::system::System;

/// Run the validate command
///
/// # Errors
///
/// Returns a validation error (exit code 3) when any field fails, after the
/// report was printed.
#[inline]
pub fn run_validate(system: &dyn System, args: &ValidateArgs, format: OutputFormat) -> Result<()> {
    let model = schema::load_schema_file(system, &args.schema)?;
    let saved = match args.values.as_deref() {
        Some(path) => load_values_file(system, path)?,
        None => ConfigValues::new(),
    };

    let (saved_enterprise, saved_personal) = match args.scope {
        ConfigScope::Enterprise => (saved, ConfigValues::new()),
        ConfigScope::Personal => (ConfigValues::new(), saved),
    };
    let mut session = EditingSession::open(
        ConfigTarget::new("local", "local"),
        model,
        saved_enterprise,
        saved_personal,
        SessionSettings::default(),
    );

    apply_edits(&mut session, &args.edits.parse_edits()?)?;
    let errors = session.validate(args.scope);

    println!("{}", report(&session, args.scope, &errors, format)?);

    if errors.is_empty() {
        Ok(())
    } else {
        info!("{} field(s) failed validation", errors.len());
        Err(PlugconfError::validation(format!(
            "{} {} field(s) failed validation",
            errors.len(),
            args.scope
        ))
        .into())
    }
}

/// Render a validation report
///
/// # Errors
///
/// Returns an error if the JSON report cannot be serialized.
#[inline]
pub fn report(
    session: &EditingSession,
    scope: ConfigScope,
    errors: &FieldErrors,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "scope": scope,
            "valid": errors.is_empty(),
            "errors": errors,
        }))
        .context("Failed to serialize validation report"),
        OutputFormat::Text if errors.is_empty() => {
            Ok(format!("✓ The {scope} configuration is valid"))
        }
        OutputFormat::Text => Ok(format!(
            "The {scope} configuration has {} invalid field(s):\n{}",
            errors.len(),
            format_errors(session.schema(), errors)
        )),
    }
}
