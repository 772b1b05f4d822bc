//! `plugconf save`: validate and persist one scope

use core::time::Duration;
use std::time::Instant;

use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::debug;

use crate::cli::SaveArgs;
use crate::config::Settings;
use crate::error::PlugconfError;
use crate::operations::resolve::open_session;
use crate::operations::{OutputFormat, apply_edits, format_errors};
use crate::persistence::{ConfigBackend, ConfigTarget};
use crate::schema::{self, ConfigScope};
use crate::session::{EditingSession, SaveOutcome, SaveRejected};
use crate::system::System;

/// Run the save command
///
/// # Errors
///
/// Returns a validation error when fields are invalid (nothing is sent),
/// or a persistence error when the backend refuses or cannot be reached.
#[inline]
pub fn run_save(
    system: &dyn System,
    settings: &Settings,
    args: &SaveArgs,
    format: OutputFormat,
) -> Result<()> {
    let model = schema::load_schema_file(system, &args.schema)?;
    if !model.has_scope(args.scope) {
        return Err(PlugconfError::configuration(format!(
            "The schema declares no {} configuration fields",
            args.scope
        ))
        .into());
    }

    let backend = settings.backend(system)?;
    let target = ConfigTarget::new(args.target.plugin.clone(), args.target.version_id.clone());
    let mut session = open_session(backend.as_ref(), target, model, settings)?;

    apply_edits(&mut session, &args.edits.parse_edits()?)?;
    let dirty = session.scope(args.scope).store().dirty_keys().len();
    debug!("{dirty} {} field(s) changed before saving", args.scope);

    let outcome = save_scope(&mut session, args.scope, backend.as_ref(), format)?;
    finish(&session, args.scope, &outcome, format)
}

/// Drive one save cycle with a spinner while the request is in flight
///
/// # Errors
///
/// Returns a validation error carrying the field errors when the scope is
/// invalid; the error report is printed first.
#[inline]
pub fn save_scope(
    session: &mut EditingSession,
    scope: ConfigScope,
    backend: &dyn ConfigBackend,
    format: OutputFormat,
) -> Result<SaveOutcome> {
    let ticket = match session.begin_save(scope, Instant::now()) {
        Ok(ticket) => ticket,
        Err(SaveRejected::Invalid(errors)) => {
            let report = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&json!({
                    "scope": scope,
                    "saved": false,
                    "errors": errors,
                }))
                .context("Failed to serialize save report")?,
                OutputFormat::Text => format!(
                    "{}\n{}",
                    session
                        .scope(scope)
                        .state()
                        .message()
                        .unwrap_or_default(),
                    format_errors(session.schema(), &errors)
                ),
            };
            println!("{report}");
            return Err(PlugconfError::validation(format!(
                "{} {scope} field(s) failed validation",
                errors.len()
            ))
            .into());
        }
        Err(rejected) => return Err(PlugconfError::persistence(rejected.to_string()).into()),
    };

    let spinner = spinner(scope, format);
    let result = backend.save(ticket.target(), scope, ticket.payload());
    spinner.finish_and_clear();

    Ok(session.complete_save(ticket, result, Instant::now()))
}

fn spinner(scope: ConfigScope, format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Saving {scope} configuration..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn finish(
    session: &EditingSession,
    scope: ConfigScope,
    outcome: &SaveOutcome,
    format: OutputFormat,
) -> Result<()> {
    let message = session.scope(scope).state().message().unwrap_or_default();

    match *outcome {
        SaveOutcome::Saved => {
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "scope": scope,
                        "saved": true,
                        "values": session.scope(scope).baseline(),
                    }))
                    .context("Failed to serialize save report")?
                ),
                OutputFormat::Text => println!("✓ {message}"),
            }
            Ok(())
        }
        SaveOutcome::Failed(ref reason) => {
            if format == OutputFormat::Json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "scope": scope,
                        "saved": false,
                        "message": reason,
                    }))
                    .context("Failed to serialize save report")?
                );
            }
            Err(PlugconfError::persistence(reason.clone()).into())
        }
        SaveOutcome::Ignored => Err(PlugconfError::persistence(
            "The save response arrived after the edits were discarded",
        )
        .into()),
    }
}
