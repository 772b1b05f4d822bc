//! `plugconf resolve`: show the values an editing session starts from

use anyhow::{Context as _, Result};
use serde_json::{Map, Value};

use crate::cli::ResolveArgs;
use crate::config::Settings;
use crate::error::PlugconfError;
use crate::operations::OutputFormat;
use crate::persistence::{ConfigBackend, ConfigTarget};
use crate::render;
use crate::schema::{self, ConfigScope};
use crate::session::EditingSession;
use crate::system::System;

/// Shown instead of secret values in text output
pub const MASK: &str = "********";

/// Run the resolve command
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded or the backend cannot be
/// read.
#[inline]
pub fn run_resolve(
    system: &dyn System,
    settings: &Settings,
    args: &ResolveArgs,
    format: OutputFormat,
) -> Result<()> {
    let model = schema::load_schema_file(system, &args.schema)?;
    let backend = settings.backend(system)?;
    let target = ConfigTarget::new(args.target.plugin.clone(), args.target.version_id.clone());

    let session = open_session(backend.as_ref(), target, model, settings)?;
    println!("{}", report(&session, args.scope, format)?);
    Ok(())
}

/// Load saved values of every scope into a new session
///
/// # Errors
///
/// Returns a persistence error if the backend cannot be read.
#[inline]
pub fn open_session(
    backend: &dyn ConfigBackend,
    target: ConfigTarget,
    model: schema::SchemaModel,
    settings: &Settings,
) -> Result<EditingSession> {
    let description = target.to_string();
    EditingSession::load(backend, target, model, settings.session_settings())
        .map_err(|err| PlugconfError::persistence(err.user_message()))
        .with_context(|| format!("Failed to load saved configuration for {description}"))
}

/// Render resolved values of one or both scopes
///
/// # Errors
///
/// Returns an error if the JSON report cannot be serialized.
#[inline]
pub fn report(
    session: &EditingSession,
    only: Option<ConfigScope>,
    format: OutputFormat,
) -> Result<String> {
    let scopes: Vec<ConfigScope> = only.map_or_else(|| ConfigScope::ALL.to_vec(), |scope| vec![scope]);

    match format {
        OutputFormat::Json => {
            let value = match only {
                Some(scope) => Value::Object(session.scope(scope).store().serialize()),
                None => {
                    let mut all = Map::new();
                    for scope in scopes {
                        all.insert(
                            scope.to_string(),
                            Value::Object(session.scope(scope).store().serialize()),
                        );
                    }
                    Value::Object(all)
                }
            };
            serde_json::to_string_pretty(&value).context("Failed to serialize resolved values")
        }
        OutputFormat::Text => {
            let mut lines = Vec::new();
            for scope in scopes {
                let fields = session.schema().fields_in(scope);
                if fields.is_empty() {
                    continue;
                }
                lines.push(format!("[{scope}]"));
                let store = session.scope(scope).store();
                for field in fields {
                    let shown = match store.get(&field.key) {
                        Some(value) if field.is_secret() && !crate::store::is_empty_value(value) => {
                            MASK.to_owned()
                        }
                        Some(value) => render::display_value(field, value),
                        None => String::new(),
                    };
                    lines.push(format!("{} = {shown}", field.key));
                }
            }
            Ok(lines.join("\n"))
        }
    }
}
