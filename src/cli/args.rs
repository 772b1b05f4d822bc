use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::Value;

use crate::operations::OutputFormat;
use crate::schema::ConfigScope;

/// Command-line arguments for plugconf
#[derive(Parser, Debug, Clone)]
#[command(name = "plugconf")]
#[command(about = "Inspect, validate and save plugin configuration against its schema")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Settings file path (defaults to ./plugconf.yaml when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: text or json
    #[arg(
        long = "output-format",
        value_name = "FORMAT",
        default_value = "text",
        global = true
    )]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the fields of each scope and the control that edits them
    Inspect(InspectArgs),

    /// Print the values a fresh editing session would start with
    Resolve(ResolveArgs),

    /// Check values against the schema without saving
    Validate(ValidateArgs),

    /// Validate and persist the values of one scope
    Save(SaveArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InspectArgs {
    /// Schema file (JSON or YAML)
    #[arg(long, value_name = "FILE", required_unless_present = "metadata")]
    pub schema: Option<String>,

    /// Plugin version metadata (JSON) carrying a `configSchema` entry
    #[arg(long, value_name = "FILE", conflicts_with = "schema")]
    pub metadata: Option<String>,
}

/// Which plugin version the configuration belongs to
#[derive(ClapArgs, Debug, Clone)]
pub struct TargetArgs {
    /// Plugin identifier
    #[arg(long, value_name = "ID")]
    pub plugin: String,

    /// Plugin version identifier
    #[arg(long = "version-id", value_name = "ID")]
    pub version_id: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ResolveArgs {
    #[arg(long, value_name = "FILE")]
    pub schema: String,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Only resolve one scope: enterprise or personal
    #[arg(long, value_name = "SCOPE")]
    pub scope: Option<ConfigScope>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, value_name = "FILE")]
    pub schema: String,

    /// Scope to validate: enterprise or personal
    #[arg(long, value_name = "SCOPE", default_value = "enterprise")]
    pub scope: ConfigScope,

    /// JSON file of saved values to start from
    #[arg(long, value_name = "FILE")]
    pub values: Option<String>,

    #[command(flatten)]
    pub edits: EditArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SaveArgs {
    #[arg(long, value_name = "FILE")]
    pub schema: String,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Scope to save: enterprise or personal
    #[arg(long, value_name = "SCOPE")]
    pub scope: ConfigScope,

    #[command(flatten)]
    pub edits: EditArgs,
}

/// Field edits applied on top of the resolved values
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct EditArgs {
    /// Field value in KEY=VALUE format, read the way the field's control reads text
    /// (can be specified multiple times)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Field value as JSON in KEY=JSON format (can be specified multiple times)
    /// Use this for arrays and objects
    #[arg(long = "set-json", value_name = "KEY=JSON")]
    pub set_json: Vec<String>,
}

/// One edit requested on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    /// Raw control text, interpreted for the field's type
    Text { key: String, raw: String },
    /// Exact JSON value
    Json { key: String, value: Value },
}

impl FieldEdit {
    #[must_use]
    #[inline]
    pub fn key(&self) -> &str {
        match *self {
            Self::Text { ref key, .. } | Self::Json { ref key, .. } => key,
        }
    }
}

impl EditArgs {
    /// Parse `--set` and `--set-json` into edits, `--set` first
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is not `KEY=VALUE` or its JSON is invalid.
    #[inline]
    pub fn parse_edits(&self) -> anyhow::Result<Vec<FieldEdit>> {
        parse_edit_args(&self.set, &self.set_json)
    }
}

fn parse_edit_args(set_args: &[String], set_json_args: &[String]) -> anyhow::Result<Vec<FieldEdit>> {
    let mut edits = Vec::with_capacity(set_args.len() + set_json_args.len());

    for arg in set_args {
        let (key, raw) = parse_key_value(arg)?;
        edits.push(FieldEdit::Text { key, raw });
    }

    for arg in set_json_args {
        let (key, json_str) = parse_key_value(arg)?;
        let value: Value = serde_json::from_str(&json_str).map_err(|e| {
            anyhow::anyhow!("Invalid JSON in --set-json for key '{key}': {e}\nValue: {json_str}")
        })?;
        edits.push(FieldEdit::Json { key, value });
    }

    Ok(edits)
}

/// Parse KEY=VALUE string
fn parse_key_value(arg: &str) -> anyhow::Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(anyhow::anyhow!(
            "Invalid field value '{arg}'. Expected KEY=VALUE"
        )),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_edits() {
        let set = vec!["host=db.internal".to_owned(), "filter=a=b".to_owned()];
        let edits = parse_edit_args(&set, &[]).unwrap();

        assert_eq!(
            edits,
            vec![
                FieldEdit::Text {
                    key: "host".to_owned(),
                    raw: "db.internal".to_owned()
                },
                FieldEdit::Text {
                    key: "filter".to_owned(),
                    raw: "a=b".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_parse_json_edits() {
        let json_args = vec![r#"limits={"rps":10}"#.to_owned()];
        let edits = parse_edit_args(&[], &json_args).unwrap();
        assert_eq!(edits[0].key(), "limits");
        assert_eq!(
            edits[0],
            FieldEdit::Json {
                key: "limits".to_owned(),
                value: json!({"rps": 10})
            }
        );
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let edits = parse_edit_args(&["token=".to_owned()], &[]).unwrap();
        assert_eq!(
            edits[0],
            FieldEdit::Text {
                key: "token".to_owned(),
                raw: String::new()
            }
        );
    }

    #[test]
    fn test_invalid_edit_format() {
        let err = parse_edit_args(&["invalid".to_owned()], &[]).unwrap_err();
        assert!(err.to_string().contains("Expected KEY=VALUE"));
        assert!(parse_edit_args(&["=x".to_owned()], &[]).is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_edit_args(&[], &["tags=[a".to_owned()]).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_subcommand_parsing() {
        let args = Args::try_parse_from([
            "plugconf",
            "save",
            "--schema",
            "schema.json",
            "--plugin",
            "analytics",
            "--version-id",
            "3",
            "--scope",
            "personal",
            "--set",
            "theme=dark",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(args.output_format, OutputFormat::Text);
        let Command::Save(save) = args.command else {
            panic!("expected save");
        };
        assert_eq!(save.scope, ConfigScope::Personal);
        assert_eq!(save.target.version_id, "3");
    }
}
