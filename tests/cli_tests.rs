//! CLI interface tests

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/analytics.schema.json")
        .display()
        .to_string()
}

/// Settings file pointing the file backend into the temp dir
fn write_settings(temp_dir: &TempDir) -> PathBuf {
    let data_dir = temp_dir.path().join("data");
    let settings_path = temp_dir.path().join("plugconf.yaml");
    fs::write(
        &settings_path,
        format!("backend:\n  kind: file\n  root: {}\n", data_dir.display()),
    )
    .unwrap();
    settings_path
}

fn plugconf(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("plugconf").unwrap();
    cmd.current_dir(temp_dir.path())
        .env_remove("PLUGCONF_DATA_DIR")
        .env_remove("PLUGCONF_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("plugconf").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("plugconf"));
}

#[test]
fn test_help_flag() {
    let mut cmd = Command::cargo_bin("plugconf").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Inspect, validate and save plugin configuration",
        ));
}

#[test]
fn test_inspect_lists_both_scopes() {
    let temp_dir = TempDir::new().unwrap();
    plugconf(&temp_dir)
        .args(["inspect", "--schema", &fixture()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enterprise configuration (9 fields)"))
        .stdout(predicate::str::contains("Personal configuration (3 fields)"))
        .stdout(predicate::str::contains("apiKey * [password] API key: password-input"));
}

#[test]
fn test_inspect_metadata_without_schema() {
    let temp_dir = TempDir::new().unwrap();
    let metadata = temp_dir.path().join("version.json");
    fs::write(&metadata, r#"{"id": 3, "configSchema": null}"#).unwrap();

    plugconf(&temp_dir)
        .args(["inspect", "--metadata", metadata.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("This plugin version has no configuration"));
}

#[test]
fn test_missing_schema_file() {
    let temp_dir = TempDir::new().unwrap();
    plugconf(&temp_dir)
        .args(["inspect", "--schema", "nonexistent.json"])
        .assert()
        .failure()
        .code(5) // Filesystem error
        .stderr(predicate::str::contains("Schema file not found"));
}

#[test]
fn test_validate_reports_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    plugconf(&temp_dir)
        .args(["validate", "--schema", &fixture(), "--scope", "enterprise"])
        .assert()
        .failure()
        .code(3) // Validation error
        .stdout(predicate::str::contains(
            "API key (apiKey): This field is required",
        ))
        .stdout(predicate::str::contains(
            "Endpoint (endpoint): This field is required",
        ));
}

#[test]
fn test_validate_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let output = plugconf(&temp_dir)
        .args([
            "validate",
            "--schema",
            &fixture(),
            "--output-format",
            "json",
            "--set",
            "endpoint=https://ingest.example.com",
            "--set",
            "apiKey=short",
            "--set",
            "batchSize=900",
        ])
        .assert()
        .code(3)
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], Value::Bool(false));
    assert_eq!(report["errors"]["apiKey"], "Must be at least 32 characters");
    assert_eq!(report["errors"]["batchSize"], "Must be at most 500");
    assert!(report["errors"].get("endpoint").is_none());
}

#[test]
fn test_validate_passes_with_values_file() {
    let temp_dir = TempDir::new().unwrap();
    let values = temp_dir.path().join("values.json");
    fs::write(
        &values,
        r#"{"endpoint": "https://ingest.example.com", "apiKey": "0123456789abcdef0123456789abcdef"}"#,
    )
    .unwrap();

    plugconf(&temp_dir)
        .args([
            "validate",
            "--schema",
            &fixture(),
            "--values",
            values.to_str().unwrap(),
            "--set-json",
            r#"headers={"X-Team": "data"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("The enterprise configuration is valid"));
}

#[test]
fn test_unknown_field_is_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    plugconf(&temp_dir)
        .args(["validate", "--schema", &fixture(), "--set", "colour=blue"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unknown configuration field 'colour'"));
}

#[test]
fn test_save_then_resolve() {
    let temp_dir = TempDir::new().unwrap();
    let settings = write_settings(&temp_dir);
    let settings = settings.to_str().unwrap();

    plugconf(&temp_dir)
        .args([
            "save",
            "--config",
            settings,
            "--schema",
            &fixture(),
            "--plugin",
            "analytics",
            "--version-id",
            "12",
            "--scope",
            "personal",
            "--set",
            "theme=dark",
            "--set",
            "pageSize=25",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration saved successfully"));

    let saved_path = temp_dir.path().join("data/analytics/12/personal.json");
    let saved: Value = serde_json::from_str(&fs::read_to_string(saved_path).unwrap()).unwrap();
    assert_eq!(saved["theme"], "dark");
    assert_eq!(saved["pageSize"], 25);
    assert!(
        !temp_dir
            .path()
            .join("data/analytics/12/enterprise.json")
            .exists()
    );

    let output = plugconf(&temp_dir)
        .args([
            "resolve",
            "--config",
            settings,
            "--schema",
            &fixture(),
            "--plugin",
            "analytics",
            "--version-id",
            "12",
            "--scope",
            "personal",
            "--output-format",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let resolved: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(resolved["theme"], "dark");
    assert_eq!(resolved["digestTime"], "");
}

#[test]
fn test_invalid_save_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let settings = write_settings(&temp_dir);

    plugconf(&temp_dir)
        .args([
            "save",
            "--config",
            settings.to_str().unwrap(),
            "--schema",
            &fixture(),
            "--plugin",
            "analytics",
            "--version-id",
            "12",
            "--scope",
            "enterprise",
            "--set",
            "endpoint=ftp://ingest.example.com",
        ])
        .assert()
        .failure()
        .code(3)
        .stdout(predicate::str::contains("Please fix validation errors before saving"))
        .stdout(predicate::str::contains("Endpoint (endpoint): Invalid format"));

    assert!(!temp_dir.path().join("data").exists());
}

#[test]
fn test_missing_explicit_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    plugconf(&temp_dir)
        .args([
            "resolve",
            "--config",
            "missing.yaml",
            "--schema",
            &fixture(),
            "--plugin",
            "analytics",
            "--version-id",
            "12",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Settings file not found"));
}

#[test]
fn test_schema_file_without_fields() {
    let temp_dir = TempDir::new().unwrap();
    let schema = temp_dir.path().join("empty.schema.json");
    fs::write(&schema, r#"{"properties": {}}"#).unwrap();
    let schema = schema.to_str().unwrap();

    plugconf(&temp_dir)
        .args(["inspect", "--schema", schema])
        .assert()
        .success()
        .stdout(predicate::str::contains("This plugin version has no configuration"));

    let output = plugconf(&temp_dir)
        .args(["inspect", "--schema", schema, "--output-format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["available"], Value::Bool(false));

    plugconf(&temp_dir)
        .args(["validate", "--schema", schema])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("This plugin version has no configuration"));
}
