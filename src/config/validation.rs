//! Semantic checks on loaded settings

use crate::config::{BackendKind, Settings};
use crate::error::PlugconfError;
use anyhow::Result;
use regex::Regex;

/// Validate settings after environment overrides were applied
///
/// # Errors
///
/// Returns an error if:
/// - The http backend is selected without a base URL
/// - The base URL is malformed
/// - The timeout is zero
/// - The file backend root is blank
#[inline]
pub fn validate_settings(settings: &Settings) -> Result<()> {
    let backend = &settings.backend;

    if let Some(base_url) = backend.base_url.as_ref() {
        validate_base_url(base_url)?;
    } else if backend.kind == BackendKind::Http {
        return Err(PlugconfError::configuration(
            "The http backend needs backend.baseUrl or PLUGCONF_BASE_URL",
        )
        .into());
    }

    if backend.timeout_secs == 0 {
        return Err(PlugconfError::configuration("backend.timeoutSecs must be at least 1").into());
    }

    if let Some(root) = backend.root.as_ref()
        && root.trim().is_empty()
    {
        return Err(PlugconfError::configuration("backend.root cannot be empty").into());
    }

    Ok(())
}

/// Validate a registry base URL
///
/// # Errors
///
/// Returns an error if the URL is not `http(s)://host[:port][/path]`.
#[inline]
pub fn validate_base_url(url: &str) -> Result<()> {
    let regex = Regex::new(r"^https?://[^\s/:?#]+(:\d{1,5})?(/[^\s?#]*)?$")?;
    if regex.is_match(url) {
        return Ok(());
    }

    Err(PlugconfError::configuration(format!(
        "Invalid base URL format: '{url}'\n\
        Supported formats:\n\
        - http://localhost:8000\n\
        - https://registry.example.com/market"
    ))
    .into())
}
