//! Plugin registry API backend
//!
//! `GET`/`POST {base}/api/v1/plugins/{plugin}/config?version_id={v}&scope={scope}`,
//! every response wrapped in an [`ApiEnvelope`].

use core::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use super::envelope::ApiEnvelope;
use super::{ConfigBackend, ConfigTarget};
use crate::error::PersistenceError;
use crate::schema::ConfigScope;
use crate::store::ConfigValues;

/// Blocking HTTP client for the registry's configuration endpoints
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Build a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Transport`] if `base_url` is not an absolute
    /// URL with a path, or the HTTP client cannot be built.
    #[inline]
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PersistenceError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| PersistenceError::Transport {
                status: None,
                message: format!("Invalid registry base URL: {base_url}"),
            })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PersistenceError::Transport {
                status: None,
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, base_url })
    }

    /// Configuration route of `target`, with the plugin id as one encoded segment
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Transport`] for a blank, `.` or `..` plugin id,
    /// which cannot name a single path segment.
    #[inline]
    pub fn endpoint(&self, target: &ConfigTarget) -> Result<Url, PersistenceError> {
        let plugin_id = target.plugin_id.as_str();
        if plugin_id.trim().is_empty() || plugin_id == "." || plugin_id == ".." {
            return Err(PersistenceError::Transport {
                status: None,
                message: format!("Invalid plugin identifier: '{plugin_id}'"),
            });
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PersistenceError::Transport {
                status: None,
                message: format!("Invalid registry base URL: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(["api", "v1", "plugins", plugin_id, "config"]);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder, url: &Url) -> Result<Option<Value>, PersistenceError> {
        let response = request.send().map_err(|e| PersistenceError::Transport {
            status: e.status().map(|status| status.as_u16()),
            message: format!("Request to {url} failed: {e}"),
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| PersistenceError::Transport {
            status: Some(status),
            message: format!("Failed to read response from {url}: {e}"),
        })?;

        interpret_response(status, &body)
    }
}

/// Turn an HTTP status and body into the envelope's payload
///
/// Non-2xx statuses are transport failures even when the body carries an
/// envelope; its message is kept so the user sees the server's words.
///
/// # Errors
///
/// - [`PersistenceError::Transport`] for non-2xx statuses
/// - [`PersistenceError::Decode`] for a 2xx body that is not an envelope
/// - [`PersistenceError::Application`] for an envelope code other than 200
#[inline]
pub fn interpret_response(status: u16, body: &str) -> Result<Option<Value>, PersistenceError> {
    let envelope = serde_json::from_str::<ApiEnvelope<Value>>(body);

    if !(200..300).contains(&status) {
        let message = envelope
            .ok()
            .map(|envelope| envelope.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("Server responded with HTTP {status}"));
        warn!("Configuration request failed with HTTP {status}: {message}");
        return Err(PersistenceError::Transport {
            status: Some(status),
            message,
        });
    }

    envelope
        .map_err(|e| PersistenceError::Decode(e.to_string()))?
        .into_result()
}

impl ConfigBackend for HttpBackend {
    fn load(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
    ) -> Result<ConfigValues, PersistenceError> {
        let url = self.endpoint(target)?;
        debug!("Loading {scope} configuration from {url}");

        let request = self.client.get(url.clone()).query(&[
            ("version_id", target.version_id.as_str()),
            ("scope", scope.as_str()),
        ]);

        match self.send(request, &url)? {
            None | Some(Value::Null) => Ok(ConfigValues::new()),
            Some(Value::Object(values)) => Ok(values),
            Some(_) => Err(PersistenceError::Decode(
                "configuration payload is not a JSON object".to_owned(),
            )),
        }
    }

    fn save(
        &self,
        target: &ConfigTarget,
        scope: ConfigScope,
        values: &ConfigValues,
    ) -> Result<(), PersistenceError> {
        let url = self.endpoint(target)?;
        debug!("Saving {} {scope} values to {url}", values.len());

        let request = self
            .client
            .post(url.clone())
            .query(&[
                ("version_id", target.version_id.as_str()),
                ("scope", scope.as_str()),
            ])
            .json(values);

        self.send(request, &url).map(|_data| ())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn application_and_transport_errors_differ() {
        let app = interpret_response(200, r#"{"code": 500, "message": "db unavailable"}"#)
            .unwrap_err();
        assert_eq!(
            app,
            PersistenceError::Application {
                code: 500,
                message: "db unavailable".to_owned()
            }
        );

        let transport =
            interpret_response(400, r#"{"code": 400, "message": "Invalid version ID"}"#)
                .unwrap_err();
        assert_eq!(
            transport,
            PersistenceError::Transport {
                status: Some(400),
                message: "Invalid version ID".to_owned()
            }
        );

        let bare = interpret_response(502, "<html>bad gateway</html>").unwrap_err();
        assert_eq!(bare.user_message(), "Server responded with HTTP 502");
    }

    #[test]
    fn success_payload_is_returned() {
        let data = interpret_response(200, r#"{"code": 200, "message": "ok", "data": {"a": 1}}"#)
            .unwrap();
        assert_eq!(data, Some(json!({"a": 1})));
        assert!(matches!(
            interpret_response(200, "not json"),
            Err(PersistenceError::Decode(_))
        ));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            backend.endpoint(&ConfigTarget::new("42", "7")).unwrap().as_str(),
            "http://localhost:8000/api/v1/plugins/42/config"
        );

        let prefixed =
            HttpBackend::new("https://registry.example.com/market", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            prefixed.endpoint(&ConfigTarget::new("42", "7")).unwrap().as_str(),
            "https://registry.example.com/market/api/v1/plugins/42/config"
        );
    }

    #[test]
    fn plugin_id_stays_one_path_segment() {
        let backend = HttpBackend::new("http://localhost:8000", Duration::from_secs(1)).unwrap();

        let url = backend
            .endpoint(&ConfigTarget::new("a?scope=personal#", "1"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v1/plugins/a%3Fscope=personal%23/config"
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        let url = backend
            .endpoint(&ConfigTarget::new("../../admin", "1"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v1/plugins/..%2F..%2Fadmin/config"
        );

        for plugin_id in ["", " ", ".", ".."] {
            assert!(
                backend.endpoint(&ConfigTarget::new(plugin_id, "1")).is_err(),
                "{plugin_id:?}"
            );
        }
    }

    #[test]
    fn relative_base_url_is_rejected() {
        assert!(HttpBackend::new("localhost:8000", Duration::from_secs(1)).is_err());
        assert!(HttpBackend::new("/api", Duration::from_secs(1)).is_err());
    }
}
