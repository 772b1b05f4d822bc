//! Response envelope used by the plugin registry API

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Code the registry uses to signal success
pub const SUCCESS_CODE: i64 = 200;

/// `{code, message, data?}` envelope wrapping every API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying `data`
    #[inline]
    pub fn ok(data: Option<T>) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: "OK".to_owned(),
            data,
        }
    }

    /// Failed envelope with a user-facing message
    #[inline]
    pub fn failure<S: Into<String>>(code: i64, message: S) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Unwrap the payload, turning any non-200 code into an application error
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Application`] carrying the envelope's
    /// message when `code` is not 200.
    #[inline]
    pub fn into_result(self) -> Result<Option<T>, PersistenceError> {
        if self.code == SUCCESS_CODE {
            Ok(self.data)
        } else {
            Err(PersistenceError::Application {
                code: self.code,
                message: if self.message.is_empty() {
                    format!("Request failed with code {}", self.code)
                } else {
                    self.message
                },
            })
        }
    }
}
