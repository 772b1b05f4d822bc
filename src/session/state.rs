//! Save state machine types for one configuration scope

use std::time::Instant;

use thiserror::Error;

use crate::error::PersistenceError;
use crate::persistence::ConfigTarget;
use crate::schema::ConfigScope;
use crate::store::{ConfigValues, FieldErrors};

/// Message shown when a save is blocked by field errors
pub const INVALID_MESSAGE: &str = "Please fix validation errors before saving";

/// Where a scope is in its save cycle
///
/// `Success` and `Error` fall back to `Idle` once the display interval has
/// elapsed; nothing is terminal.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SaveState {
    Idle,
    Validating,
    /// One request is in flight; further saves of this scope are refused
    Saving,
    Success { at: Instant },
    Error { failure: SaveFailure, at: Instant },
}

impl SaveState {
    #[must_use]
    #[inline]
    pub const fn is_saving(&self) -> bool {
        matches!(*self, Self::Saving)
    }

    #[must_use]
    #[inline]
    pub const fn name(&self) -> &'static str {
        match *self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Saving => "saving",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    /// Status line for the scope's save area, if any
    #[must_use]
    #[inline]
    pub fn message(&self) -> Option<String> {
        match *self {
            Self::Idle | Self::Validating => None,
            Self::Saving => Some("Saving...".to_owned()),
            Self::Success { .. } => Some("Configuration saved successfully".to_owned()),
            Self::Error { ref failure, .. } => Some(failure.message()),
        }
    }
}

/// Why a save ended in the error state
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SaveFailure {
    /// Blocked before submission by field errors
    Invalid(FieldErrors),
    /// Submitted and refused or lost by the persistence collaborator
    Rejected(PersistenceError),
}

impl SaveFailure {
    #[must_use]
    #[inline]
    pub fn message(&self) -> String {
        match *self {
            Self::Invalid(_) => INVALID_MESSAGE.to_owned(),
            Self::Rejected(ref err) => err.user_message(),
        }
    }
}

/// Why a save could not start
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SaveRejected {
    #[error("A save of the {0} configuration is already in progress")]
    InFlight(ConfigScope),

    #[error("Please fix validation errors before saving")]
    Invalid(FieldErrors),
}

/// Handle for one in-flight save
///
/// Carries the exact payload handed to the collaborator. A ticket from a
/// closed session or a discarded edit cycle is ignored on completion.
#[derive(Debug, Clone)]
#[must_use = "a started save must be completed"]
pub struct SaveTicket {
    pub(crate) session: u64,
    pub(crate) epoch: u64,
    pub(crate) scope: ConfigScope,
    pub(crate) target: ConfigTarget,
    pub(crate) payload: ConfigValues,
}

impl SaveTicket {
    #[must_use]
    #[inline]
    pub const fn scope(&self) -> ConfigScope {
        self.scope
    }

    #[must_use]
    #[inline]
    pub const fn target(&self) -> &ConfigTarget {
        &self.target
    }

    /// Values to submit
    #[must_use]
    #[inline]
    pub const fn payload(&self) -> &ConfigValues {
        &self.payload
    }
}

/// Result of applying a collaborator response
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SaveOutcome {
    Saved,
    /// The save failed; carries the user-facing message
    Failed(String),
    /// The response arrived for a session or edit cycle that no longer exists
    Ignored,
}
