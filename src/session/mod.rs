//! Editing session over both configuration scopes of one plugin version
//!
//! Each scope owns its own [`ValueStore`], error map, saved baseline and
//! save state. Saving one scope never validates, submits or alters the
//! other.

pub mod state;

pub use state::{SaveFailure, SaveOutcome, SaveRejected, SaveState, SaveTicket};

use core::time::Duration;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::persistence::{ConfigBackend, ConfigTarget};
use crate::render;
use crate::schema::{ConfigScope, SchemaModel};
use crate::store::{ConfigValues, FieldErrors, UnknownField, ValueStore};
use crate::validation;

// Global counter for telling sessions apart when responses arrive late
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Behaviour knobs for an editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// How long `Success`/`Error` stay visible before returning to `Idle`
    pub display_interval: Duration,
    /// Re-check a field right after each edit instead of only on save
    pub live_validation: bool,
}

impl Default for SessionSettings {
    #[inline]
    fn default() -> Self {
        Self {
            display_interval: Duration::from_millis(3000),
            live_validation: false,
        }
    }
}

/// Raised when an edit names a key the schema does not declare
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditError {
    #[error("Unknown configuration field '{0}'")]
    UnknownKey(String),

    #[error(transparent)]
    Store(#[from] UnknownField),
}

/// State of one scope inside a session
#[derive(Debug, Clone)]
pub struct ScopeEditor {
    scope: ConfigScope,
    store: ValueStore,
    /// Last values known to be persisted
    baseline: ConfigValues,
    state: SaveState,
    /// Bumped when edits are discarded so stale responses are ignored
    epoch: u64,
}

impl ScopeEditor {
    fn new(schema: &SchemaModel, scope: ConfigScope, saved: ConfigValues) -> Self {
        Self {
            scope,
            store: ValueStore::initialize(schema, scope, &saved),
            baseline: saved,
            state: SaveState::Idle,
            epoch: 0,
        }
    }

    #[must_use]
    #[inline]
    pub const fn scope(&self) -> ConfigScope {
        self.scope
    }

    #[must_use]
    #[inline]
    pub const fn store(&self) -> &ValueStore {
        &self.store
    }

    #[must_use]
    #[inline]
    pub const fn state(&self) -> &SaveState {
        &self.state
    }

    /// Values the collaborator last acknowledged
    #[must_use]
    #[inline]
    pub const fn baseline(&self) -> &ConfigValues {
        &self.baseline
    }

    /// Whether the save trigger should be enabled
    #[must_use]
    #[inline]
    pub const fn can_save(&self) -> bool {
        !self.state.is_saving()
    }
}

/// One user's editing session for a plugin version
#[derive(Debug, Clone)]
pub struct EditingSession {
    id: u64,
    target: ConfigTarget,
    schema: SchemaModel,
    settings: SessionSettings,
    enterprise: ScopeEditor,
    personal: ScopeEditor,
}

impl EditingSession {
    /// Start a session from already-loaded saved values
    #[must_use]
    #[inline]
    pub fn open(
        target: ConfigTarget,
        schema: SchemaModel,
        saved_enterprise: ConfigValues,
        saved_personal: ConfigValues,
        settings: SessionSettings,
    ) -> Self {
        let id = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
        let enterprise = ScopeEditor::new(&schema, ConfigScope::Enterprise, saved_enterprise);
        let personal = ScopeEditor::new(&schema, ConfigScope::Personal, saved_personal);
        debug!("Opened configuration session {id} for {target}");

        Self {
            id,
            target,
            schema,
            settings,
            enterprise,
            personal,
        }
    }

    /// Start a session, reading saved values of every scope the schema uses
    ///
    /// # Errors
    ///
    /// Returns the first [`PersistenceError`] raised while loading.
    #[inline]
    pub fn load(
        backend: &dyn ConfigBackend,
        target: ConfigTarget,
        schema: SchemaModel,
        settings: SessionSettings,
    ) -> Result<Self, PersistenceError> {
        let mut saved = [ConfigValues::new(), ConfigValues::new()];
        for (slot, scope) in saved.iter_mut().zip(ConfigScope::ALL) {
            if schema.has_scope(scope) {
                *slot = backend.load(&target, scope)?;
            }
        }
        let [saved_enterprise, saved_personal] = saved;
        Ok(Self::open(target, schema, saved_enterprise, saved_personal, settings))
    }

    #[must_use]
    #[inline]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    #[inline]
    pub const fn target(&self) -> &ConfigTarget {
        &self.target
    }

    #[must_use]
    #[inline]
    pub const fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    #[must_use]
    #[inline]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    #[inline]
    pub const fn scope(&self, scope: ConfigScope) -> &ScopeEditor {
        match scope {
            ConfigScope::Enterprise => &self.enterprise,
            ConfigScope::Personal => &self.personal,
        }
    }

    /// Schema plus the mutable editor of one scope
    fn parts(&mut self, scope: ConfigScope) -> (&SchemaModel, &mut ScopeEditor) {
        let editor = match scope {
            ConfigScope::Enterprise => &mut self.enterprise,
            ConfigScope::Personal => &mut self.personal,
        };
        (&self.schema, editor)
    }

    fn owner_of(&self, key: &str) -> Result<ConfigScope, EditError> {
        self.schema
            .field(key)
            .map(|field| field.scope)
            .ok_or_else(|| EditError::UnknownKey(key.to_owned()))
    }

    /// Replace a field's value in the scope that owns it
    ///
    /// Clears the field's error; with live validation on, re-checks just that
    /// field.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::UnknownKey`] if the schema has no such field.
    #[inline]
    pub fn set(&mut self, key: &str, value: Value) -> Result<ConfigScope, EditError> {
        let scope = self.owner_of(key)?;
        let live = self.settings.live_validation;
        let (schema, editor) = self.parts(scope);

        editor.store.set(key, value)?;
        if live {
            let message = validation::validate_field(schema, &editor.store, key);
            editor.store.set_error(key, message);
        }
        Ok(scope)
    }

    /// Apply raw control text to a field, interpreting it for the field's type
    ///
    /// # Errors
    ///
    /// Returns [`EditError::UnknownKey`] if the schema has no such field.
    #[inline]
    pub fn edit(&mut self, key: &str, raw: &str) -> Result<ConfigScope, EditError> {
        let field = self
            .schema
            .field(key)
            .ok_or_else(|| EditError::UnknownKey(key.to_owned()))?;
        let value = render::apply_edit(field, raw);
        self.set(key, value)
    }

    /// Restore a field to its saved (or default) value
    ///
    /// # Errors
    ///
    /// Returns [`EditError::UnknownKey`] if the schema has no such field.
    #[inline]
    pub fn reset(&mut self, key: &str) -> Result<ConfigScope, EditError> {
        let scope = self.owner_of(key)?;
        self.parts(scope).1.store.reset(key)?;
        Ok(scope)
    }

    /// Run a validation pass over one scope and attach the result to its store
    #[inline]
    pub fn validate(&mut self, scope: ConfigScope) -> FieldErrors {
        let (schema, editor) = self.parts(scope);
        let errors = validation::validate(schema, &editor.store);
        editor.store.set_errors(errors.clone());
        errors
    }

    /// Validate one scope and, if clean, hand out the payload to submit
    ///
    /// # Errors
    ///
    /// - [`SaveRejected::InFlight`] while a save of this scope is outstanding
    /// - [`SaveRejected::Invalid`] when validation fails; the scope moves to
    ///   `Error` and the messages are attached to its store
    #[inline]
    pub fn begin_save(
        &mut self,
        scope: ConfigScope,
        now: Instant,
    ) -> Result<SaveTicket, SaveRejected> {
        let session = self.id;
        let target = self.target.clone();
        let (schema, editor) = self.parts(scope);

        if editor.state.is_saving() {
            warn!("Ignoring {scope} save request: a save is already in progress");
            return Err(SaveRejected::InFlight(scope));
        }

        editor.state = SaveState::Validating;
        let errors = validation::validate(schema, &editor.store);
        if !errors.is_empty() {
            info!("{scope} configuration has {} invalid field(s)", errors.len());
            editor.store.set_errors(errors.clone());
            editor.state = SaveState::Error {
                failure: SaveFailure::Invalid(errors.clone()),
                at: now,
            };
            return Err(SaveRejected::Invalid(errors));
        }

        editor.store.clear_errors();
        editor.state = SaveState::Saving;
        debug!("Submitting {scope} configuration for {target}");

        Ok(SaveTicket {
            session,
            epoch: editor.epoch,
            scope,
            target,
            payload: editor.store.serialize(),
        })
    }

    /// Apply the collaborator's answer to a save started by [`begin_save`](Self::begin_save)
    ///
    /// On success the submitted payload becomes the scope's saved baseline.
    /// On failure the user's values stay as they are and the collaborator's
    /// message is kept. Answers for another session, a discarded edit cycle,
    /// or a scope that is not saving are ignored.
    #[inline]
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), PersistenceError>,
        now: Instant,
    ) -> SaveOutcome {
        if ticket.session != self.id {
            debug!("Ignoring save response for session {}", ticket.session);
            return SaveOutcome::Ignored;
        }

        let scope = ticket.scope;
        let editor = self.parts(scope).1;
        if ticket.epoch != editor.epoch || !editor.state.is_saving() {
            debug!("Ignoring stale {scope} save response");
            return SaveOutcome::Ignored;
        }

        match result {
            Ok(()) => {
                editor.store.mark_saved(&ticket.payload);
                editor.baseline = ticket.payload;
                editor.state = SaveState::Success { at: now };
                info!("Saved {scope} configuration for {}", ticket.target);
                SaveOutcome::Saved
            }
            Err(err) => {
                let message = err.user_message();
                warn!("Saving {scope} configuration failed: {message}");
                editor.state = SaveState::Error {
                    failure: SaveFailure::Rejected(err),
                    at: now,
                };
                SaveOutcome::Failed(message)
            }
        }
    }

    /// Validate, submit and complete a save in one call
    #[inline]
    pub fn save_with(&mut self, scope: ConfigScope, backend: &dyn ConfigBackend) -> SaveOutcome {
        let ticket = match self.begin_save(scope, Instant::now()) {
            Ok(ticket) => ticket,
            Err(rejected) => return SaveOutcome::Failed(rejected.to_string()),
        };
        let result = backend.save(ticket.target(), scope, ticket.payload());
        self.complete_save(ticket, result, Instant::now())
    }

    /// Return scopes showing `Success` or `Error` to `Idle` once the display interval passed
    #[inline]
    pub fn tick(&mut self, now: Instant) {
        let interval = self.settings.display_interval;
        for editor in [&mut self.enterprise, &mut self.personal] {
            let shown_since = match editor.state {
                SaveState::Success { at } | SaveState::Error { at, .. } => at,
                SaveState::Idle | SaveState::Validating | SaveState::Saving => continue,
            };
            if now.saturating_duration_since(shown_since) >= interval {
                editor.state = SaveState::Idle;
            }
        }
    }

    /// Drop unsaved edits of one scope and abandon any in-flight save
    ///
    /// The store is rebuilt from the saved baseline; a response for the
    /// abandoned save will be ignored.
    #[inline]
    pub fn discard(&mut self, scope: ConfigScope) {
        let (schema, editor) = self.parts(scope);
        editor.epoch += 1;
        editor.store = ValueStore::initialize(schema, scope, &editor.baseline);
        editor.state = SaveState::Idle;
        debug!("Discarded {scope} edits");
    }
}
