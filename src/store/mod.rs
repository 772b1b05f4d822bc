//! Working set of configuration values for one scope of an editing session
//!
//! A [`ValueStore`] is seeded from saved values, then schema defaults, then
//! type-appropriate empty values. It tracks which keys were edited and the
//! validation message currently attached to each key.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::{ConfigScope, SchemaModel};

/// Saved or submitted configuration values (key -> value)
pub type ConfigValues = Map<String, Value>;

/// Validation messages keyed by field key, in key order
pub type FieldErrors = BTreeMap<String, String>;

/// Raised when an edit targets a key the store's scope does not own
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Field '{key}' is not part of the {scope} configuration")]
pub struct UnknownField {
    pub key: String,
    pub scope: ConfigScope,
}

/// Check whether a value counts as empty for required-field purposes
///
/// `null`, the empty string, the empty array and the empty object are empty.
/// `false` and `0` are values.
#[must_use]
#[inline]
pub fn is_empty_value(value: &Value) -> bool {
    match *value {
        Value::Null => true,
        Value::String(ref s) => s.is_empty(),
        Value::Array(ref items) => items.is_empty(),
        Value::Object(ref map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Per-scope working values with dirty tracking and field errors
#[derive(Debug, Clone)]
pub struct ValueStore {
    scope: ConfigScope,
    /// Values resolved at initialization, used by `reset`
    initial: HashMap<String, Value>,
    values: ConfigValues,
    dirty: BTreeSet<String>,
    errors: FieldErrors,
}

impl ValueStore {
    /// Resolve every field of `scope` against `saved`
    ///
    /// Saved values win, then schema defaults, then the type's empty value.
    /// Saved keys the schema no longer declares are dropped. The result is
    /// a pure function of its inputs.
    #[must_use]
    #[inline]
    pub fn initialize(schema: &SchemaModel, scope: ConfigScope, saved: &ConfigValues) -> Self {
        let mut values = Map::new();
        let mut initial = HashMap::new();

        for field in schema.fields_in(scope) {
            let value = field.resolve(saved.get(&field.key));
            initial.insert(field.key.clone(), value.clone());
            values.insert(field.key.clone(), value);
        }

        Self {
            scope,
            initial,
            values,
            dirty: BTreeSet::new(),
            errors: FieldErrors::new(),
        }
    }

    #[must_use]
    #[inline]
    pub const fn scope(&self) -> ConfigScope {
        self.scope
    }

    /// Replace the value of `key`, mark it dirty and drop its stale error
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] when the key is not owned by this store's scope.
    #[inline]
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), UnknownField> {
        let Some(slot) = self.values.get_mut(key) else {
            return Err(UnknownField {
                key: key.to_owned(),
                scope: self.scope,
            });
        };
        *slot = value;
        self.dirty.insert(key.to_owned());
        self.errors.remove(key);
        Ok(())
    }

    /// Restore the value resolved at initialization and clear the key's state
    ///
    /// # Errors
    ///
    /// Returns [`UnknownField`] when the key is not owned by this store's scope.
    #[inline]
    pub fn reset(&mut self, key: &str) -> Result<(), UnknownField> {
        let initial = self.initial.get(key).cloned().ok_or_else(|| UnknownField {
            key: key.to_owned(),
            scope: self.scope,
        })?;
        self.values.insert(key.to_owned(), initial);
        self.dirty.remove(key);
        self.errors.remove(key);
        Ok(())
    }

    #[must_use]
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// All current values
    #[must_use]
    #[inline]
    pub const fn values(&self) -> &ConfigValues {
        &self.values
    }

    /// Flat key -> value payload for submission
    ///
    /// Structured values are passed through as JSON, never stringified.
    #[must_use]
    #[inline]
    pub fn serialize(&self) -> ConfigValues {
        self.values.clone()
    }

    #[must_use]
    #[inline]
    pub fn is_dirty(&self, key: &str) -> bool {
        self.dirty.contains(key)
    }

    #[must_use]
    #[inline]
    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn dirty_keys(&self) -> Vec<&str> {
        self.dirty.iter().map(String::as_str).collect()
    }

    /// Record that `saved` was committed by the persistence collaborator
    ///
    /// Saved values become what [`reset`](Self::reset) restores. Keys edited
    /// again since the payload was taken stay dirty.
    #[inline]
    pub fn mark_saved(&mut self, saved: &ConfigValues) {
        for (key, value) in saved {
            if !self.initial.contains_key(key) {
                continue;
            }
            self.initial.insert(key.clone(), value.clone());
            if self.values.get(key) == Some(value) {
                self.dirty.remove(key);
            }
        }
    }

    #[must_use]
    #[inline]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[must_use]
    #[inline]
    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    /// Attach the result of a validation pass
    #[inline]
    pub fn set_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    /// Attach or clear the message of a single key after a live check
    #[inline]
    pub fn set_error(&mut self, key: &str, message: Option<String>) {
        match message {
            Some(message) => {
                self.errors.insert(key.to_owned(), message);
            }
            None => {
                self.errors.remove(key);
            }
        }
    }

    #[inline]
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaModel {
        SchemaModel::from_value(&json!({
            "properties": {
                "host": {"type": "string", "default": "localhost"},
                "port": {"type": "integer"},
                "debug": {"type": "boolean"},
                "tags": {"type": "array"},
                "limits": {"type": "object"},
                "theme": {"type": "text", "configScope": "personal"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn three_tier_fallback() {
        let saved = json!({"port": 8080}).as_object().cloned().unwrap();
        let store = ValueStore::initialize(&schema(), ConfigScope::Enterprise, &saved);

        assert_eq!(store.get("host"), Some(&json!("localhost")));
        assert_eq!(store.get("port"), Some(&json!(8080)));
        assert_eq!(store.get("debug"), Some(&json!(false)));
        assert_eq!(store.get("tags"), Some(&json!([])));
        assert_eq!(store.get("limits"), Some(&json!({})));
        assert!(!store.contains("theme"));
    }

    #[test]
    fn saved_null_falls_back_to_default() {
        let saved = json!({"host": null}).as_object().cloned().unwrap();
        let store = ValueStore::initialize(&schema(), ConfigScope::Enterprise, &saved);
        assert_eq!(store.get("host"), Some(&json!("localhost")));
    }

    #[test]
    fn set_rejects_foreign_keys() {
        let mut store = ValueStore::initialize(&schema(), ConfigScope::Enterprise, &Map::new());
        let err = store.set("theme", json!("dark")).unwrap_err();
        assert_eq!(err.scope, ConfigScope::Enterprise);
        assert!(!store.has_changes());
    }

    #[test]
    fn reset_restores_initial_value() {
        let mut store = ValueStore::initialize(&schema(), ConfigScope::Enterprise, &Map::new());
        store.set("host", json!("example.com")).unwrap();
        store.set_error("host", Some("Invalid format".to_owned()));
        store.reset("host").unwrap();

        assert_eq!(store.get("host"), Some(&json!("localhost")));
        assert!(!store.is_dirty("host"));
        assert!(store.error("host").is_none());
    }

    #[test]
    fn mark_saved_keeps_newer_edits_dirty() {
        let mut store = ValueStore::initialize(&schema(), ConfigScope::Enterprise, &Map::new());
        store.set("host", json!("a.example.com")).unwrap();
        store.set("port", json!(1)).unwrap();
        let payload = store.serialize();
        store.set("port", json!(2)).unwrap();

        store.mark_saved(&payload);
        assert!(!store.is_dirty("host"));
        assert!(store.is_dirty("port"));

        store.reset("port").unwrap();
        assert_eq!(store.get("port"), Some(&json!(1)));
    }

    #[test]
    fn empty_forms() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!({})));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(" ")));
    }
}
