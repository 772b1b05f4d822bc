//! Tests for the dual-scope save workflow

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use core::time::Duration;
    use std::time::Instant;

    use plugconf::error::PersistenceError;
    use plugconf::persistence::{ConfigBackend as _, ConfigTarget, MemoryBackend};
    use plugconf::schema::{ConfigScope, SchemaModel};
    use plugconf::session::{
        EditingSession, SaveFailure, SaveOutcome, SaveRejected, SaveState, SessionSettings,
    };
    use plugconf::store::ConfigValues;
    use serde_json::json;

    const FIXTURE: &str = include_str!("fixtures/analytics.schema.json");

    fn target() -> ConfigTarget {
        ConfigTarget::new("analytics", "12")
    }

    fn open(backend: &MemoryBackend) -> EditingSession {
        EditingSession::load(
            backend,
            target(),
            SchemaModel::from_json_str(FIXTURE).unwrap(),
            SessionSettings::default(),
        )
        .unwrap()
    }

    fn fill_enterprise(session: &mut EditingSession) {
        session
            .set("endpoint", json!("https://ingest.example.com"))
            .unwrap();
        session.set("apiKey", json!("k".repeat(40))).unwrap();
    }

    #[test]
    fn application_error_keeps_values_and_message() {
        let backend = MemoryBackend::new();
        let mut session = open(&backend);
        fill_enterprise(&mut session);
        backend
            .fail_next_save(PersistenceError::Application {
                code: 500,
                message: "db unavailable".to_owned(),
            })
            .unwrap();

        let outcome = session.save_with(ConfigScope::Enterprise, &backend);
        assert_eq!(outcome, SaveOutcome::Failed("db unavailable".to_owned()));

        let editor = session.scope(ConfigScope::Enterprise);
        assert_eq!(editor.state().message().as_deref(), Some("db unavailable"));
        assert!(matches!(
            *editor.state(),
            SaveState::Error {
                failure: SaveFailure::Rejected(PersistenceError::Application { code: 500, .. }),
                ..
            }
        ));
        assert_eq!(
            editor.store().get("endpoint"),
            Some(&json!("https://ingest.example.com"))
        );
        assert!(editor.store().is_dirty("apiKey"));
        assert!(editor.baseline().is_empty());
    }

    #[test]
    fn successful_save_updates_baseline() {
        let backend = MemoryBackend::new();
        let mut session = open(&backend);
        fill_enterprise(&mut session);

        assert_eq!(
            session.save_with(ConfigScope::Enterprise, &backend),
            SaveOutcome::Saved
        );

        let editor = session.scope(ConfigScope::Enterprise);
        assert!(!editor.store().has_changes());
        assert_eq!(
            editor.state().message().as_deref(),
            Some("Configuration saved successfully")
        );

        let stored = backend
            .stored(&target(), ConfigScope::Enterprise)
            .unwrap()
            .unwrap();
        assert_eq!(&stored, editor.baseline());
        assert_eq!(stored["batchSize"], json!(50));
        assert_eq!(stored["headers"], json!({}));
        assert!(!stored.contains_key("theme"));
    }

    #[test]
    fn invalid_scope_is_never_submitted() {
        let backend = MemoryBackend::new();
        let mut session = open(&backend);
        session.set("endpoint", json!("http://plain.example.com")).unwrap();

        let now = Instant::now();
        let Err(SaveRejected::Invalid(errors)) = session.begin_save(ConfigScope::Enterprise, now)
        else {
            panic!("expected validation to block the save");
        };
        assert_eq!(errors["endpoint"], "Invalid format");
        assert_eq!(errors["apiKey"], "This field is required");

        let editor = session.scope(ConfigScope::Enterprise);
        assert_eq!(editor.store().errors(), &errors);
        assert_eq!(
            editor.state().message().as_deref(),
            Some("Please fix validation errors before saving")
        );
        assert!(backend.save_log().unwrap().is_empty());
    }

    #[test]
    fn scopes_are_isolated() {
        let backend = MemoryBackend::new();
        let mut session = open(&backend);
        session.set("theme", json!("dark")).unwrap();
        session.set("endpoint", json!("not a url")).unwrap();

        assert_eq!(
            session.save_with(ConfigScope::Personal, &backend),
            SaveOutcome::Saved
        );

        let enterprise = session.scope(ConfigScope::Enterprise);
        assert_eq!(*enterprise.state(), SaveState::Idle);
        assert!(enterprise.store().errors().is_empty());
        assert!(enterprise.store().is_dirty("endpoint"));

        let log = backend.save_log().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].scope, ConfigScope::Personal);
        assert_eq!(log[0].values["theme"], json!("dark"));
    }

    #[test]
    fn both_scopes_may_save_concurrently() {
        let backend = MemoryBackend::new();
        let mut session = open(&backend);
        fill_enterprise(&mut session);

        let now = Instant::now();
        let enterprise = session.begin_save(ConfigScope::Enterprise, now).unwrap();
        let personal = session.begin_save(ConfigScope::Personal, now).unwrap();
        assert!(matches!(
            session.begin_save(ConfigScope::Personal, now),
            Err(SaveRejected::InFlight(ConfigScope::Personal))
        ));

        // Responses may arrive in any order
        assert_eq!(
            session.complete_save(personal, Ok(()), now),
            SaveOutcome::Saved
        );
        assert_eq!(
            session.complete_save(
                enterprise,
                Err(PersistenceError::Transport {
                    status: None,
                    message: "connection refused".to_owned(),
                }),
                now
            ),
            SaveOutcome::Failed("connection refused".to_owned())
        );

        assert_eq!(session.scope(ConfigScope::Personal).state().name(), "success");
        assert_eq!(session.scope(ConfigScope::Enterprise).state().name(), "error");
    }

    #[test]
    fn responses_for_closed_sessions_are_ignored() {
        let backend = MemoryBackend::new();
        let mut first = open(&backend);
        fill_enterprise(&mut first);
        let ticket = first.begin_save(ConfigScope::Enterprise, Instant::now()).unwrap();

        let mut second = open(&backend);
        assert_ne!(first.id(), second.id());
        assert_eq!(
            second.complete_save(ticket, Ok(()), Instant::now()),
            SaveOutcome::Ignored
        );
        assert_eq!(*second.scope(ConfigScope::Enterprise).state(), SaveState::Idle);
    }

    #[test]
    fn edits_made_while_saving_stay_dirty() {
        let backend = MemoryBackend::new();
        let mut session = open(&backend);
        fill_enterprise(&mut session);

        let now = Instant::now();
        let ticket = session.begin_save(ConfigScope::Enterprise, now).unwrap();
        session.set("batchSize", json!(99)).unwrap();
        let result = backend.save(ticket.target(), ticket.scope(), ticket.payload());
        session.complete_save(ticket, result, now);

        let store = session.scope(ConfigScope::Enterprise).store();
        assert!(store.is_dirty("batchSize"));
        assert!(!store.is_dirty("endpoint"));
        assert_eq!(store.get("batchSize"), Some(&json!(99)));
    }

    #[test]
    fn results_fade_after_display_interval() {
        let backend = MemoryBackend::new();
        let mut session = open(&backend);
        fill_enterprise(&mut session);

        let start = Instant::now();
        let ticket = session.begin_save(ConfigScope::Enterprise, start).unwrap();
        session.complete_save(ticket, Ok(()), start);

        session.tick(start + Duration::from_millis(2999));
        assert_eq!(session.scope(ConfigScope::Enterprise).state().name(), "success");

        session.tick(start + Duration::from_millis(3000));
        assert_eq!(*session.scope(ConfigScope::Enterprise).state(), SaveState::Idle);
        assert!(session.scope(ConfigScope::Enterprise).can_save());
    }

    #[test]
    fn saved_values_seed_the_session() {
        let mut saved = ConfigValues::new();
        saved.insert("batchSize".to_owned(), json!(200));
        saved.insert("retired".to_owned(), json!("dropped"));
        let backend = MemoryBackend::new()
            .with_values(&target(), ConfigScope::Enterprise, saved)
            .unwrap();

        let session = open(&backend);
        let store = session.scope(ConfigScope::Enterprise).store();
        assert_eq!(store.get("batchSize"), Some(&json!(200)));
        assert_eq!(store.get("region"), Some(&json!("eu")));
        assert_eq!(store.get("enabled"), Some(&json!(true)));
        assert_eq!(store.get("events"), Some(&json!([])));
        assert!(!store.contains("retired"));
    }

    #[test]
    fn load_failure_is_surfaced() {
        let backend = MemoryBackend::new();
        backend
            .fail_next_load(PersistenceError::Transport {
                status: Some(503),
                message: "Server responded with HTTP 503".to_owned(),
            })
            .unwrap();

        let result = EditingSession::load(
            &backend,
            target(),
            SchemaModel::from_json_str(FIXTURE).unwrap(),
            SessionSettings::default(),
        );
        assert!(result.unwrap_err().is_transport());
    }
}
