//! Property tests for value resolution and validation

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use plugconf::schema::{ConfigScope, SchemaModel};
    use plugconf::store::{ConfigValues, ValueStore};
    use plugconf::validation::{REQUIRED_MESSAGE, validate};
    use proptest::prelude::*;
    use serde_json::{Value, json};

    const FIXTURE: &str = include_str!("fixtures/analytics.schema.json");

    fn model() -> SchemaModel {
        SchemaModel::from_json_str(FIXTURE).unwrap()
    }

    fn saved(batch_size: i64, api_key: &str, region: &str, stray: &str) -> ConfigValues {
        let mut values = ConfigValues::new();
        values.insert("batchSize".to_owned(), json!(batch_size));
        values.insert("apiKey".to_owned(), json!(api_key));
        values.insert("region".to_owned(), json!(region));
        values.insert(format!("retired_{stray}"), json!(stray));
        values
    }

    proptest! {
        #[test]
        fn initialize_is_deterministic(
            batch_size in any::<i64>(),
            api_key in "[a-zA-Z0-9]{0,48}",
            region in "[a-z]{0,4}",
            stray in "[a-z]{1,8}",
        ) {
            let model = model();
            let saved = saved(batch_size, &api_key, &region, &stray);

            let first = ValueStore::initialize(&model, ConfigScope::Enterprise, &saved);
            let second = ValueStore::initialize(&model, ConfigScope::Enterprise, &saved);
            prop_assert_eq!(first.serialize(), second.serialize());
            let retired_key = format!("retired_{stray}");
            prop_assert!(!first.contains(&retired_key));
        }

        #[test]
        fn serialized_values_reinitialize_unchanged(
            batch_size in any::<i64>(),
            api_key in "[a-zA-Z0-9]{0,48}",
            region in "[a-z]{0,4}",
            stray in "[a-z]{1,8}",
        ) {
            let model = model();
            let store = ValueStore::initialize(
                &model,
                ConfigScope::Enterprise,
                &saved(batch_size, &api_key, &region, &stray),
            );
            let serialized = store.serialize();

            let reloaded = ValueStore::initialize(&model, ConfigScope::Enterprise, &serialized);
            prop_assert_eq!(reloaded.serialize(), serialized);
        }

        #[test]
        fn validation_is_idempotent_and_pure(
            batch_size in any::<i64>(),
            api_key in "[a-zA-Z0-9]{0,48}",
            region in "[a-z]{0,4}",
        ) {
            let model = model();
            let store = ValueStore::initialize(
                &model,
                ConfigScope::Enterprise,
                &saved(batch_size, &api_key, &region, "x"),
            );
            let before = store.serialize();

            let first = validate(&model, &store);
            let second = validate(&model, &store);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(store.serialize(), before);
            prop_assert!(store.errors().is_empty());
        }

        #[test]
        fn integer_range_is_inclusive(batch_size in -1000_i64..1000) {
            let model = model();
            let store = ValueStore::initialize(
                &model,
                ConfigScope::Enterprise,
                &saved(batch_size, "", "eu", "x"),
            );
            let errors = validate(&model, &store);

            match batch_size {
                1..=500 => prop_assert!(!errors.contains_key("batchSize")),
                ..=0 => prop_assert_eq!(errors["batchSize"].as_str(), "Must be at least 1"),
                _ => prop_assert_eq!(errors["batchSize"].as_str(), "Must be at most 500"),
            }
        }

        #[test]
        fn password_length_counts_characters(api_key in "[a-zé]{0,48}") {
            let model = model();
            let store = ValueStore::initialize(
                &model,
                ConfigScope::Enterprise,
                &saved(50, &api_key, "eu", "x"),
            );
            let message = validate(&model, &store).get("apiKey").cloned();

            let expected = match api_key.chars().count() {
                0 => Some(REQUIRED_MESSAGE.to_owned()),
                1..=31 => Some("Must be at least 32 characters".to_owned()),
                _ => None,
            };
            prop_assert_eq!(message, expected);
        }

        #[test]
        fn empty_required_values_report_required(empty in prop_oneof![
            Just(Value::Null),
            Just(json!("")),
            Just(json!([])),
            Just(json!({})),
        ]) {
            let model = model();
            let mut values = ConfigValues::new();
            values.insert("endpoint".to_owned(), empty);
            let store = ValueStore::initialize(&model, ConfigScope::Enterprise, &values);

            let errors = validate(&model, &store);
            prop_assert_eq!(errors["endpoint"].as_str(), REQUIRED_MESSAGE);
        }
    }
}
