//! Proptest generators for registry inputs.

use proptest::prelude::*;
use serde_json::json;

/// Generate pacticipant names.
pub fn pacticipant_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("auth-edge".to_string()),
        Just("token-service".to_string()),
        Just("session-core".to_string()),
        "[A-Za-z][A-Za-z0-9 -]{2,20}",
    ]
}

/// Generate free-form version numbers, including non-semver strings.
pub fn version_number_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,3}",
        "[0-9a-f]{7}",
        "v[0-9]{1,3}-[a-z]{3,8}",
    ]
}

/// Generate version tags.
pub fn tag_strategy() -> impl Strategy<Value = String> {
    "(prod|dev|main|feat-[a-z]{3,6})"
}

/// Generate an interaction description.
pub fn description_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z ]{4,30}"
}

/// Generate pact JSON documents for a fixed consumer and provider.
pub fn pact_content_strategy(
    consumer: &str,
    provider: &str,
) -> impl Strategy<Value = String> + use<> {
    let consumer = consumer.to_string();
    let provider = provider.to_string();
    prop::collection::vec((description_strategy(), 200u16..600), 1..4)
        .prop_map(move |interactions| {
            let interactions: Vec<_> = interactions
                .into_iter()
                .map(|(description, status)| {
                    json!({
                        "description": description,
                        "request": { "method": "GET", "path": "/resource" },
                        "response": { "status": status }
                    })
                })
                .collect();
            json!({
                "consumer": { "name": consumer },
                "provider": { "name": provider },
                "interactions": interactions,
                "metadata": { "pactSpecification": { "version": "2.0.0" } }
            })
            .to_string()
        })
}

/// Generate a history as a sequence of content indices into a small pool,
/// so that runs of identical content are common.
pub fn content_history_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..3, 1..10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn test_pact_content_is_json() {
        let mut runner = TestRunner::default();
        for _ in 0..10 {
            let value = pact_content_strategy("Foo", "Bar")
                .new_tree(&mut runner)
                .unwrap()
                .current();
            let parsed: serde_json::Value = serde_json::from_str(&value).unwrap();
            assert_eq!(parsed["consumer"]["name"], "Foo");
            assert_eq!(parsed["provider"]["name"], "Bar");
        }
    }

    #[test]
    fn test_content_history_range() {
        let mut runner = TestRunner::default();
        for _ in 0..10 {
            let value = content_history_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(!value.is_empty());
            assert!(value.iter().all(|i| *i < 3));
        }
    }
}
