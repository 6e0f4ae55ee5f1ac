//! Property-based tests for the pact registry.
//!
//! Tests validate:
//! - Property 1: Content Deduplication
//! - Property 2: Revision Monotonicity
//! - Property 3: Order Navigation
//! - Property 4: Previous Distinct Skips Identical Runs
//! - Property 5: Hash Stability

use pact_registry::{ContentHasher, ContentSha, SemanticDiffer};
use pact_test_utils::{
    SeededRegistry, content_history_strategy, description_strategy, pact_content_strategy,
    pact_json, reordered_pact_json, version_number_strategy,
};
use proptest::prelude::*;

fn pool() -> Vec<String> {
    ["alpha", "beta", "gamma"]
        .iter()
        .map(|d| pact_json("Foo", "Bar", d))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// **Property 1: Content Deduplication**
    /// *For any* content published under several consumer versions, exactly
    /// one pact version row SHALL exist for it.
    #[test]
    fn prop_identical_content_is_stored_once(
        content in pact_content_strategy("Foo", "Bar"),
        versions in prop::collection::btree_set(version_number_strategy(), 1..6),
    ) {
        tokio_test::block_on(async {
            let registry = SeededRegistry::new("Foo", "Bar").await;
            let mut ids = Vec::new();
            for number in &versions {
                ids.push(registry.publish(number, &content).await.unwrap().pact_version_id);
            }

            prop_assert_eq!(registry.store.pact_version_count().await, 1);
            prop_assert!(ids.windows(2).all(|w| w[0] == w[1]));
            prop_assert_eq!(registry.store.publication_count().await, versions.len());
            Ok(())
        })?;
    }

    /// **Property 2: Revision Monotonicity**
    /// *For any* sequence of updates to one consumer version, revisions SHALL
    /// increase by one exactly when the content changes.
    #[test]
    fn prop_revisions_grow_only_on_change(history in content_history_strategy()) {
        tokio_test::block_on(async {
            let registry = SeededRegistry::new("Foo", "Bar").await;
            let pool = pool();

            let mut expected = 0u32;
            let mut previous: Option<usize> = None;
            for index in &history {
                let pact = registry.publish("1.0.0", &pool[*index]).await.unwrap();
                if previous != Some(*index) {
                    expected += 1;
                }
                previous = Some(*index);
                prop_assert_eq!(pact.revision_number, expected);
                prop_assert_eq!(&pact.content, &pool[*index]);
            }
            Ok(())
        })?;
    }

    /// **Property 3: Order Navigation**
    /// *For any* history, previous and next SHALL be inverse steps over
    /// consecutive consumer versions.
    #[test]
    fn prop_previous_and_next_are_inverse(history in content_history_strategy()) {
        tokio_test::block_on(async {
            let registry = SeededRegistry::new("Foo", "Bar").await;
            let pool = pool();
            let contents: Vec<String> = history.iter().map(|i| pool[*i].clone()).collect();
            let pacts = registry.publish_history(&contents).await;

            for (i, pact) in pacts.iter().enumerate() {
                let previous = registry.resolver.find_previous(pact).await.unwrap();
                let next = registry.resolver.find_next(pact).await.unwrap();

                prop_assert_eq!(previous.as_ref().map(|p| p.order()), i.checked_sub(1).map(|j| j as u64 + 1));
                prop_assert_eq!(next.as_ref().map(|p| p.order()), (i + 1 < pacts.len()).then_some(i as u64 + 2));

                if let Some(previous) = previous {
                    let back = registry.resolver.find_next(&previous).await.unwrap().unwrap();
                    prop_assert_eq!(back.publication_id, pact.publication_id);
                }
            }
            Ok(())
        })?;
    }

    /// **Property 4: Previous Distinct Skips Identical Runs**
    /// *For any* history, the previous distinct pact of the latest SHALL be
    /// the nearest earlier version whose content differs from the latest.
    #[test]
    fn prop_previous_distinct_matches_reference(history in content_history_strategy()) {
        tokio_test::block_on(async {
            let registry = SeededRegistry::new("Foo", "Bar").await;
            let pool = pool();
            let contents: Vec<String> = history.iter().map(|i| pool[*i].clone()).collect();
            let pacts = registry.publish_history(&contents).await;
            let last = history.len() - 1;

            let expected = (0..last).rev().find(|j| history[*j] != history[last]);
            let actual = registry
                .resolver
                .find_previous_distinct(&pacts[last])
                .await
                .unwrap();

            prop_assert_eq!(actual.map(|p| p.order()), expected.map(|j| j as u64 + 1));
            Ok(())
        })?;
    }

    /// **Property 5: Hash Stability**
    /// *For any* content, the hash SHALL be deterministic and lowercase hex,
    /// while key order changes the hash but not structural equality.
    #[test]
    fn prop_hash_is_stable(description in description_strategy()) {
        let content = pact_json("Foo", "Bar", &description);
        let reordered = reordered_pact_json("Foo", "Bar", &description);
        let hasher = ContentHasher;

        let sha = hasher.hash(content.as_bytes());
        prop_assert_eq!(&sha, &hasher.hash(content.as_bytes()));
        prop_assert_eq!(sha.as_str().len(), 40);
        prop_assert_eq!(ContentSha::parse(&sha.as_str().to_uppercase()), Some(sha.clone()));

        prop_assert_ne!(&sha, &hasher.hash(reordered.as_bytes()));
        prop_assert!(!SemanticDiffer.differs(&content, &reordered).unwrap());
    }
}
