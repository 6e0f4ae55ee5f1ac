//! Order-based queries over publications.
//!
//! Publications are first collapsed to the head revision of each consumer
//! version, so every query sees at most one pact per consumer version.
//! Comparisons use the consumer version's `order` exclusively; version
//! number strings are only matched exactly.

use crate::model::{Pact, PacticipantId, VersionId};
use std::collections::HashMap;

/// A composable, scoped view over head publications.
///
/// Filters narrow the view; `latest`, `earliest` and `newest_first`
/// consume it.
#[derive(Debug, Clone, Default)]
pub struct VersionOrdering {
    heads: Vec<Pact>,
}

impl VersionOrdering {
    /// Build a view from publication rows, keeping the highest revision per
    /// consumer version and provider.
    #[must_use]
    pub fn new(rows: impl IntoIterator<Item = Pact>) -> Self {
        let mut heads: HashMap<(VersionId, PacticipantId), Pact> = HashMap::new();
        for row in rows {
            let key = (row.consumer_version.id, row.provider.id);
            match heads.get(&key) {
                Some(existing) if existing.revision_number >= row.revision_number => {}
                _ => {
                    heads.insert(key, row);
                }
            }
        }
        Self {
            heads: heads.into_values().collect(),
        }
    }

    /// Number of consumer versions in view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// Check if nothing is in view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Restrict to one consumer and provider, by id.
    #[must_use]
    pub fn between_ids(self, consumer_id: PacticipantId, provider_id: PacticipantId) -> Self {
        self.filter(|p| p.consumer.id == consumer_id && p.provider.id == provider_id)
    }

    /// Restrict to consumer versions carrying `tag`.
    #[must_use]
    pub fn tagged(self, tag: &str) -> Self {
        self.filter(|p| p.consumer_version.has_tag(tag))
    }

    /// Apply an optional tag restriction.
    #[must_use]
    pub fn tagged_opt(self, tag: Option<&str>) -> Self {
        match tag {
            Some(tag) => self.tagged(tag),
            None => self,
        }
    }

    /// Restrict to consumer versions strictly before `order`.
    #[must_use]
    pub fn before(self, order: u64) -> Self {
        self.filter(|p| p.order() < order)
    }

    /// Restrict to consumer versions strictly after `order`.
    #[must_use]
    pub fn after(self, order: u64) -> Self {
        self.filter(|p| p.order() > order)
    }

    /// Restrict to an exact consumer version number.
    #[must_use]
    pub fn by_consumer_version_number(self, number: &str) -> Self {
        self.filter(|p| p.consumer_version.number == number)
    }

    /// Head publication with the highest consumer version order.
    #[must_use]
    pub fn latest(self) -> Option<Pact> {
        self.heads.into_iter().max_by(|a, b| sort_key(a).cmp(&sort_key(b)))
    }

    /// Head publication with the lowest consumer version order.
    #[must_use]
    pub fn earliest(self) -> Option<Pact> {
        self.heads
            .into_iter()
            .min_by(|a, b| a.order().cmp(&b.order()).then(b.revision_number.cmp(&a.revision_number)))
    }

    /// Every head publication, highest order first.
    #[must_use]
    pub fn newest_first(mut self) -> Vec<Pact> {
        self.heads.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
        self.heads
    }

    /// The latest head for each consumer and provider pair, sorted by
    /// consumer then provider name.
    #[must_use]
    pub fn latest_per_pair(self) -> Vec<Pact> {
        let mut latest: HashMap<(PacticipantId, PacticipantId), Pact> = HashMap::new();
        for pact in self.heads {
            let key = (pact.consumer.id, pact.provider.id);
            match latest.get(&key) {
                Some(existing) if sort_key(existing) >= sort_key(&pact) => {}
                _ => {
                    latest.insert(key, pact);
                }
            }
        }

        let mut pacts: Vec<Pact> = latest.into_values().collect();
        pacts.sort_by(|a, b| {
            a.consumer
                .name
                .cmp(&b.consumer.name)
                .then_with(|| a.provider.name.cmp(&b.provider.name))
        });
        pacts
    }

    fn filter(mut self, keep: impl Fn(&Pact) -> bool) -> Self {
        self.heads.retain(keep);
        self
    }
}

fn sort_key(pact: &Pact) -> (u64, u32) {
    (pact.order(), pact.revision_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::ContentSha;
    use crate::model::{PactVersionId, Pacticipant, PublicationId, Version};
    use chrono::Utc;

    fn pact(publication: u64, consumer: &str, order: u64, revision: u32, tags: &[&str]) -> Pact {
        let content = format!(r#"{{"order":{order},"revision":{revision}}}"#);
        Pact {
            publication_id: PublicationId::new(publication),
            consumer: Pacticipant {
                id: PacticipantId::new(if consumer == "Foo" { 1 } else { 3 }),
                name: consumer.to_string(),
            },
            provider: Pacticipant {
                id: PacticipantId::new(2),
                name: "Bar".to_string(),
            },
            consumer_version: Version {
                id: VersionId::new(order * 10 + u64::from(consumer != "Foo")),
                pacticipant_id: PacticipantId::new(1),
                number: format!("1.0.{order}"),
                order,
                tags: tags.iter().map(ToString::to_string).collect(),
                created_at: Utc::now(),
            },
            revision_number: revision,
            pact_version_id: PactVersionId::new(publication),
            pact_version_sha: ContentSha::of(content.as_bytes()),
            content,
            created_at: Utc::now(),
        }
    }

    fn history() -> VersionOrdering {
        VersionOrdering::new(vec![
            pact(1, "Foo", 1, 1, &["prod"]),
            pact(2, "Foo", 2, 1, &[]),
            pact(3, "Foo", 2, 2, &[]),
            pact(4, "Foo", 4, 1, &["prod"]),
            pact(5, "Foo", 5, 1, &[]),
        ])
    }

    #[test]
    fn test_heads_collapse_revisions() {
        let ordering = history();
        assert_eq!(ordering.len(), 4);

        let at_two = ordering.by_consumer_version_number("1.0.2").latest().unwrap();
        assert_eq!(at_two.revision_number, 2);
        assert_eq!(at_two.publication_id, PublicationId::new(3));
    }

    #[test]
    fn test_latest_and_earliest() {
        assert_eq!(history().latest().unwrap().order(), 5);
        assert_eq!(history().earliest().unwrap().order(), 1);
        assert!(VersionOrdering::default().latest().is_none());
    }

    #[test]
    fn test_nearest_before_and_after() {
        let previous = history().before(4).latest().unwrap();
        assert_eq!(previous.order(), 2);
        assert_eq!(previous.revision_number, 2);

        let next = history().after(2).earliest().unwrap();
        assert_eq!(next.order(), 4);

        assert!(history().before(1).latest().is_none());
        assert!(history().after(5).earliest().is_none());
    }

    #[test]
    fn test_tag_scope() {
        assert_eq!(history().tagged("prod").latest().unwrap().order(), 4);
        assert_eq!(history().tagged("prod").before(4).latest().unwrap().order(), 1);
        assert!(history().tagged("dev").latest().is_none());
        assert_eq!(history().tagged_opt(None).len(), 4);
    }

    #[test]
    fn test_newest_first() {
        let orders: Vec<u64> = history().newest_first().iter().map(Pact::order).collect();
        assert_eq!(orders, vec![5, 4, 2, 1]);
    }

    #[test]
    fn test_latest_per_pair() {
        let ordering = VersionOrdering::new(vec![
            pact(1, "Foo", 1, 1, &[]),
            pact(2, "Foo", 3, 1, &[]),
            pact(3, "Baz", 2, 1, &[]),
        ]);

        let latest = ordering.clone().latest_per_pair();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].consumer.name, "Baz");
        assert_eq!(latest[1].consumer.name, "Foo");
        assert_eq!(latest[1].order(), 3);

        let foo = ordering.between_ids(PacticipantId::new(1), PacticipantId::new(2));
        assert_eq!(foo.len(), 2);
    }
}
