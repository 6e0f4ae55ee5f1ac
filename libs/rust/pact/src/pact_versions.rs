//! Content-addressed pact version storage.

use crate::error::{RegistryError, RegistryResult, StoreError};
use crate::hashing::ContentHasher;
use crate::model::{NewPactVersion, PactVersion, PacticipantId};
use crate::store::PactStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Deduplicating front for pact version rows.
///
/// Identical (consumer, provider, content) always resolves to one row.
pub struct PactVersionStore<S: ?Sized> {
    store: Arc<S>,
    hasher: ContentHasher,
}

impl<S: PactStore + ?Sized> PactVersionStore<S> {
    /// Wrap a store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            hasher: ContentHasher,
        }
    }

    /// Return the existing row for this content, or create it.
    ///
    /// A unique violation on insert means a concurrent writer won; the
    /// winner's row is re-read exactly once.
    ///
    /// # Errors
    ///
    /// Propagates storage failures other than the dedup race.
    pub async fn find_or_create(
        &self,
        consumer_id: PacticipantId,
        provider_id: PacticipantId,
        content: &str,
    ) -> RegistryResult<PactVersion> {
        let sha = self.hasher.hash(content.as_bytes());

        if let Some(existing) = self
            .store
            .find_pact_version(consumer_id, provider_id, &sha)
            .await?
        {
            debug!(sha = %sha, pact_version_id = %existing.id, "Reusing pact version");
            return Ok(existing);
        }

        let new = NewPactVersion {
            consumer_id,
            provider_id,
            sha: sha.clone(),
            content: content.to_string(),
        };

        match self.store.insert_pact_version(new).await {
            Ok(created) => {
                debug!(sha = %sha, pact_version_id = %created.id, "Created pact version");
                Ok(created)
            }
            Err(StoreError::UniqueViolation { constraint }) => {
                warn!(sha = %sha, constraint, "Pact version insert raced, re-reading");
                self.store
                    .find_pact_version(consumer_id, provider_id, &sha)
                    .await?
                    .ok_or_else(|| {
                        RegistryError::Store(StoreError::backend(format!(
                            "pact version {sha} missing after unique violation"
                        )))
                    })
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPactStore;

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let store = Arc::new(MemoryPactStore::new());
        let consumer = store.create_pacticipant("Foo").await;
        let provider = store.create_pacticipant("Bar").await;
        let versions = PactVersionStore::new(Arc::clone(&store));

        let first = versions
            .find_or_create(consumer.id, provider.id, r#"{"a":1}"#)
            .await
            .unwrap();
        let second = versions
            .find_or_create(consumer.id, provider.id, r#"{"a":1}"#)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.pact_version_count().await, 1);
    }

    #[tokio::test]
    async fn test_content_is_scoped_to_pair() {
        let store = Arc::new(MemoryPactStore::new());
        let consumer = store.create_pacticipant("Foo").await;
        let provider = store.create_pacticipant("Bar").await;
        let other = store.create_pacticipant("Baz").await;
        let versions = PactVersionStore::new(Arc::clone(&store));

        let a = versions.find_or_create(consumer.id, provider.id, "{}").await.unwrap();
        let b = versions.find_or_create(consumer.id, other.id, "{}").await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.sha, b.sha);
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_creates_one_row() {
        let store = Arc::new(MemoryPactStore::new());
        let consumer = store.create_pacticipant("Foo").await;
        let provider = store.create_pacticipant("Bar").await;
        let (consumer_id, provider_id) = (consumer.id, provider.id);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let versions = PactVersionStore::new(Arc::clone(&store));
                tokio::spawn(async move {
                    versions
                        .find_or_create(consumer_id, provider_id, r#"{"same":true}"#)
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(store.pact_version_count().await, 1);
    }
}
