//! Publication writes and pact lookups.
//!
//! Publications form an append-only log per consumer version and
//! provider; the "current" publication is always the highest revision.

use crate::differ::{Difference, SemanticDiffer};
use crate::error::{RegistryError, RegistryResult, StoreError};
use crate::hashing::ContentSha;
use crate::model::{
    NewPublication, Pact, PactLookup, PactNavigation, PactPublication, PactVersionId,
    PublicationId, PublishRequest,
};
use crate::ordering::VersionOrdering;
use crate::pact_versions::PactVersionStore;
use crate::relationship::{Relationship, sort_relationships};
use crate::store::PactStore;
use crate::verification::Verification;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Resolves publish/update requests and pact lookups against a store.
pub struct PactPublicationResolver<S: ?Sized> {
    store: Arc<S>,
    pact_versions: PactVersionStore<S>,
    differ: SemanticDiffer,
}

impl<S: PactStore + ?Sized> PactPublicationResolver<S> {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            pact_versions: PactVersionStore::new(Arc::clone(&store)),
            store,
            differ: SemanticDiffer,
        }
    }

    /// Publish revision 1 of a pact for a consumer version and provider.
    ///
    /// # Errors
    ///
    /// Returns `PublicationExists` if the pair already has a publication,
    /// `MalformedContent` if the content is not JSON, a not-found or
    /// mismatch error for inconsistent ids, or a propagated store error.
    #[instrument(
        skip(self, request),
        fields(consumer_version_id = %request.consumer_version_id, provider_id = %request.provider_id)
    )]
    pub async fn publish(&self, request: &PublishRequest) -> RegistryResult<Pact> {
        self.check_request(request).await?;
        serde_json::from_str::<serde_json::Value>(&request.json_content)?;

        let exists = || RegistryError::PublicationExists {
            consumer_version_id: request.consumer_version_id,
            provider_id: request.provider_id,
        };

        if self
            .store
            .latest_revision(request.consumer_version_id, request.provider_id)
            .await?
            .is_some()
        {
            return Err(exists());
        }

        let pact_version = self
            .pact_versions
            .find_or_create(request.consumer_id, request.provider_id, &request.json_content)
            .await?;

        let new = NewPublication {
            consumer_version_id: request.consumer_version_id,
            provider_id: request.provider_id,
            pact_version_id: pact_version.id,
            revision_number: 1,
        };
        let publication = match self.store.insert_publication(new).await {
            Ok(publication) => publication,
            Err(err) if err.is_unique_violation() => return Err(exists()),
            Err(err) => return Err(err.into()),
        };

        info!(
            publication_id = %publication.id,
            sha = %pact_version.sha,
            "Published pact"
        );
        self.hydrate(publication.id).await
    }

    /// Publish new content for an existing publication.
    ///
    /// Unchanged content returns the current publication untouched.
    /// Changed content appends a new revision; older rows are never
    /// modified.
    ///
    /// # Errors
    ///
    /// Returns `PublicationNotFound` for an unknown id, `MalformedContent`
    /// if the content is not JSON, or a propagated store error.
    #[instrument(skip(self, content))]
    pub async fn update(&self, publication_id: PublicationId, content: &str) -> RegistryResult<Pact> {
        let existing = self
            .store
            .find_publication(publication_id)
            .await?
            .ok_or(RegistryError::PublicationNotFound(publication_id))?;
        serde_json::from_str::<serde_json::Value>(content)?;

        let version = self
            .store
            .find_version(existing.consumer_version_id)
            .await?
            .ok_or(RegistryError::VersionNotFound(existing.consumer_version_id))?;
        let pact_version = self
            .pact_versions
            .find_or_create(version.pacticipant_id, existing.provider_id, content)
            .await?;

        let head = self
            .store
            .latest_revision(existing.consumer_version_id, existing.provider_id)
            .await?
            .unwrap_or(existing);

        if head.pact_version_id == pact_version.id {
            debug!(publication_id = %head.id, "Content unchanged, keeping publication");
            return self.hydrate(head.id).await;
        }

        let publication = self.append_revision(head, pact_version.id).await?;
        info!(
            publication_id = %publication.id,
            revision = publication.revision_number,
            sha = %pact_version.sha,
            "Appended pact revision"
        );
        self.hydrate(publication.id).await
    }

    /// Publish if the pair has no publication yet, otherwise update the
    /// current revision.
    ///
    /// # Errors
    ///
    /// Same as [`publish`](Self::publish) and [`update`](Self::update).
    pub async fn publish_or_update(&self, request: &PublishRequest) -> RegistryResult<Pact> {
        let head = self
            .store
            .latest_revision(request.consumer_version_id, request.provider_id)
            .await?;

        match head {
            Some(head) => self.update(head.id, &request.json_content).await,
            None => match self.publish(request).await {
                Err(RegistryError::PublicationExists { .. }) => {
                    let head = self
                        .store
                        .latest_revision(request.consumer_version_id, request.provider_id)
                        .await?
                        .ok_or_else(|| missing_row("publication after conflict"))?;
                    self.update(head.id, &request.json_content).await
                }
                result => result,
            },
        }
    }

    /// Resolve an inbound lookup.
    ///
    /// A content hash takes precedence over a version number, which takes
    /// precedence over the latest (optionally tagged) pact.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn resolve(&self, lookup: &PactLookup) -> RegistryResult<Option<Pact>> {
        let (consumer, provider) = (&lookup.consumer_name, &lookup.provider_name);
        if let Some(sha) = &lookup.pact_version_sha {
            return self.find_by_sha(consumer, provider, sha).await;
        }
        if let Some(number) = &lookup.consumer_version_number {
            return self.find_by_consumer_version(consumer, provider, number).await;
        }
        self.find_latest(consumer, provider, lookup.tag.as_deref()).await
    }

    /// Latest pact between a consumer and provider, optionally restricted
    /// to consumer versions with a tag.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    #[instrument(skip(self))]
    pub async fn find_latest(
        &self,
        consumer_name: &str,
        provider_name: &str,
        tag: Option<&str>,
    ) -> RegistryResult<Option<Pact>> {
        Ok(self
            .ordering_between(consumer_name, provider_name)
            .await?
            .tagged_opt(tag)
            .latest())
    }

    /// Current revision of the pact for an exact consumer version number.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    #[instrument(skip(self))]
    pub async fn find_by_consumer_version(
        &self,
        consumer_name: &str,
        provider_name: &str,
        consumer_version_number: &str,
    ) -> RegistryResult<Option<Pact>> {
        Ok(self
            .ordering_between(consumer_name, provider_name)
            .await?
            .by_consumer_version_number(consumer_version_number)
            .latest())
    }

    /// Latest publication whose content has the given hash.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    #[instrument(skip(self))]
    pub async fn find_by_sha(
        &self,
        consumer_name: &str,
        provider_name: &str,
        sha: &ContentSha,
    ) -> RegistryResult<Option<Pact>> {
        let rows = self.store.pacts_between(consumer_name, provider_name).await?;
        Ok(VersionOrdering::new(rows.into_iter().filter(|p| p.pact_version_sha == *sha)).latest())
    }

    /// Pact of the nearest earlier consumer version.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_previous(&self, pact: &Pact) -> RegistryResult<Option<Pact>> {
        Ok(self
            .ordering_for(pact)
            .await?
            .before(pact.order())
            .latest())
    }

    /// Pact of the nearest later consumer version.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_next(&self, pact: &Pact) -> RegistryResult<Option<Pact>> {
        Ok(self
            .ordering_for(pact)
            .await?
            .after(pact.order())
            .earliest())
    }

    /// Nearest earlier pact whose content differs structurally from the
    /// run of identical content ending at `pact`.
    ///
    /// The walk is capped at the number of consumer versions in history.
    ///
    /// # Errors
    ///
    /// Returns `MalformedContent` if stored content cannot be parsed, or a
    /// propagated store error.
    #[instrument(skip(self, pact), fields(consumer = %pact.consumer.name, provider = %pact.provider.name, order = pact.order()))]
    pub async fn find_previous_distinct(&self, pact: &Pact) -> RegistryResult<Option<Pact>> {
        let cap = self.ordering_for(pact).await?.len();
        let mut current = pact.clone();

        for step in 0..=cap {
            let Some(previous) = self.find_previous(&current).await? else {
                debug!(step, "History exhausted without distinct content");
                return Ok(None);
            };

            if previous.pact_version_sha == current.pact_version_sha {
                debug!(step, order = previous.order(), "Identical content hash, confirming structurally");
            }
            if self.differ.differs(&current.content, &previous.content)? {
                debug!(step, order = previous.order(), "Found distinct previous pact");
                return Ok(Some(previous));
            }
            current = previous;
        }

        warn!(cap, "Previous distinct walk exceeded version count");
        Ok(None)
    }

    /// Structural differences between the previous distinct pact and `pact`.
    ///
    /// # Errors
    ///
    /// Same as [`find_previous_distinct`](Self::find_previous_distinct).
    pub async fn diff_with_previous_distinct(
        &self,
        pact: &Pact,
    ) -> RegistryResult<Option<(Pact, Vec<Difference>)>> {
        let Some(previous) = self.find_previous_distinct(pact).await? else {
            return Ok(None);
        };
        let diff = self.differ.diff(&previous.content, &pact.content)?;
        Ok(Some((previous, diff)))
    }

    /// Whether `pact` differs structurally from the previous consumer
    /// version's pact. A pact with no predecessor counts as changed.
    ///
    /// # Errors
    ///
    /// Returns `MalformedContent` if stored content cannot be parsed, or a
    /// propagated store error.
    pub async fn pact_changed_since_previous(&self, pact: &Pact) -> RegistryResult<bool> {
        match self.find_previous(pact).await? {
            Some(previous) => self.differ.differs(&previous.content, &pact.content),
            None => Ok(true),
        }
    }

    /// Links to the neighbouring pacts.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn navigation(&self, pact: &Pact) -> RegistryResult<PactNavigation> {
        let ordering = self.ordering_for(pact).await?;
        Ok(PactNavigation {
            previous: ordering
                .clone()
                .before(pact.order())
                .latest()
                .map(|p| p.coordinates()),
            next: ordering.after(pact.order()).earliest().map(|p| p.coordinates()),
        })
    }

    /// Current revision for every consumer version, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn history(&self, consumer_name: &str, provider_name: &str) -> RegistryResult<Vec<Pact>> {
        Ok(self
            .ordering_between(consumer_name, provider_name)
            .await?
            .newest_first())
    }

    /// Latest pact for every consumer and provider pair.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_latest_pacts(&self) -> RegistryResult<Vec<Pact>> {
        Ok(VersionOrdering::new(self.store.all_pacts().await?).latest_per_pair())
    }

    /// Latest pact from every consumer of a provider, optionally restricted
    /// to consumer versions with a tag.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn find_latest_pacts_for_provider(
        &self,
        provider_name: &str,
        tag: Option<&str>,
    ) -> RegistryResult<Vec<Pact>> {
        Ok(VersionOrdering::new(self.store.pacts_for_provider(provider_name).await?)
            .tagged_opt(tag)
            .latest_per_pair())
    }

    /// Delete every revision published for a consumer version and provider.
    ///
    /// Content rows are retained. Returns the number of publications removed.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        consumer_name: &str,
        provider_name: &str,
        consumer_version_number: &str,
    ) -> RegistryResult<usize> {
        let ids: Vec<PublicationId> = self
            .store
            .pacts_between(consumer_name, provider_name)
            .await?
            .into_iter()
            .filter(|p| p.consumer_version.number == consumer_version_number)
            .map(|p| p.publication_id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let deleted = self.store.delete_publications(&ids).await?;
        info!(deleted, "Deleted pact publications");
        Ok(deleted)
    }

    /// Latest verification of the pact's content.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn latest_verification(&self, pact: &Pact) -> RegistryResult<Option<Verification>> {
        Ok(self.store.latest_verification_for(pact.pact_version_id).await?)
    }

    /// Every consumer and provider pair with its latest pact, latest
    /// verification and derived status, sorted case-insensitively by
    /// consumer then provider.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn relationships(&self) -> RegistryResult<Vec<Relationship>> {
        let mut relationships = Vec::new();
        for pact in self.find_latest_pacts().await? {
            let verification = self
                .store
                .latest_verification_between(pact.consumer.id, pact.provider.id)
                .await?;
            relationships.push(Relationship::new(pact, verification));
        }
        sort_relationships(&mut relationships);
        Ok(relationships)
    }

    async fn check_request(&self, request: &PublishRequest) -> RegistryResult<()> {
        for id in [request.consumer_id, request.provider_id] {
            if self.store.find_pacticipant(id).await?.is_none() {
                return Err(RegistryError::PacticipantNotFound(id));
            }
        }

        let version = self
            .store
            .find_version(request.consumer_version_id)
            .await?
            .ok_or(RegistryError::VersionNotFound(request.consumer_version_id))?;
        if version.pacticipant_id != request.consumer_id {
            return Err(RegistryError::ConsumerMismatch {
                version_id: version.id,
                consumer_id: request.consumer_id,
            });
        }
        Ok(())
    }

    async fn append_revision(
        &self,
        head: PactPublication,
        pact_version_id: PactVersionId,
    ) -> RegistryResult<PactPublication> {
        let new = |revision_number| NewPublication {
            consumer_version_id: head.consumer_version_id,
            provider_id: head.provider_id,
            pact_version_id,
            revision_number,
        };

        match self.store.insert_publication(new(head.revision_number + 1)).await {
            Ok(publication) => Ok(publication),
            Err(StoreError::UniqueViolation { constraint }) => {
                warn!(constraint, revision = head.revision_number + 1, "Revision insert raced, re-reading");
                let winner = self
                    .store
                    .latest_revision(head.consumer_version_id, head.provider_id)
                    .await?
                    .ok_or_else(|| missing_row("publication after conflict"))?;
                if winner.pact_version_id == pact_version_id {
                    return Ok(winner);
                }
                Ok(self
                    .store
                    .insert_publication(new(winner.revision_number + 1))
                    .await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn hydrate(&self, id: PublicationId) -> RegistryResult<Pact> {
        self.store
            .find_pact(id)
            .await?
            .ok_or_else(|| missing_row(&format!("publication {id}")))
    }

    async fn ordering_between(
        &self,
        consumer_name: &str,
        provider_name: &str,
    ) -> RegistryResult<VersionOrdering> {
        let consumer = self.store.find_pacticipant_by_name(consumer_name).await?;
        let provider = self.store.find_pacticipant_by_name(provider_name).await?;
        let (Some(consumer), Some(provider)) = (consumer, provider) else {
            debug!(consumer_name, provider_name, "Unknown pacticipant");
            return Ok(VersionOrdering::default());
        };

        Ok(VersionOrdering::new(
            self.store
                .pacts_between(&consumer.name, &provider.name)
                .await?,
        )
        .between_ids(consumer.id, provider.id))
    }

    async fn ordering_for(&self, pact: &Pact) -> RegistryResult<VersionOrdering> {
        Ok(self
            .ordering_between(pact.consumer_name(), pact.provider_name())
            .await?
            .between_ids(pact.consumer.id, pact.provider.id))
    }
}

fn missing_row(what: &str) -> RegistryError {
    RegistryError::Store(StoreError::backend(format!("{what} missing after write")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPactStore;

    const BODY_A: &str = r#"{"interactions":[{"description":"a"}]}"#;
    const BODY_B: &str = r#"{"interactions":[{"description":"b"}]}"#;

    async fn seeded() -> (Arc<MemoryPactStore>, PactPublicationResolver<MemoryPactStore>, PublishRequest) {
        let store = Arc::new(MemoryPactStore::new());
        let consumer = store.create_pacticipant("Foo").await;
        let provider = store.create_pacticipant("Bar").await;
        let version = store.create_version(consumer.id, "1").await.unwrap();
        let request = PublishRequest {
            consumer_version_id: version.id,
            provider_id: provider.id,
            consumer_id: consumer.id,
            json_content: BODY_A.to_string(),
        };
        (Arc::clone(&store), PactPublicationResolver::new(store), request)
    }

    #[tokio::test]
    async fn test_publish_or_update_appends_on_change() {
        let (store, resolver, mut request) = seeded().await;

        let first = resolver.publish_or_update(&request).await.unwrap();
        let same = resolver.publish_or_update(&request).await.unwrap();
        request.json_content = BODY_B.to_string();
        let changed = resolver.publish_or_update(&request).await.unwrap();

        assert_eq!(first.revision_number, 1);
        assert_eq!(same.publication_id, first.publication_id);
        assert_eq!(changed.revision_number, 2);
        assert_eq!(store.publication_count().await, 2);
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_content() {
        let (store, resolver, request) = seeded().await;
        let pact = resolver.publish(&request).await.unwrap();

        let err = resolver.update(pact.publication_id, "[1,").await.unwrap_err();
        assert!(matches!(err, RegistryError::MalformedContent(_)));
        assert_eq!(store.pact_version_count().await, 1);
    }

    #[tokio::test]
    async fn test_single_pact_has_no_neighbours() {
        let (_store, resolver, request) = seeded().await;
        let pact = resolver.publish(&request).await.unwrap();

        assert!(resolver.find_previous(&pact).await.unwrap().is_none());
        assert!(resolver.find_next(&pact).await.unwrap().is_none());
        assert!(resolver.find_previous_distinct(&pact).await.unwrap().is_none());
        assert!(resolver.pact_changed_since_previous(&pact).await.unwrap());
        assert_eq!(resolver.navigation(&pact).await.unwrap(), PactNavigation::default());
    }
}
