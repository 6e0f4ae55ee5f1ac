//! Store doubles for exercising race and failure paths.

use async_trait::async_trait;
use pact_registry::{
    ContentSha, MemoryPactStore, NewPactVersion, NewPublication, Pact, PactPublication,
    PactStore, PactVersion, PactVersionId, Pacticipant, PacticipantId, PublicationId,
    StoreError, StoreResult, Verification, Version, VersionId,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Wraps a [`MemoryPactStore`] and, once armed, makes the next insert lose a
/// race: a competing writer's identical row is committed first and the
/// caller receives a unique violation.
#[derive(Debug)]
pub struct RacingStore {
    inner: Arc<MemoryPactStore>,
    race_pact_version: AtomicBool,
    race_publication: AtomicBool,
    // Pact version id of a competing revision, 0 when disarmed.
    competing_revision: AtomicU64,
    races: AtomicUsize,
}

impl RacingStore {
    /// Wrap a store with no races armed.
    #[must_use]
    pub const fn new(inner: Arc<MemoryPactStore>) -> Self {
        Self {
            inner,
            race_pact_version: AtomicBool::new(false),
            race_publication: AtomicBool::new(false),
            competing_revision: AtomicU64::new(0),
            races: AtomicUsize::new(0),
        }
    }

    /// Lose the next pact version insert.
    pub fn arm_pact_version_race(&self) {
        self.race_pact_version.store(true, Ordering::SeqCst);
    }

    /// Lose the next publication insert.
    pub fn arm_publication_race(&self) {
        self.race_publication.store(true, Ordering::SeqCst);
    }

    /// Lose the next publication insert to a competing writer whose
    /// revision links different content.
    pub fn arm_competing_revision(&self, pact_version_id: PactVersionId) {
        self.competing_revision
            .store(pact_version_id.get(), Ordering::SeqCst);
    }

    /// Number of races staged so far.
    #[must_use]
    pub fn races(&self) -> usize {
        self.races.load(Ordering::SeqCst)
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &MemoryPactStore {
        &self.inner
    }
}

#[async_trait]
impl PactStore for RacingStore {
    async fn find_pacticipant(&self, id: PacticipantId) -> StoreResult<Option<Pacticipant>> {
        self.inner.find_pacticipant(id).await
    }

    async fn find_pacticipant_by_name(&self, name: &str) -> StoreResult<Option<Pacticipant>> {
        self.inner.find_pacticipant_by_name(name).await
    }

    async fn find_version(&self, id: VersionId) -> StoreResult<Option<Version>> {
        self.inner.find_version(id).await
    }

    async fn find_pact_version(
        &self,
        consumer_id: PacticipantId,
        provider_id: PacticipantId,
        sha: &ContentSha,
    ) -> StoreResult<Option<PactVersion>> {
        self.inner.find_pact_version(consumer_id, provider_id, sha).await
    }

    async fn insert_pact_version(&self, new: NewPactVersion) -> StoreResult<PactVersion> {
        if self.race_pact_version.swap(false, Ordering::SeqCst) {
            self.races.fetch_add(1, Ordering::SeqCst);
            self.inner.insert_pact_version(new.clone()).await?;
        }
        self.inner.insert_pact_version(new).await
    }

    async fn find_publication(&self, id: PublicationId) -> StoreResult<Option<PactPublication>> {
        self.inner.find_publication(id).await
    }

    async fn latest_revision(
        &self,
        consumer_version_id: VersionId,
        provider_id: PacticipantId,
    ) -> StoreResult<Option<PactPublication>> {
        self.inner.latest_revision(consumer_version_id, provider_id).await
    }

    async fn insert_publication(&self, new: NewPublication) -> StoreResult<PactPublication> {
        if self.race_publication.swap(false, Ordering::SeqCst) {
            self.races.fetch_add(1, Ordering::SeqCst);
            self.inner.insert_publication(new.clone()).await?;
        }
        let competing = self.competing_revision.swap(0, Ordering::SeqCst);
        if competing != 0 {
            self.races.fetch_add(1, Ordering::SeqCst);
            let rival = NewPublication {
                pact_version_id: PactVersionId::new(competing),
                ..new.clone()
            };
            self.inner.insert_publication(rival).await?;
        }
        self.inner.insert_publication(new).await
    }

    async fn delete_publications(&self, ids: &[PublicationId]) -> StoreResult<usize> {
        self.inner.delete_publications(ids).await
    }

    async fn find_pact(&self, id: PublicationId) -> StoreResult<Option<Pact>> {
        self.inner.find_pact(id).await
    }

    async fn pacts_between(
        &self,
        consumer_name: &str,
        provider_name: &str,
    ) -> StoreResult<Vec<Pact>> {
        self.inner.pacts_between(consumer_name, provider_name).await
    }

    async fn pacts_for_provider(&self, provider_name: &str) -> StoreResult<Vec<Pact>> {
        self.inner.pacts_for_provider(provider_name).await
    }

    async fn all_pacts(&self) -> StoreResult<Vec<Pact>> {
        self.inner.all_pacts().await
    }

    async fn latest_verification_for(
        &self,
        pact_version_id: PactVersionId,
    ) -> StoreResult<Option<Verification>> {
        self.inner.latest_verification_for(pact_version_id).await
    }

    async fn latest_verification_between(
        &self,
        consumer_id: PacticipantId,
        provider_id: PacticipantId,
    ) -> StoreResult<Option<Verification>> {
        self.inner.latest_verification_between(consumer_id, provider_id).await
    }
}

/// A store whose every operation fails as unavailable.
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn fail<T>() -> StoreResult<T> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl PactStore for UnavailableStore {
    async fn find_pacticipant(&self, _id: PacticipantId) -> StoreResult<Option<Pacticipant>> {
        Self::fail()
    }

    async fn find_pacticipant_by_name(&self, _name: &str) -> StoreResult<Option<Pacticipant>> {
        Self::fail()
    }

    async fn find_version(&self, _id: VersionId) -> StoreResult<Option<Version>> {
        Self::fail()
    }

    async fn find_pact_version(
        &self,
        _consumer_id: PacticipantId,
        _provider_id: PacticipantId,
        _sha: &ContentSha,
    ) -> StoreResult<Option<PactVersion>> {
        Self::fail()
    }

    async fn insert_pact_version(&self, _new: NewPactVersion) -> StoreResult<PactVersion> {
        Self::fail()
    }

    async fn find_publication(&self, _id: PublicationId) -> StoreResult<Option<PactPublication>> {
        Self::fail()
    }

    async fn latest_revision(
        &self,
        _consumer_version_id: VersionId,
        _provider_id: PacticipantId,
    ) -> StoreResult<Option<PactPublication>> {
        Self::fail()
    }

    async fn insert_publication(&self, _new: NewPublication) -> StoreResult<PactPublication> {
        Self::fail()
    }

    async fn delete_publications(&self, _ids: &[PublicationId]) -> StoreResult<usize> {
        Self::fail()
    }

    async fn find_pact(&self, _id: PublicationId) -> StoreResult<Option<Pact>> {
        Self::fail()
    }

    async fn pacts_between(
        &self,
        _consumer_name: &str,
        _provider_name: &str,
    ) -> StoreResult<Vec<Pact>> {
        Self::fail()
    }

    async fn pacts_for_provider(&self, _provider_name: &str) -> StoreResult<Vec<Pact>> {
        Self::fail()
    }

    async fn all_pacts(&self) -> StoreResult<Vec<Pact>> {
        Self::fail()
    }

    async fn latest_verification_for(
        &self,
        _pact_version_id: PactVersionId,
    ) -> StoreResult<Option<Verification>> {
        Self::fail()
    }

    async fn latest_verification_between(
        &self,
        _consumer_id: PacticipantId,
        _provider_id: PacticipantId,
    ) -> StoreResult<Option<Verification>> {
        Self::fail()
    }
}
