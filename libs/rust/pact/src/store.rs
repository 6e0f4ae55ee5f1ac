//! Storage boundary for the registry.
//!
//! Implementations must enforce two uniqueness constraints and report
//! violations as [`StoreError::UniqueViolation`]:
//! - pact versions on (consumer id, provider id, sha)
//! - publications on (consumer version id, provider id, revision number)

use crate::error::StoreResult;
use crate::hashing::ContentSha;
use crate::model::{
    NewPactVersion, NewPublication, Pact, PactPublication, PactVersion, PactVersionId,
    Pacticipant, PacticipantId, PublicationId, Version, VersionId,
};
use crate::verification::Verification;
use async_trait::async_trait;

/// Constraint name for pact version content uniqueness.
pub const PACT_VERSION_UNIQUE: &str = "pact_versions_consumer_provider_sha";

/// Constraint name for publication revision uniqueness.
pub const PUBLICATION_REVISION_UNIQUE: &str = "pact_publications_version_provider_revision";

/// Queryable, ordered store of pacticipants, versions, pact content and
/// publications.
#[async_trait]
pub trait PactStore: Send + Sync {
    /// Find a pacticipant by id.
    async fn find_pacticipant(&self, id: PacticipantId) -> StoreResult<Option<Pacticipant>>;

    /// Find a pacticipant by name, honouring the store's case rules.
    async fn find_pacticipant_by_name(&self, name: &str) -> StoreResult<Option<Pacticipant>>;

    /// Find a version by id.
    async fn find_version(&self, id: VersionId) -> StoreResult<Option<Version>>;

    /// Find the pact version row for the given content hash.
    async fn find_pact_version(
        &self,
        consumer_id: PacticipantId,
        provider_id: PacticipantId,
        sha: &ContentSha,
    ) -> StoreResult<Option<PactVersion>>;

    /// Insert a pact version row.
    ///
    /// Fails with `UniqueViolation` if the (consumer, provider, sha) row exists.
    async fn insert_pact_version(&self, new: NewPactVersion) -> StoreResult<PactVersion>;

    /// Find a publication by id.
    async fn find_publication(&self, id: PublicationId) -> StoreResult<Option<PactPublication>>;

    /// Highest revision published for a consumer version and provider.
    async fn latest_revision(
        &self,
        consumer_version_id: VersionId,
        provider_id: PacticipantId,
    ) -> StoreResult<Option<PactPublication>>;

    /// Insert a publication row.
    ///
    /// Fails with `UniqueViolation` if the revision already exists.
    async fn insert_publication(&self, new: NewPublication) -> StoreResult<PactPublication>;

    /// Delete publications by id, returning how many were removed.
    async fn delete_publications(&self, ids: &[PublicationId]) -> StoreResult<usize>;

    /// Hydrate a single publication.
    async fn find_pact(&self, id: PublicationId) -> StoreResult<Option<Pact>>;

    /// Every publication, all revisions, between a consumer and provider.
    async fn pacts_between(&self, consumer_name: &str, provider_name: &str)
    -> StoreResult<Vec<Pact>>;

    /// Every publication, all revisions, for a provider.
    async fn pacts_for_provider(&self, provider_name: &str) -> StoreResult<Vec<Pact>>;

    /// Every publication, all revisions.
    async fn all_pacts(&self) -> StoreResult<Vec<Pact>>;

    /// Most recent verification of a pact version.
    async fn latest_verification_for(
        &self,
        pact_version_id: PactVersionId,
    ) -> StoreResult<Option<Verification>>;

    /// Most recent verification of any pact version between a consumer and provider.
    async fn latest_verification_between(
        &self,
        consumer_id: PacticipantId,
        provider_id: PacticipantId,
    ) -> StoreResult<Option<Verification>>;
}
