//! In-memory [`PactStore`].
//!
//! Tables live behind a single `tokio::sync::RwLock`; both uniqueness
//! constraints are checked under the write lock, so concurrent duplicate
//! inserts fail deterministically for all but one writer.

use crate::config::RegistryConfig;
use crate::error::{StoreError, StoreResult};
use crate::hashing::ContentSha;
use crate::model::{
    NewPactVersion, NewPublication, Pact, PactPublication, PactVersion, PactVersionId,
    Pacticipant, PacticipantId, PublicationId, Version, VersionId, VerificationId,
};
use crate::store::{PUBLICATION_REVISION_UNIQUE, PACT_VERSION_UNIQUE, PactStore};
use crate::verification::{NewVerification, Verification};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    pacticipants: BTreeMap<PacticipantId, Pacticipant>,
    versions: BTreeMap<VersionId, Version>,
    pact_versions: BTreeMap<PactVersionId, PactVersion>,
    publications: BTreeMap<PublicationId, PactPublication>,
    verifications: BTreeMap<VerificationId, Verification>,
    content_index: HashMap<(PacticipantId, PacticipantId, ContentSha), PactVersionId>,
    revision_index: HashMap<(VersionId, PacticipantId, u32), PublicationId>,
    // Highest order ever assigned per pacticipant; deletion never lowers it.
    order_marks: HashMap<PacticipantId, u64>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn pacticipant_by_name(&self, name: &str, case_sensitive: bool) -> Option<&Pacticipant> {
        if let Some(exact) = self.pacticipants.values().find(|p| p.name == name) {
            return Some(exact);
        }
        if case_sensitive {
            return None;
        }

        // Ambiguous case-insensitive matches resolve to nothing.
        let lowered = name.to_lowercase();
        let mut matches = self
            .pacticipants
            .values()
            .filter(|p| p.name.to_lowercase() == lowered);
        let first = matches.next()?;
        matches.next().is_none().then_some(first)
    }

    fn hydrate(&self, publication: &PactPublication) -> Option<Pact> {
        let version = self.versions.get(&publication.consumer_version_id)?;
        let consumer = self.pacticipants.get(&version.pacticipant_id)?;
        let provider = self.pacticipants.get(&publication.provider_id)?;
        let pact_version = self.pact_versions.get(&publication.pact_version_id)?;

        Some(Pact {
            publication_id: publication.id,
            consumer: consumer.clone(),
            provider: provider.clone(),
            consumer_version: version.clone(),
            revision_number: publication.revision_number,
            pact_version_id: pact_version.id,
            pact_version_sha: pact_version.sha.clone(),
            content: pact_version.content.clone(),
            created_at: publication.created_at,
        })
    }

    fn hydrate_where(&self, keep: impl Fn(&Pact) -> bool) -> Vec<Pact> {
        self.publications
            .values()
            .filter_map(|p| self.hydrate(p))
            .filter(|p| keep(p))
            .collect()
    }

    fn remove_publication(&mut self, id: PublicationId) -> bool {
        match self.publications.remove(&id) {
            Some(publication) => {
                self.revision_index.remove(&(
                    publication.consumer_version_id,
                    publication.provider_id,
                    publication.revision_number,
                ));
                true
            }
            None => false,
        }
    }
}

/// Store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryPactStore {
    tables: RwLock<Tables>,
    case_sensitive_names: bool,
}

impl MemoryPactStore {
    /// Create an empty store with case-insensitive name fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store using the configured name matching rules.
    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new().with_case_sensitive_names(config.case_sensitive_names)
    }

    /// Require exact name matches on lookups.
    #[must_use]
    pub const fn with_case_sensitive_names(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_names = case_sensitive;
        self
    }

    /// Find or create a pacticipant with exactly this name.
    pub async fn create_pacticipant(&self, name: &str) -> Pacticipant {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.pacticipants.values().find(|p| p.name == name) {
            return existing.clone();
        }

        let pacticipant = Pacticipant {
            id: PacticipantId::new(tables.next_id()),
            name: name.to_string(),
        };
        tables.pacticipants.insert(pacticipant.id, pacticipant.clone());
        pacticipant
    }

    /// Find or create a version, assigning the next order for the pacticipant.
    ///
    /// Orders strictly increase per pacticipant and are never reused, even
    /// after the newest version is deleted.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the pacticipant does not exist.
    pub async fn create_version(
        &self,
        pacticipant_id: PacticipantId,
        number: &str,
    ) -> StoreResult<Version> {
        let mut tables = self.tables.write().await;
        if !tables.pacticipants.contains_key(&pacticipant_id) {
            return Err(StoreError::backend(format!(
                "foreign key violation: pacticipant {pacticipant_id}"
            )));
        }

        if let Some(existing) = tables
            .versions
            .values()
            .find(|v| v.pacticipant_id == pacticipant_id && v.number == number)
        {
            return Ok(existing.clone());
        }

        let mark = tables.order_marks.entry(pacticipant_id).or_default();
        *mark += 1;
        let order = *mark;

        let version = Version {
            id: VersionId::new(tables.next_id()),
            pacticipant_id,
            number: number.to_string(),
            order,
            tags: Vec::new(),
            created_at: Utc::now(),
        };
        tables.versions.insert(version.id, version.clone());
        Ok(version)
    }

    /// Attach a tag to a version.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the version does not exist.
    pub async fn tag_version(&self, version_id: VersionId, tag: &str) -> StoreResult<Version> {
        let mut tables = self.tables.write().await;
        let version = tables
            .versions
            .get_mut(&version_id)
            .ok_or_else(|| StoreError::backend(format!("foreign key violation: version {version_id}")))?;

        if !version.has_tag(tag) {
            version.tags.push(tag.to_string());
        }
        Ok(version.clone())
    }

    /// Delete a version and every publication made for it.
    ///
    /// Pact content rows are left in place.
    pub async fn delete_version(&self, version_id: VersionId) -> usize {
        let mut tables = self.tables.write().await;
        let doomed: Vec<PublicationId> = tables
            .publications
            .values()
            .filter(|p| p.consumer_version_id == version_id)
            .map(|p| p.id)
            .collect();
        for id in &doomed {
            tables.remove_publication(*id);
        }
        tables.versions.remove(&version_id);
        doomed.len()
    }

    /// Record a verification result.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the pact version does not exist.
    pub async fn record_verification(&self, new: NewVerification) -> StoreResult<Verification> {
        let mut tables = self.tables.write().await;
        if !tables.pact_versions.contains_key(&new.pact_version_id) {
            return Err(StoreError::backend(format!(
                "foreign key violation: pact version {}",
                new.pact_version_id
            )));
        }

        let verification = Verification {
            id: VerificationId::new(tables.next_id()),
            pact_version_id: new.pact_version_id,
            provider_version: new.provider_version,
            success: new.success,
            execution_date: Utc::now(),
        };
        tables.verifications.insert(verification.id, verification.clone());
        Ok(verification)
    }

    /// Number of stored pact content rows.
    pub async fn pact_version_count(&self) -> usize {
        self.tables.read().await.pact_versions.len()
    }

    /// Number of stored publication rows.
    pub async fn publication_count(&self) -> usize {
        self.tables.read().await.publications.len()
    }
}

#[async_trait]
impl PactStore for MemoryPactStore {
    async fn find_pacticipant(&self, id: PacticipantId) -> StoreResult<Option<Pacticipant>> {
        Ok(self.tables.read().await.pacticipants.get(&id).cloned())
    }

    async fn find_pacticipant_by_name(&self, name: &str) -> StoreResult<Option<Pacticipant>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pacticipant_by_name(name, self.case_sensitive_names)
            .cloned())
    }

    async fn find_version(&self, id: VersionId) -> StoreResult<Option<Version>> {
        Ok(self.tables.read().await.versions.get(&id).cloned())
    }

    async fn find_pact_version(
        &self,
        consumer_id: PacticipantId,
        provider_id: PacticipantId,
        sha: &ContentSha,
    ) -> StoreResult<Option<PactVersion>> {
        let tables = self.tables.read().await;
        Ok(tables
            .content_index
            .get(&(consumer_id, provider_id, sha.clone()))
            .and_then(|id| tables.pact_versions.get(id))
            .cloned())
    }

    async fn insert_pact_version(&self, new: NewPactVersion) -> StoreResult<PactVersion> {
        let mut tables = self.tables.write().await;
        let key = (new.consumer_id, new.provider_id, new.sha.clone());
        if tables.content_index.contains_key(&key) {
            return Err(StoreError::unique(PACT_VERSION_UNIQUE));
        }

        let pact_version = PactVersion {
            id: PactVersionId::new(tables.next_id()),
            consumer_id: new.consumer_id,
            provider_id: new.provider_id,
            sha: new.sha,
            content: new.content,
            created_at: Utc::now(),
        };
        tables.content_index.insert(key, pact_version.id);
        tables.pact_versions.insert(pact_version.id, pact_version.clone());
        Ok(pact_version)
    }

    async fn find_publication(&self, id: PublicationId) -> StoreResult<Option<PactPublication>> {
        Ok(self.tables.read().await.publications.get(&id).cloned())
    }

    async fn latest_revision(
        &self,
        consumer_version_id: VersionId,
        provider_id: PacticipantId,
    ) -> StoreResult<Option<PactPublication>> {
        let tables = self.tables.read().await;
        Ok(tables
            .publications
            .values()
            .filter(|p| p.consumer_version_id == consumer_version_id && p.provider_id == provider_id)
            .max_by_key(|p| p.revision_number)
            .cloned())
    }

    async fn insert_publication(&self, new: NewPublication) -> StoreResult<PactPublication> {
        let mut tables = self.tables.write().await;
        let key = (new.consumer_version_id, new.provider_id, new.revision_number);
        if tables.revision_index.contains_key(&key) {
            return Err(StoreError::unique(PUBLICATION_REVISION_UNIQUE));
        }

        let publication = PactPublication {
            id: PublicationId::new(tables.next_id()),
            consumer_version_id: new.consumer_version_id,
            provider_id: new.provider_id,
            pact_version_id: new.pact_version_id,
            revision_number: new.revision_number,
            created_at: Utc::now(),
        };
        tables.revision_index.insert(key, publication.id);
        tables.publications.insert(publication.id, publication.clone());
        Ok(publication)
    }

    async fn delete_publications(&self, ids: &[PublicationId]) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        Ok(ids.iter().filter(|id| tables.remove_publication(**id)).count())
    }

    async fn find_pact(&self, id: PublicationId) -> StoreResult<Option<Pact>> {
        let tables = self.tables.read().await;
        Ok(tables.publications.get(&id).and_then(|p| tables.hydrate(p)))
    }

    async fn pacts_between(
        &self,
        consumer_name: &str,
        provider_name: &str,
    ) -> StoreResult<Vec<Pact>> {
        let tables = self.tables.read().await;
        let consumer = tables.pacticipant_by_name(consumer_name, self.case_sensitive_names);
        let provider = tables.pacticipant_by_name(provider_name, self.case_sensitive_names);
        let (Some(consumer), Some(provider)) = (consumer, provider) else {
            return Ok(Vec::new());
        };

        Ok(tables.hydrate_where(|p| p.consumer.id == consumer.id && p.provider.id == provider.id))
    }

    async fn pacts_for_provider(&self, provider_name: &str) -> StoreResult<Vec<Pact>> {
        let tables = self.tables.read().await;
        let Some(provider) = tables.pacticipant_by_name(provider_name, self.case_sensitive_names)
        else {
            return Ok(Vec::new());
        };

        Ok(tables.hydrate_where(|p| p.provider.id == provider.id))
    }

    async fn all_pacts(&self) -> StoreResult<Vec<Pact>> {
        Ok(self.tables.read().await.hydrate_where(|_| true))
    }

    async fn latest_verification_for(
        &self,
        pact_version_id: PactVersionId,
    ) -> StoreResult<Option<Verification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .verifications
            .values()
            .filter(|v| v.verifies(pact_version_id))
            .max_by_key(|v| v.id)
            .cloned())
    }

    async fn latest_verification_between(
        &self,
        consumer_id: PacticipantId,
        provider_id: PacticipantId,
    ) -> StoreResult<Option<Verification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .verifications
            .values()
            .filter(|v| {
                tables.pact_versions.get(&v.pact_version_id).is_some_and(|pv| {
                    pv.consumer_id == consumer_id && pv.provider_id == provider_id
                })
            })
            .max_by_key(|v| v.id)
            .cloned())
    }
}
