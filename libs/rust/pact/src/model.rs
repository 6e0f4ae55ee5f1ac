//! Registry domain types.

use crate::hashing::ContentSha;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw row id.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Raw row id.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Pacticipant row id.
    PacticipantId
);
row_id!(
    /// Version row id.
    VersionId
);
row_id!(
    /// Pact version (content) row id.
    PactVersionId
);
row_id!(
    /// Publication row id.
    PublicationId
);
row_id!(
    /// Verification row id.
    VerificationId
);

/// A named consumer or provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pacticipant {
    /// Row id
    pub id: PacticipantId,
    /// Name, stored case-sensitively
    pub name: String,
}

/// A version of a pacticipant.
///
/// `order` is assigned at creation, strictly increasing per pacticipant,
/// and is the only field used for before/after comparisons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Version {
    /// Row id
    pub id: VersionId,
    /// Owning pacticipant
    pub pacticipant_id: PacticipantId,
    /// Free-form version number, e.g. "1.2.3"
    pub number: String,
    /// Creation order within the pacticipant
    pub order: u64,
    /// Tags attached to this version
    pub tags: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Check whether the version carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Immutable, content-addressed pact body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PactVersion {
    /// Row id
    pub id: PactVersionId,
    /// Consumer the content belongs to
    pub consumer_id: PacticipantId,
    /// Provider the content belongs to
    pub provider_id: PacticipantId,
    /// Content hash
    pub sha: ContentSha,
    /// Raw JSON content
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a pact version row.
#[derive(Debug, Clone)]
pub struct NewPactVersion {
    /// Consumer the content belongs to
    pub consumer_id: PacticipantId,
    /// Provider the content belongs to
    pub provider_id: PacticipantId,
    /// Content hash
    pub sha: ContentSha,
    /// Raw JSON content
    pub content: String,
}

/// One revision of a pact published for a consumer version and provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PactPublication {
    /// Row id
    pub id: PublicationId,
    /// Consumer version the pact was published for
    pub consumer_version_id: VersionId,
    /// Provider the pact targets
    pub provider_id: PacticipantId,
    /// Content row
    pub pact_version_id: PactVersionId,
    /// Revision, starting at 1 for each consumer version and provider
    pub revision_number: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a publication row.
#[derive(Debug, Clone)]
pub struct NewPublication {
    /// Consumer version the pact was published for
    pub consumer_version_id: VersionId,
    /// Provider the pact targets
    pub provider_id: PacticipantId,
    /// Content row
    pub pact_version_id: PactVersionId,
    /// Revision number
    pub revision_number: u32,
}

/// A fully hydrated publication: names, version, content and identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pact {
    /// Publication row id
    pub publication_id: PublicationId,
    /// Consumer
    pub consumer: Pacticipant,
    /// Provider
    pub provider: Pacticipant,
    /// Consumer version the pact was published for
    pub consumer_version: Version,
    /// Revision of this publication
    pub revision_number: u32,
    /// Content row id
    pub pact_version_id: PactVersionId,
    /// Content hash
    pub pact_version_sha: ContentSha,
    /// Raw JSON content
    pub content: String,
    /// Publication timestamp
    pub created_at: DateTime<Utc>,
}

impl Pact {
    /// Consumer version order.
    #[must_use]
    pub const fn order(&self) -> u64 {
        self.consumer_version.order
    }

    /// Consumer name, verbatim.
    #[must_use]
    pub fn consumer_name(&self) -> &str {
        &self.consumer.name
    }

    /// Provider name, verbatim.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider.name
    }

    /// Stable identifying fields for building links to this pact.
    #[must_use]
    pub fn coordinates(&self) -> PactCoordinates {
        PactCoordinates {
            consumer_name: self.consumer.name.clone(),
            provider_name: self.provider.name.clone(),
            consumer_version_number: self.consumer_version.number.clone(),
            order: self.consumer_version.order,
            revision_number: self.revision_number,
            pact_version_sha: self.pact_version_sha.clone(),
        }
    }
}

/// Identifying fields a renderer needs to address a pact.
///
/// Names are verbatim; escaping belongs to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PactCoordinates {
    /// Consumer name
    pub consumer_name: String,
    /// Provider name
    pub provider_name: String,
    /// Consumer version number
    pub consumer_version_number: String,
    /// Consumer version order
    pub order: u64,
    /// Publication revision
    pub revision_number: u32,
    /// Content hash
    pub pact_version_sha: ContentSha,
}

/// Previous and next pacts relative to a given pact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PactNavigation {
    /// Nearest earlier consumer version's pact
    pub previous: Option<PactCoordinates>,
    /// Nearest later consumer version's pact
    pub next: Option<PactCoordinates>,
}

/// Inbound publish request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Consumer version being published
    pub consumer_version_id: VersionId,
    /// Provider the pact targets
    pub provider_id: PacticipantId,
    /// Consumer owning the version
    pub consumer_id: PacticipantId,
    /// Raw JSON content
    pub json_content: String,
}

/// Inbound lookup request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PactLookup {
    /// Consumer name
    pub consumer_name: String,
    /// Provider name
    pub provider_name: String,
    /// Restrict to consumer versions carrying this tag
    pub tag: Option<String>,
    /// Exact consumer version number
    pub consumer_version_number: Option<String>,
    /// Exact content hash
    pub pact_version_sha: Option<ContentSha>,
}

impl PactLookup {
    /// Lookup of the latest pact between two pacticipants.
    #[must_use]
    pub fn latest(consumer_name: impl Into<String>, provider_name: impl Into<String>) -> Self {
        Self {
            consumer_name: consumer_name.into(),
            provider_name: provider_name.into(),
            ..Self::default()
        }
    }

    /// Restrict to a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Select an exact consumer version number.
    #[must_use]
    pub fn with_consumer_version(mut self, number: impl Into<String>) -> Self {
        self.consumer_version_number = Some(number.into());
        self
    }

    /// Select an exact content hash.
    #[must_use]
    pub fn with_sha(mut self, sha: ContentSha) -> Self {
        self.pact_version_sha = Some(sha);
        self
    }
}
