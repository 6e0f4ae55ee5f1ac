//! Pact registry engine.
//!
//! Stores consumer/provider pacts with content-addressed deduplication and
//! answers latest, previous, next and previous-distinct queries:
//! - Content hashing and structural diffing of pact bodies
//! - Order-based navigation over consumer versions
//! - Append-only publication revisions
//! - Relationship status classification and ordering

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod differ;
pub mod error;
pub mod hashing;
pub mod memory;
pub mod model;
pub mod ordering;
pub mod pact_versions;
pub mod relationship;
pub mod resolver;
pub mod store;
pub mod telemetry;
pub mod verification;

pub use config::{ConfigError, RegistryConfig};
pub use differ::{ChangeKind, Difference, SemanticDiffer};
pub use error::{RegistryError, RegistryResult, StoreError, StoreResult};
pub use hashing::{ContentHasher, ContentSha};
pub use memory::MemoryPactStore;
pub use model::{
    NewPactVersion, NewPublication, Pact, PactCoordinates, PactLookup, PactNavigation,
    PactPublication, PactVersion, PactVersionId, Pacticipant, PacticipantId, PublicationId,
    PublishRequest, Version, VersionId, VerificationId,
};
pub use ordering::VersionOrdering;
pub use pact_versions::PactVersionStore;
pub use relationship::{
    Relationship, RelationshipKey, StatusKind, VerificationStatus, VerificationStatusInputs,
    sort_relationships,
};
pub use resolver::PactPublicationResolver;
pub use store::PactStore;
pub use telemetry::{TracingConfig, init_tracing};
pub use verification::{NewVerification, Verification};
