//! Registry error types.
//!
//! Lookup misses are not errors: resolver queries return `Option`. The
//! variants here cover malformed input, invalid write requests and
//! storage failures, which are propagated to the caller unchanged.

use crate::model::{PacticipantId, PublicationId, VersionId};
use thiserror::Error;

/// Errors raised at the storage boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the insert.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint
        constraint: &'static str,
    },

    /// Backing store is temporarily unavailable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Check if this error is a uniqueness conflict.
    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Create a unique violation error for the named constraint.
    #[must_use]
    pub const fn unique(constraint: &'static str) -> Self {
        Self::UniqueViolation { constraint }
    }

    /// Create a backend error with the given message.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Errors returned by registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Pact content could not be parsed as JSON
    #[error("Malformed pact content: {0}")]
    MalformedContent(#[from] serde_json::Error),

    /// Update referenced a publication that does not exist
    #[error("Publication not found: {0}")]
    PublicationNotFound(PublicationId),

    /// Publish targeted a consumer version and provider that already have a publication
    #[error("Pact already published for consumer version {consumer_version_id} and provider {provider_id}")]
    PublicationExists {
        /// Consumer version of the existing publication
        consumer_version_id: VersionId,
        /// Provider of the existing publication
        provider_id: PacticipantId,
    },

    /// Request referenced a pacticipant that does not exist
    #[error("Pacticipant not found: {0}")]
    PacticipantNotFound(PacticipantId),

    /// Request referenced a version that does not exist
    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),

    /// Consumer version does not belong to the given consumer
    #[error("Version {version_id} does not belong to consumer {consumer_id}")]
    ConsumerMismatch {
        /// Version named in the request
        version_id: VersionId,
        /// Consumer named in the request
        consumer_id: PacticipantId,
    },

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    /// Check if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Check if this error was caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}
