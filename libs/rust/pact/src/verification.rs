//! Provider verification records.
//!
//! Verification outcomes are produced elsewhere; the registry only stores
//! and reads them by pact version identity.

use crate::model::{PactVersionId, VerificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A provider's verification of a specific pact version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verification {
    /// Row id
    pub id: VerificationId,
    /// Pact content that was verified
    pub pact_version_id: PactVersionId,
    /// Provider version that ran the verification
    pub provider_version: String,
    /// Whether verification succeeded
    pub success: bool,
    /// When the verification ran
    pub execution_date: DateTime<Utc>,
}

/// Insert payload for a verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVerification {
    /// Pact content that was verified
    pub pact_version_id: PactVersionId,
    /// Provider version that ran the verification
    pub provider_version: String,
    /// Whether verification succeeded
    pub success: bool,
}

impl NewVerification {
    /// Create a verification payload.
    #[must_use]
    pub fn new(pact_version_id: PactVersionId, provider_version: impl Into<String>, success: bool) -> Self {
        Self {
            pact_version_id,
            provider_version: provider_version.into(),
            success,
        }
    }
}

impl Verification {
    /// Check whether this verification covers the given pact content.
    #[must_use]
    pub fn verifies(&self, pact_version_id: PactVersionId) -> bool {
        self.pact_version_id == pact_version_id
    }
}
