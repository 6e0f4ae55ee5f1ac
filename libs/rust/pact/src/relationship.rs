//! Consumer/provider relationship classification and ordering.

use crate::model::Pact;
use crate::verification::Verification;
use serde::Serialize;
use std::cmp::Ordering;

/// Inputs to the verification status classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationStatusInputs {
    /// Whether the provider has ever verified a pact for this pair
    pub ever_verified: bool,
    /// Whether the latest pact differs from the last verified one
    pub pact_changed: bool,
    /// Whether the latest verification succeeded
    pub verification_successful: bool,
    /// Provider name
    pub provider_name: String,
    /// Provider version of the latest verification
    pub provider_version: String,
}

impl VerificationStatusInputs {
    /// Derive inputs from the latest pact and the latest verification
    /// between the same consumer and provider.
    #[must_use]
    pub fn from_latest(pact: &Pact, verification: Option<&Verification>) -> Self {
        Self {
            ever_verified: verification.is_some(),
            pact_changed: verification.is_some_and(|v| !v.verifies(pact.pact_version_id)),
            verification_successful: verification.is_some_and(|v| v.success),
            provider_name: pact.provider.name.clone(),
            provider_version: verification
                .map(|v| v.provider_version.clone())
                .unwrap_or_default(),
        }
    }
}

/// Display classification of a relationship's verification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusKind {
    /// Never verified
    None,
    /// Pact changed since the last verification
    Warning,
    /// Latest verification failed
    Danger,
    /// Latest verification succeeded
    Success,
}

impl StatusKind {
    /// Status name as rendered.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Success => "success",
        }
    }
}

/// Classified verification status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationStatus {
    /// Classification
    pub kind: StatusKind,
    /// Explanatory text, absent when never verified
    pub tooltip: Option<String>,
}

impl VerificationStatus {
    /// Classify the inputs. Conditions are checked in a fixed order:
    /// never verified, pact changed, verification failed, success.
    #[must_use]
    pub fn classify(inputs: &VerificationStatusInputs) -> Self {
        let by = format!("{} (v{})", inputs.provider_name, inputs.provider_version);

        let (kind, tooltip) = if !inputs.ever_verified {
            (StatusKind::None, None)
        } else if inputs.pact_changed {
            (
                StatusKind::Warning,
                Some(format!("Pact has changed since last successful verification by {by}")),
            )
        } else if !inputs.verification_successful {
            (StatusKind::Danger, Some(format!("Verification by {by} failed")))
        } else {
            (StatusKind::Success, Some(format!("Successfully verified by {by}")))
        };

        Self { kind, tooltip }
    }

    /// Status name as rendered.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Whether this status should be flagged as a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.kind == StatusKind::Warning
    }
}

/// The fields relationship sorting needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipKey {
    /// Consumer name
    pub consumer_name: String,
    /// Provider name
    pub provider_name: String,
}

impl RelationshipKey {
    /// Create a key.
    #[must_use]
    pub fn new(consumer_name: impl Into<String>, provider_name: impl Into<String>) -> Self {
        Self {
            consumer_name: consumer_name.into(),
            provider_name: provider_name.into(),
        }
    }

    /// Compare by consumer name, then provider name, both case-insensitively.
    ///
    /// Names differing only in case compare equal.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        compare_ignore_case(&self.consumer_name, &other.consumer_name)
            .then_with(|| compare_ignore_case(&self.provider_name, &other.provider_name))
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// A consumer/provider pair with its latest pact and verification.
#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    /// Sort key
    pub key: RelationshipKey,
    /// Latest pact between the pair
    pub latest_pact: Pact,
    /// Latest verification between the pair
    pub latest_verification: Option<Verification>,
    /// Classified verification status
    pub status: VerificationStatus,
}

impl Relationship {
    /// Build a relationship from the latest pact and verification.
    #[must_use]
    pub fn new(latest_pact: Pact, latest_verification: Option<Verification>) -> Self {
        let inputs = VerificationStatusInputs::from_latest(&latest_pact, latest_verification.as_ref());
        Self {
            key: RelationshipKey::new(latest_pact.consumer.name.clone(), latest_pact.provider.name.clone()),
            status: VerificationStatus::classify(&inputs),
            latest_pact,
            latest_verification,
        }
    }
}

/// Stable sort by [`RelationshipKey::compare`].
pub fn sort_relationships(relationships: &mut [Relationship]) {
    relationships.sort_by(|a, b| a.key.compare(&b.key));
}
