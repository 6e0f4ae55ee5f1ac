//! Content fingerprints for pact bodies.
//!
//! The digest is a deduplication key, not a security boundary, so SHA-1
//! is sufficient.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

/// Length of a hex-encoded SHA-1 digest.
pub const SHA_HEX_LEN: usize = 40;

/// Hex-encoded SHA-1 of a pact body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSha(String);

impl ContentSha {
    /// Hash the given content.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        Self(hex::encode(Sha1::digest(content)))
    }

    /// Parse a hex digest supplied by a caller.
    ///
    /// Accepts 40 hex characters in either case and normalises to lowercase.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        (value.len() == SHA_HEX_LEN && value.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| Self(value.to_ascii_lowercase()))
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes content fingerprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Hash raw content bytes.
    #[must_use]
    pub fn hash(self, content: &[u8]) -> ContentSha {
        ContentSha::of(content)
    }

    /// Check whether two bodies are byte-identical by digest.
    #[must_use]
    pub fn same_content(self, a: &[u8], b: &[u8]) -> bool {
        self.hash(a) == self.hash(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            ContentHasher.hash(b"").as_str(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            ContentHasher.hash(b"abc").as_str(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        let content = br#"{"consumer":{"name":"Foo"}}"#;
        assert_eq!(ContentHasher.hash(content), ContentHasher.hash(content));
        assert!(ContentHasher.same_content(content, content));
    }

    #[test]
    fn test_whitespace_changes_digest() {
        assert!(!ContentHasher.same_content(br#"{"a":1}"#, br#"{ "a": 1 }"#));
    }

    #[test]
    fn test_parse() {
        let sha = ContentSha::parse("A9993E364706816ABA3E25717850C26C9CD0D89D").unwrap();
        assert_eq!(sha, ContentSha::of(b"abc"));
        assert_eq!(sha.to_string().len(), SHA_HEX_LEN);

        assert!(ContentSha::parse("short").is_none());
        assert!(ContentSha::parse("z9993e364706816aba3e25717850c26c9cd0d89d").is_none());
    }
}
