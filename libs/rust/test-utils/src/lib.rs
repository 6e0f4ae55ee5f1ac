//! Shared test utilities for the pact registry.
//!
//! This crate provides:
//! - Proptest generators for registry inputs
//! - Store doubles for race and failure paths
//! - Sample pact documents and a seeded in-memory registry

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use fixtures::{SeededRegistry, pact_json, reordered_pact_json};
pub use generators::*;
pub use mocks::{RacingStore, UnavailableStore};
