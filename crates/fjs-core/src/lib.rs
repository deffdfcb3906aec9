#![deny(missing_docs)]

//! # fjs-core — Foundational Types for the fjs Schema Compiler
//!
//! This crate defines the primitives shared by every other crate in the
//! workspace. It has no internal crate dependencies, only `serde`,
//! `serde_json`, `serde_jcs`, `thiserror`, and `sha2` from the external
//! ecosystem.
//!
//! ## Design Principles
//!
//! 1. **[`JsonPointer`] is the only path representation for schema
//!    locations.** Scopes, resolution errors, and artifact metadata all carry
//!    decoded pointer tokens, never raw fragment strings, so two spellings of
//!    the same location compare equal.
//!
//! 2. **[`CanonicalBytes`] is the sole path to digest computation.** Artifact
//!    fingerprints and routine-name disambiguators flow through
//!    `CanonicalBytes::new()` (RFC 8785 JCS output).
//!
//! 3. **[`json_equal`] is the only equality used by validation.** `enum`,
//!    `const`, and `uniqueItems` all compare numbers by value (`1 == 1.0`),
//!    which `serde_json::Value`'s `PartialEq` does not.
//!
//! 4. **Typed errors.** [`PointerError`] and [`CanonicalizationError`] are
//!    `thiserror` enums, no `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod equality;
pub mod error;
pub mod pointer;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use equality::{json_equal, json_kind, JsonKind};
pub use error::{CanonicalizationError, PointerError};
pub use pointer::JsonPointer;
