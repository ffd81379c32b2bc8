//! # solr-multisub-shared
//!
//! Shared result types, error handling, and redaction for the solr-multisub
//! workspace.
//!
//! This crate provides foundational types that are used across all other crates:
//!
//! - Result alias and the structured error envelope
//! - Secret wrappers that never print their contents
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - Error envelopes serialize for CLI/JSON surfaces
//! 3. **Secrets stay opaque** - Debug/Display of secrets always redacts

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod redaction;
pub mod result;

pub use errors::{
    ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, REDACTED_VALUE,
    UnexpectedError, normalize_unexpected_error,
};
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret};
pub use result::Result;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
