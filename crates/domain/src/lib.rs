//! # solr-multisub-domain
//!
//! Domain model for multi-subscription search core selection.
//!
//! - **Subscription** - `SubscriptionDescriptor`, `CoreInfo`, catalog parsing
//! - **Overrides** - `OverrideConfig`, `ManualCredentials`
//! - **Derived key** - `derive_key`, `DerivedKey`
//! - **Target** - `ResolvedTarget`, `Scheme`, `ResolutionSource`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use solr_multisub_shared::shared_crate_version;

pub mod derived_key;
pub mod errors;
pub mod overrides;
pub mod subscription;
pub mod target;

pub use derived_key::{DERIVATION_PAD_LEN, DerivedKey, derive_key};
pub use errors::{InvalidCredentialError, MalformedSubscriptionError, ResolveError};
pub use overrides::{ManualCredentials, ManualField, OverrideConfig, SELECTOR_OTHER};
pub use subscription::{
    CoreInfo, FAILOVER_MARKER, SubscriptionDescriptor, parse_subscription,
    parse_subscription_json, region_prefix,
};
pub use target::{
    CORE_PATH_PREFIX, HTTP_PORT, HTTPS_PORT, ResolutionSource, ResolvedTarget, Scheme,
    assemble_target,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_crate_compiles() {
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
