//! # solr-multisub-app
//!
//! Use cases for core selection, snapshot refresh and the settings summary.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod detector;
pub mod refresh_subscription;
pub mod resolve_connection;
pub mod resolver;
pub mod settings;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use detector::{AmbientEnvironment, detect_environment_core};
pub use refresh_subscription::{
    RefreshOutcome, RefreshSkipReason, RefreshSubscriptionDeps, RefreshSubscriptionInput,
    SiteIdentity, refresh_subscription,
};
pub use resolve_connection::{
    ConnectionResolution, RESOLUTION_STAGES, RESOLUTION_TRANSITIONS, ResolutionStage,
    ResolveConnectionDeps, ResolveConnectionInput, is_allowed_transition, resolve_connection,
    resolve_connection_raw,
};
pub use resolver::{ResolutionOutcome, resolve_outcome};
pub use settings::{SettingsSummary, describe_settings};
