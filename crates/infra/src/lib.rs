//! # solr-multisub-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Local CLI orchestration helpers.
pub mod cli_local;
/// Use-case inputs and adapters built from config.
pub mod composition;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;

pub use cli_local::{
    RefreshReport, ResolveReport, run_refresh_local, run_resolve_local, run_settings_local,
};
pub use composition::{
    LogOutput, ambient_environment, build_logger, override_config, site_identity,
};
pub use config_check::{
    LoadedConfig, load_effective_config_json, load_effective_config_toml, load_local_config,
    load_local_config_from_map,
};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};

// Re-export redaction utilities for CLI boundary sanitization
pub use solr_multisub_shared::{is_secret_key, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
