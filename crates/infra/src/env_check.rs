//! Environment validation helpers for CLI surfaces.

use solr_multisub_config::{BackendConfig, BackendEnv, apply_env_overrides};
use solr_multisub_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Validate that the provided env values parse and merge into the default config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    let parsed = BackendEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    apply_env_overrides(BackendConfig::default(), &parsed)?;
    Ok(())
}
