//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use solr_multisub_config::{
    BackendEnv, ValidatedBackendConfig, load_backend_config_from_path, to_pretty_json,
    to_pretty_toml,
};
use solr_multisub_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Effective config plus the env it was merged with.
///
/// Secrets and ambient site identity live only in `env`.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Validated config after file and env merging.
    pub config: ValidatedBackendConfig,
    /// Parsed environment.
    pub env: BackendEnv,
}

/// Load config from an optional file plus the process environment.
pub fn load_local_config(config_path: Option<&Path>) -> InfraResult<LoadedConfig> {
    let env = BackendEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    let config = load_backend_config_from_path(config_path, &env)?;
    Ok(LoadedConfig { config, env })
}

/// Load config from an optional file plus an explicit env map.
pub fn load_local_config_from_map(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<LoadedConfig> {
    let env = BackendEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let config = load_backend_config_from_path(config_path, &env)?;
    Ok(LoadedConfig { config, env })
}

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<String> {
    let loaded = load_local_config_from_map(env, config_path)?;
    to_pretty_json(&loaded.config)
}

/// Load and validate the effective config, returning pretty TOML.
pub fn load_effective_config_toml(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<String> {
    let loaded = load_local_config_from_map(env, config_path)?;
    to_pretty_toml(&loaded.config)
}
