//! Environment variable parsing and env-to-config merging.
//!
//! This module keeps env parsing:
//! - strict (present-but-blank or unparseable values fail fast)
//! - safe (secret values are redacted in error metadata)
//!
//! Secrets and ambient site identity only ever come from env.

use crate::schema::{BackendConfig, ValidatedBackendConfig};
use solr_multisub_domain::Scheme;
use solr_multisub_shared::{ErrorCode, ErrorEnvelope, REDACTED_VALUE, SecretString, is_secret_key};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Env var: transport scheme (`https` | `http`).
pub const ENV_SCHEME: &str = "MULTISUB_SCHEME";
/// Env var: default search host.
pub const ENV_SEARCH_HOST: &str = "MULTISUB_SEARCH_HOST";
/// Env var: primary subscription identifier.
pub const ENV_SUBSCRIPTION_IDENTIFIER: &str = "MULTISUB_SUBSCRIPTION_IDENTIFIER";
/// Env var: primary subscription key (secret).
pub const ENV_SUBSCRIPTION_KEY: &str = "MULTISUB_SUBSCRIPTION_KEY";
/// Env var: snapshot directory.
pub const ENV_SNAPSHOT_DIR: &str = "MULTISUB_SNAPSHOT_DIR";
/// Env var: core selector.
pub const ENV_SELECTOR: &str = "MULTISUB_SELECTOR";
/// Env var: auto-switch toggle.
pub const ENV_AUTO_SWITCH: &str = "MULTISUB_AUTO_SWITCH";
/// Env var: manual subscription identifier.
pub const ENV_MANUAL_IDENTIFIER: &str = "MULTISUB_MANUAL_IDENTIFIER";
/// Env var: manual subscription key (secret).
pub const ENV_MANUAL_KEY: &str = "MULTISUB_MANUAL_KEY";
/// Env var: manual core name.
pub const ENV_MANUAL_CORE_NAME: &str = "MULTISUB_MANUAL_CORE_NAME";
/// Env var: hosting site name.
pub const ENV_SITE_NAME: &str = "AH_SITE_NAME";
/// Env var: hosting site environment (`dev`, `test`, `prod`, ...).
pub const ENV_SITE_ENVIRONMENT: &str = "AH_SITE_ENVIRONMENT";
/// Env var: site is blocked; refresh is skipped.
pub const ENV_SITE_BLOCKED: &str = "MULTISUB_SITE_BLOCKED";
/// Env var: site machine name.
pub const ENV_SITE_MACHINE_NAME: &str = "MULTISUB_SITE_MACHINE_NAME";

const ALL_ENV_VARS: [&str; 14] = [
    ENV_SCHEME,
    ENV_SEARCH_HOST,
    ENV_SUBSCRIPTION_IDENTIFIER,
    ENV_SUBSCRIPTION_KEY,
    ENV_SNAPSHOT_DIR,
    ENV_SELECTOR,
    ENV_AUTO_SWITCH,
    ENV_MANUAL_IDENTIFIER,
    ENV_MANUAL_KEY,
    ENV_MANUAL_CORE_NAME,
    ENV_SITE_NAME,
    ENV_SITE_ENVIRONMENT,
    ENV_SITE_BLOCKED,
    ENV_SITE_MACHINE_NAME,
];

/// Parsed env overrides, secrets, and ambient identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendEnv {
    /// Scheme override.
    pub scheme: Option<Scheme>,
    /// Search host override.
    pub search_host: Option<Box<str>>,
    /// Subscription identifier override.
    pub subscription_identifier: Option<Box<str>>,
    /// Primary subscription key.
    pub subscription_key: Option<SecretString>,
    /// Snapshot directory override.
    pub snapshot_dir: Option<PathBuf>,
    /// Selector override.
    pub selector: Option<Box<str>>,
    /// Auto-switch override.
    pub auto_switch: Option<bool>,
    /// Manual identifier override.
    pub manual_identifier: Option<Box<str>>,
    /// Manual subscription key.
    pub manual_key: Option<SecretString>,
    /// Manual core name override.
    pub manual_core_name: Option<Box<str>>,
    /// Hosting site name.
    pub site_name: Option<Box<str>>,
    /// Hosting site environment.
    pub site_environment: Option<Box<str>>,
    /// Site blocked flag.
    pub site_blocked: Option<bool>,
    /// Site machine name.
    pub site_machine_name: Option<Box<str>>,
}

impl BackendEnv {
    /// Parse env values from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            scheme: parse_optional_scheme(map, ENV_SCHEME)?,
            search_host: parse_optional_trimmed_string(map, ENV_SEARCH_HOST)?,
            subscription_identifier: parse_optional_trimmed_string(
                map,
                ENV_SUBSCRIPTION_IDENTIFIER,
            )?,
            subscription_key: parse_optional_secret(map, ENV_SUBSCRIPTION_KEY)?,
            snapshot_dir: parse_optional_trimmed_string(map, ENV_SNAPSHOT_DIR)?
                .map(|value| PathBuf::from(&*value)),
            selector: parse_optional_trimmed_string(map, ENV_SELECTOR)?,
            auto_switch: parse_optional_bool(map, ENV_AUTO_SWITCH)?,
            manual_identifier: parse_optional_trimmed_string(map, ENV_MANUAL_IDENTIFIER)?,
            manual_key: parse_optional_secret(map, ENV_MANUAL_KEY)?,
            manual_core_name: parse_optional_trimmed_string(map, ENV_MANUAL_CORE_NAME)?,
            site_name: parse_optional_ambient(map, ENV_SITE_NAME),
            site_environment: parse_optional_ambient(map, ENV_SITE_ENVIRONMENT),
            site_blocked: parse_optional_bool(map, ENV_SITE_BLOCKED)?,
            site_machine_name: parse_optional_ambient(map, ENV_SITE_MACHINE_NAME),
        })
    }

    /// Parse env values from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map = ALL_ENV_VARS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| ((*name).to_owned(), value))
            })
            .collect::<BTreeMap<_, _>>();
        Self::from_map(&map)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: BackendConfig,
    env: &BackendEnv,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let mut config = base;

    if let Some(scheme) = env.scheme {
        config.connection.scheme = scheme;
    }
    set_boxed(&mut config.connection.search_host, env.search_host.as_deref());
    set_optional(
        &mut config.subscription.identifier,
        env.subscription_identifier.as_deref(),
    );
    if let Some(dir) = &env.snapshot_dir {
        config.subscription.snapshot_dir.clone_from(dir);
    }
    set_optional(&mut config.overrides.selector, env.selector.as_deref());
    if let Some(enabled) = env.auto_switch {
        config.overrides.auto_switch = enabled;
    }
    set_optional(
        &mut config.overrides.manual_identifier,
        env.manual_identifier.as_deref(),
    );
    set_optional(
        &mut config.overrides.manual_core_name,
        env.manual_core_name.as_deref(),
    );

    config.validate_and_normalize().map_err(Into::into)
}

fn set_boxed(target: &mut Box<str>, value: Option<&str>) {
    if let Some(value) = value {
        *target = value.into();
    }
}

fn set_optional(target: &mut Option<Box<str>>, value: Option<&str>) {
    if let Some(value) = value {
        *target = Some(value.into());
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } | Self::EmptySecret { var } => {
                write!(formatter, "{var} must be non-empty")
            },
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidBool { var, value } | EnvParseError::InvalidEnum { var, value } => {
                envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", redact_value(var, &value))
            },
        }
    }
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED_VALUE.to_owned()
    } else {
        value.to_owned()
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

/// Ambient identity is set by the hosting platform; blank means absent.
fn parse_optional_ambient(map: &BTreeMap<String, String>, var: &'static str) -> Option<Box<str>> {
    map.get(var)
        .map(|raw| raw.trim())
        .filter(|trimmed| !trimmed.is_empty())
        .map(|trimmed| trimmed.to_owned().into_boxed_str())
}

fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }

    Ok(Some(SecretString::new(trimmed.to_owned())))
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: raw.clone(),
        }),
    }
}

fn parse_optional_scheme(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Scheme>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    raw.parse::<Scheme>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidEnum {
            var,
            value: raw.clone(),
        })
}
