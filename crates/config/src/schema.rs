//! Backend configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims strings and turns blank optional values into `None`.
//!
//! Secrets never live here; they are read from env only.

use serde::{Deserialize, Serialize};
use solr_multisub_domain::Scheme;
use solr_multisub_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Search host used when a core's balancer is unknown.
pub const DEFAULT_SEARCH_HOST: &str = "search.acquia.com";

/// Directory holding cached subscription descriptors.
pub const DEFAULT_SNAPSHOT_DIR: &str = ".multisub/subscriptions";

/// Top-level backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BackendConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Transport settings.
    pub connection: ConnectionConfig,
    /// Which subscription to resolve against.
    pub subscription: SubscriptionConfig,
    /// Operator override options.
    pub overrides: OverridesConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            connection: ConnectionConfig::default(),
            subscription: SubscriptionConfig::default(),
            overrides: OverridesConfig::default(),
        }
    }
}

impl BackendConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedBackendConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }

        self.connection.normalize_and_validate()?;
        self.subscription.normalize_and_validate()?;
        self.overrides.normalize();

        Ok(ValidatedBackendConfig { raw: self })
    }
}

/// Validated config wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBackendConfig {
    raw: BackendConfig,
}

impl ValidatedBackendConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &BackendConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> BackendConfig {
        self.raw
    }
}

impl AsRef<BackendConfig> for ValidatedBackendConfig {
    fn as_ref(&self) -> &BackendConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedBackendConfig {
    type Target = BackendConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ConnectionConfig {
    /// `https` (port 443) or `http` (port 80).
    pub scheme: Scheme,
    /// Host used when the chosen core has no known balancer.
    pub search_host: Box<str>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Https,
            search_host: DEFAULT_SEARCH_HOST.into(),
        }
    }
}

impl ConnectionConfig {
    fn normalize_and_validate(&mut self) -> Result<(), ConfigSchemaError> {
        let host = self.search_host.trim();
        if host.is_empty() {
            return Err(ConfigSchemaError::EmptyField {
                section: "connection",
                field: "searchHost",
            });
        }
        if !is_bare_host(host) {
            return Err(ConfigSchemaError::InvalidSearchHost {
                value: host.to_owned(),
            });
        }
        self.search_host = host.to_ascii_lowercase().into_boxed_str();
        Ok(())
    }
}

/// A search host must be a hostname with no scheme, port, path or credentials.
fn is_bare_host(host: &str) -> bool {
    let Ok(parsed) = Url::parse(&format!("https://{host}")) else {
        return false;
    };
    parsed
        .host_str()
        .is_some_and(|parsed_host| parsed_host.eq_ignore_ascii_case(host))
        && parsed.port().is_none()
        && parsed.path() == "/"
        && parsed.username().is_empty()
}

/// Subscription selection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SubscriptionConfig {
    /// Primary subscription identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Box<str>>,
    /// Directory of cached `<identifier>.json` descriptors.
    pub snapshot_dir: PathBuf,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            identifier: None,
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
        }
    }
}

impl SubscriptionConfig {
    fn normalize_and_validate(&mut self) -> Result<(), ConfigSchemaError> {
        self.identifier = normalize_optional(self.identifier.take());
        if self.snapshot_dir.as_os_str().is_empty() {
            return Err(ConfigSchemaError::EmptyField {
                section: "subscription",
                field: "snapshotDir",
            });
        }
        Ok(())
    }
}

/// Override options, minus the manual key (env only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct OverridesConfig {
    /// Explicit core id or `"other"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Box<str>>,
    /// Match the core to the site environment.
    pub auto_switch: bool,
    /// Manual subscription identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_identifier: Option<Box<str>>,
    /// Manual core name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_core_name: Option<Box<str>>,
}

impl OverridesConfig {
    fn normalize(&mut self) {
        self.selector = normalize_optional(self.selector.take());
        self.manual_identifier = normalize_optional(self.manual_identifier.take());
        self.manual_core_name = normalize_optional(self.manual_core_name.take());
    }
}

fn normalize_optional(value: Option<Box<str>>) -> Option<Box<str>> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
        .map(String::into_boxed_str)
}

/// Parse a backend config from a JSON string, applying validation and normalization.
pub fn parse_backend_config_json(input: &str) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config: BackendConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a backend config from a TOML string, applying validation and normalization.
pub fn parse_backend_config_toml(input: &str) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config: BackendConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Schema validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A required value is blank.
    EmptyField {
        /// Schema section (e.g. `connection`).
        section: &'static str,
        /// Field name in the config file (e.g. `searchHost`).
        field: &'static str,
    },
    /// The search host is not a bare hostname.
    InvalidSearchHost {
        /// Trimmed value that failed validation.
        value: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::EmptyField { .. } => ErrorCode::new("config", "empty_field"),
            Self::InvalidSearchHost { .. } => ErrorCode::new("config", "invalid_search_host"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "config version {found} is not supported (expected {supported})"
            ),
            Self::EmptyField { section, field } => {
                write!(formatter, "{section}.{field} must be non-empty")
            },
            Self::InvalidSearchHost { .. } => formatter
                .write_str("connection.searchHost must be a hostname without scheme, port or path"),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::EmptyField { section, field } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field),
            ConfigSchemaError::InvalidSearchHost { value } => envelope
                .with_metadata("section", "connection")
                .with_metadata("field", "searchHost")
                .with_metadata("value", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() -> Result<(), ConfigSchemaError> {
        let config = BackendConfig::default().validate_and_normalize()?;
        assert_eq!(config.connection.scheme, Scheme::Https);
        assert_eq!(&*config.connection.search_host, DEFAULT_SEARCH_HOST);
        assert!(config.subscription.identifier.is_none());
        assert!(!config.overrides.auto_switch);
        Ok(())
    }

    #[test]
    fn blank_optionals_become_none() -> Result<(), ConfigSchemaError> {
        let mut config = BackendConfig::default();
        config.overrides.selector = Some("  ".into());
        config.overrides.manual_core_name = Some(" ABC.dev ".into());
        config.subscription.identifier = Some("".into());

        let config = config.validate_and_normalize()?;
        assert!(config.overrides.selector.is_none());
        assert_eq!(config.overrides.manual_core_name.as_deref(), Some("ABC.dev"));
        assert!(config.subscription.identifier.is_none());
        Ok(())
    }

    #[test]
    fn rejects_search_host_with_scheme_or_path() {
        for bad in ["https://search.example.com", "search.example.com/solr", "h:8983"] {
            let mut config = BackendConfig::default();
            config.connection.search_host = bad.into();
            assert!(
                matches!(
                    config.validate_and_normalize(),
                    Err(ConfigSchemaError::InvalidSearchHost { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unknown_version() {
        let config = BackendConfig {
            version: 9,
            ..BackendConfig::default()
        };
        let error = config.validate_and_normalize().err();
        assert_eq!(
            error,
            Some(ConfigSchemaError::UnsupportedVersion {
                found: 9,
                supported: CURRENT_CONFIG_VERSION,
            })
        );
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let result = parse_backend_config_json(r#"{ "connection": { "port": 8983 } }"#);
        assert!(matches!(result, Err(ref error) if error.has_code("config", "invalid_json")));
    }
}
