//! Connection targets handed to the search client.

use crate::derived_key::DerivedKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path prefix for every core endpoint.
pub const CORE_PATH_PREFIX: &str = "/solr/";
/// Port used for `https`.
pub const HTTPS_PORT: u16 = 443;
/// Port used for every other scheme.
pub const HTTP_PORT: u16 = 80;

/// Transport scheme of the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// TLS.
    #[default]
    Https,
}

impl Scheme {
    /// Port implied by the scheme.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Https => HTTPS_PORT,
            Self::Http => HTTP_PORT,
        }
    }

    /// Lower-case scheme name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "https" => Ok(Self::Https),
            "http" => Ok(Self::Http),
            other => Err(format!("unsupported scheme `{other}`")),
        }
    }
}

/// Rule that produced a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionSource {
    /// Operator selected the core explicitly.
    Selected,
    /// Core matched the site environment.
    AutoDetected,
    /// Manual identifier/key/core triple.
    Manual,
    /// Nothing overridden.
    Default,
}

impl ResolutionSource {
    /// Stable lower-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::AutoDetected => "auto_detected",
            Self::Manual => "manual",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Fully resolved connection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Core the target points at.
    pub core_id: Box<str>,
    /// Backend host.
    pub host: Box<str>,
    /// Backend port.
    pub port: u16,
    /// Request path, always `/solr/{core_id}`.
    pub path: Box<str>,
    /// Derived key; `None` for the default core.
    pub derived_key: Option<DerivedKey>,
}

impl ResolvedTarget {
    /// Base URL of the core endpoint.
    #[must_use]
    pub fn endpoint(&self, scheme: Scheme) -> String {
        format!("{scheme}://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Combine a chosen core with transport details.
#[must_use]
pub fn assemble_target(
    scheme: Scheme,
    core_id: &str,
    derived_key: Option<DerivedKey>,
    host: &str,
) -> ResolvedTarget {
    ResolvedTarget {
        core_id: core_id.into(),
        host: host.into(),
        port: scheme.default_port(),
        path: format!("{CORE_PATH_PREFIX}{core_id}").into_boxed_str(),
        derived_key,
    }
}
