//! Operator override options.

use serde::{Deserialize, Serialize};
use solr_multisub_shared::SecretString;

/// Selector value meaning "use the manual triple instead of a listed core".
pub const SELECTOR_OTHER: &str = "other";

/// Override options that steer core selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideConfig {
    /// Explicit core id, [`SELECTOR_OTHER`], or unset.
    pub selector: Option<Box<str>>,
    /// Pick the core whose region matches the site environment.
    pub auto_switch_enabled: bool,
    /// Manual credentials; each part may be missing.
    pub manual: ManualCredentials,
}

impl OverrideConfig {
    /// Selector trimmed to `None` when blank.
    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        self.selector
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// True when the selector is the `"other"` sentinel.
    #[must_use]
    pub fn selects_other(&self) -> bool {
        self.selector() == Some(SELECTOR_OTHER)
    }
}

/// Manual identifier, key and core name, possibly partially filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualCredentials {
    /// Subscription identifier the manual core belongs to.
    pub identifier: Option<Box<str>>,
    /// Subscription key for that identifier.
    pub key: Option<SecretString>,
    /// Core name to connect to.
    pub core_name: Option<Box<str>>,
}

/// Which manual fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManualField {
    /// Subscription identifier.
    Identifier,
    /// Subscription key.
    Key,
    /// Core name.
    CoreName,
}

impl ManualField {
    /// Stable name used in error metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "manual_identifier",
            Self::Key => "manual_key",
            Self::CoreName => "manual_core_name",
        }
    }
}

impl ManualCredentials {
    /// Build a full triple.
    pub fn new(
        identifier: impl Into<Box<str>>,
        key: impl Into<SecretString>,
        core_name: impl Into<Box<str>>,
    ) -> Self {
        Self {
            identifier: Some(identifier.into()),
            key: Some(key.into()),
            core_name: Some(core_name.into()),
        }
    }

    /// Fields that are missing or blank, in declaration order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ManualField> {
        let mut missing = Vec::new();
        if non_blank(self.identifier.as_deref()).is_none() {
            missing.push(ManualField::Identifier);
        }
        if self.key.as_ref().is_none_or(SecretString::is_blank) {
            missing.push(ManualField::Key);
        }
        if non_blank(self.core_name.as_deref()).is_none() {
            missing.push(ManualField::CoreName);
        }
        missing
    }

    /// True when no manual field is filled in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == 3
    }

    /// Returns the trimmed triple when every part is present.
    #[must_use]
    pub fn complete(&self) -> Option<(&str, &SecretString, &str)> {
        let identifier = non_blank(self.identifier.as_deref())?;
        let key = self.key.as_ref().filter(|key| !key.is_blank())?;
        let core_name = non_blank(self.core_name.as_deref())?;
        Some((identifier, key, core_name))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
