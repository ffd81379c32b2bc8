//! Read-only summary of the selection settings.

use serde::Serialize;
use solr_multisub_domain::{CoreInfo, OverrideConfig, SELECTOR_OTHER, SubscriptionDescriptor};

/// What an operator sees when choosing a core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSummary {
    /// Subscription the options come from.
    pub identifier: Box<str>,
    /// Auto-switch is on.
    pub auto_detection_enabled: bool,
    /// Current selector, if any.
    pub selector: Option<Box<str>>,
    /// `"other"` followed by every core id in descriptor order.
    pub selector_options: Vec<Box<str>>,
    /// Region of the first failover core.
    pub failover_region: Option<Box<str>>,
    /// Fewer than two cores are available, so switching has no effect.
    pub single_core_warning: bool,
}

/// Summarize the options for a descriptor and the current overrides.
#[must_use]
pub fn describe_settings(
    descriptor: &SubscriptionDescriptor,
    overrides: &OverrideConfig,
) -> SettingsSummary {
    let selector_options = std::iter::once(SELECTOR_OTHER)
        .chain(descriptor.cores().iter().map(CoreInfo::core_id))
        .map(Into::into)
        .collect();

    SettingsSummary {
        identifier: descriptor.identifier().into(),
        auto_detection_enabled: overrides.auto_switch_enabled,
        selector: overrides.selector().map(Into::into),
        selector_options,
        failover_region: descriptor
            .failover_region()
            .filter(|region| !region.is_empty())
            .map(Into::into),
        single_core_warning: descriptor.cores().len() < 2,
    }
}
