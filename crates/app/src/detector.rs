//! Match the hosting environment to a core.

use solr_multisub_domain::{CoreInfo, SubscriptionDescriptor};

/// Site identity supplied by the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientEnvironment {
    /// Site name (`AH_SITE_NAME`).
    pub site_name: Option<Box<str>>,
    /// Site environment (`AH_SITE_ENVIRONMENT`), e.g. `prod`.
    pub site_environment: Option<Box<str>>,
}

impl AmbientEnvironment {
    /// Build from optional parts.
    pub fn new(site_name: Option<&str>, site_environment: Option<&str>) -> Self {
        Self {
            site_name: site_name.map(Into::into),
            site_environment: site_environment.map(Into::into),
        }
    }

    /// Trimmed environment, `None` when blank.
    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.site_environment
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Find the core whose balancer region matches the site environment.
///
/// Matching is on the trimmed, ASCII case-insensitive environment. Among
/// several matches a non-failover core wins, then descriptor order. An empty
/// environment or no match yields `None`.
#[must_use]
pub fn detect_environment_core<'a>(
    descriptor: &'a SubscriptionDescriptor,
    ambient: &AmbientEnvironment,
) -> Option<&'a CoreInfo> {
    let environment = ambient.environment()?;
    let mut matches = descriptor
        .cores()
        .iter()
        .filter(|core| core.region().eq_ignore_ascii_case(environment));

    let first = matches.next()?;
    if !first.is_failover() {
        return Some(first);
    }
    matches.find(|core| !core.is_failover()).or(Some(first))
}
