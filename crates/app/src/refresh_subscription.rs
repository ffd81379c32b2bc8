//! Refresh a cached subscription snapshot.

use serde::Serialize;
use serde_json::Value;
use solr_multisub_domain::{SubscriptionDescriptor, parse_subscription_json};
use solr_multisub_ports::{
    LogFields, LoggerPort, SubscriptionRequest, SubscriptionSourcePort, SubscriptionStorePort,
    log_fields,
};
use solr_multisub_shared::{ErrorEnvelope, Result, SecretString};
use std::sync::Arc;
use std::time::Instant;

/// Identity of the running site, used to guard refreshes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteIdentity {
    /// Hosting platform site name.
    pub site_name: Option<Box<str>>,
    /// Machine name assigned at registration.
    pub machine_name: Option<Box<str>>,
    /// Site is blocked from talking to the service.
    pub blocked: bool,
}

impl SiteIdentity {
    fn skip_reason(&self) -> Option<RefreshSkipReason> {
        if self.blocked {
            return Some(RefreshSkipReason::SiteBlocked);
        }
        let named = [self.site_name.as_deref(), self.machine_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|value| !value.trim().is_empty());
        (!named).then_some(RefreshSkipReason::AnonymousSite)
    }
}

/// Why a refresh did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshSkipReason {
    /// The site is blocked.
    SiteBlocked,
    /// Neither a site name nor a machine name is known.
    AnonymousSite,
}

impl RefreshSkipReason {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SiteBlocked => "siteBlocked",
            Self::AnonymousSite => "anonymousSite",
        }
    }
}

/// Result of a refresh call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was published.
    Refreshed {
        /// The snapshot now held by the store.
        snapshot: Arc<SubscriptionDescriptor>,
    },
    /// The guard refused to refresh.
    Skipped {
        /// Why.
        reason: RefreshSkipReason,
    },
}

/// Input payload for refresh.
#[derive(Debug, Clone)]
pub struct RefreshSubscriptionInput {
    /// Site identity guard.
    pub identity: SiteIdentity,
    /// Subscription to refresh.
    pub identifier: Box<str>,
    /// Subscription key passed to the source.
    pub key: SecretString,
}

/// Dependencies required by refresh.
#[derive(Clone)]
pub struct RefreshSubscriptionDeps {
    /// Where raw descriptors come from.
    pub source: Arc<dyn SubscriptionSourcePort>,
    /// Where parsed snapshots are published.
    pub store: Arc<dyn SubscriptionStorePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Fetch, parse and publish a fresh snapshot.
///
/// A failed fetch or parse leaves the previously published snapshot in place.
pub async fn refresh_subscription(
    deps: &RefreshSubscriptionDeps,
    input: RefreshSubscriptionInput,
) -> Result<RefreshOutcome> {
    let started_at = Instant::now();

    if let Some(reason) = input.identity.skip_reason() {
        if let Some(logger) = deps.logger.as_ref() {
            logger.info(
                "backend.refreshSubscription.skipped",
                "Subscription refresh skipped",
                log_fields([
                    ("identifier", &*input.identifier),
                    ("reason", reason.as_str()),
                ]),
            );
        }
        return Ok(RefreshOutcome::Skipped { reason });
    }

    if let Some(logger) = deps.logger.as_ref() {
        logger.info(
            "backend.refreshSubscription.start",
            "Subscription refresh started",
            log_fields([("identifier", &*input.identifier)]),
        );
    }

    let identifier = input.identifier.clone();
    let result: Result<Arc<SubscriptionDescriptor>> = (async {
        let raw = deps
            .source
            .fetch_raw(SubscriptionRequest::new(input.identifier, input.key))
            .await?;
        let descriptor = parse_subscription_json(&raw).map_err(ErrorEnvelope::from)?;
        descriptor
            .ensure_identifier(&identifier)
            .map_err(ErrorEnvelope::from)?;
        Ok(deps.store.publish(descriptor))
    })
    .await;

    match result {
        Ok(snapshot) => {
            if let Some(logger) = deps.logger.as_ref() {
                logger.info(
                    "backend.refreshSubscription.completed",
                    "Subscription refresh completed",
                    log_fields_completed(&snapshot, started_at),
                );
            }
            Ok(RefreshOutcome::Refreshed { snapshot })
        },
        Err(error) => {
            if let Some(logger) = deps.logger.as_ref() {
                logger.error(
                    "backend.refreshSubscription.failed",
                    "Subscription refresh failed",
                    log_fields([
                        ("identifier", Value::from(&*identifier)),
                        ("errorCode", Value::from(error.code.to_string())),
                        ("durationMs", Value::from(duration_ms(started_at))),
                    ]),
                );
            }
            Err(error)
        },
    }
}

fn log_fields_completed(snapshot: &SubscriptionDescriptor, started_at: Instant) -> LogFields {
    log_fields([
        ("identifier", Value::from(snapshot.identifier())),
        ("cores", Value::from(snapshot.cores().len())),
        ("durationMs", Value::from(duration_ms(started_at))),
    ])
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(site: Option<&str>, machine: Option<&str>, blocked: bool) -> SiteIdentity {
        SiteIdentity {
            site_name: site.map(Into::into),
            machine_name: machine.map(Into::into),
            blocked,
        }
    }

    #[test]
    fn blocked_sites_are_skipped() {
        assert_eq!(
            identity(Some("site"), Some("machine"), true).skip_reason(),
            Some(RefreshSkipReason::SiteBlocked)
        );
    }

    #[test]
    fn anonymous_sites_are_skipped() {
        assert_eq!(
            identity(None, Some("  "), false).skip_reason(),
            Some(RefreshSkipReason::AnonymousSite)
        );
    }

    #[test]
    fn either_name_allows_refresh() {
        assert_eq!(identity(Some("site"), None, false).skip_reason(), None);
        assert_eq!(identity(None, Some("machine"), false).skip_reason(), None);
    }
}
