//! Refresh and resolution wired through the real adapters.

use serde_json::json;
use solr_multisub_adapters::{JsonLogger, MemoryLogSink, SnapshotCache};
use solr_multisub_app::{
    AmbientEnvironment, RefreshOutcome, RefreshSkipReason, RefreshSubscriptionDeps,
    RefreshSubscriptionInput, ResolveConnectionDeps, ResolveConnectionInput, SiteIdentity,
    refresh_subscription, resolve_connection,
};
use solr_multisub_domain::{OverrideConfig, ResolutionSource};
use solr_multisub_ports::{
    BoxFuture, LogLevel, SubscriptionRequest, SubscriptionSourcePort, SubscriptionStorePort,
};
use solr_multisub_shared::{ErrorCode, ErrorEnvelope, Result, SecretString};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct StaticSource {
    payload: Option<String>,
    calls: AtomicUsize,
}

impl StaticSource {
    fn new(payload: Option<String>) -> Self {
        Self {
            payload,
            calls: AtomicUsize::new(0),
        }
    }
}

impl SubscriptionSourcePort for StaticSource {
    fn fetch_raw(&self, _request: SubscriptionRequest) -> BoxFuture<'_, Result<Box<str>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let payload = self.payload.clone();
        Box::pin(async move {
            payload.map(String::into_boxed_str).ok_or_else(|| {
                ErrorEnvelope::expected(
                    ErrorCode::new("subscription_source", "not_found"),
                    "nothing to fetch",
                )
            })
        })
    }
}

fn descriptor_json(core_suffix: &str) -> String {
    json!({
        "identifier": "ABCD-12345",
        "key": "subscription-key",
        "derived_key_salt": "salt",
        "heartbeat_data": {
            "search_cores": [
                { "core_id": "ABCD-12345", "balancer": "useast1-c1.acquia-search.com" },
                { "core_id": format!("ABCD-12345.prod.{core_suffix}"), "balancer": "prod-c3.acquia-search.com" }
            ]
        }
    })
    .to_string()
}

fn named_site() -> SiteIdentity {
    SiteIdentity {
        site_name: Some("mysite".into()),
        machine_name: None,
        blocked: false,
    }
}

fn refresh_input(identity: SiteIdentity) -> RefreshSubscriptionInput {
    RefreshSubscriptionInput {
        identity,
        identifier: "ABCD-12345".into(),
        key: SecretString::from("subscription-key"),
    }
}

#[tokio::test]
async fn refresh_publishes_and_resolution_uses_snapshot() -> Result<()> {
    let store = Arc::new(SnapshotCache::new());
    let deps = RefreshSubscriptionDeps {
        source: Arc::new(StaticSource::new(Some(descriptor_json("mysite")))),
        store: store.clone(),
        logger: None,
    };

    let outcome = refresh_subscription(&deps, refresh_input(named_site())).await?;
    assert!(matches!(outcome, RefreshOutcome::Refreshed { .. }));

    let primary = store
        .load("ABCD-12345")
        .ok_or_else(|| ErrorEnvelope::expected(ErrorCode::not_found(), "snapshot missing"))?;
    let input = ResolveConnectionInput {
        overrides: OverrideConfig {
            auto_switch_enabled: true,
            ..OverrideConfig::default()
        },
        ambient: AmbientEnvironment::new(Some("mysite"), Some("prod")),
        default_host: "search.acquia.com".into(),
        ..ResolveConnectionInput::default()
    };
    let resolution = resolve_connection(&ResolveConnectionDeps::default(), &primary, &input)
        .map_err(ErrorEnvelope::from)?;

    assert_eq!(resolution.source, ResolutionSource::AutoDetected);
    assert_eq!(&*resolution.target.core_id, "ABCD-12345.prod.mysite");
    assert_eq!(&*resolution.target.host, "prod-c3.acquia-search.com");
    assert_eq!(&*resolution.target.path, "/solr/ABCD-12345.prod.mysite");
    Ok(())
}

#[tokio::test]
async fn in_flight_reader_keeps_old_snapshot() -> Result<()> {
    let store = Arc::new(SnapshotCache::new());
    let first = RefreshSubscriptionDeps {
        source: Arc::new(StaticSource::new(Some(descriptor_json("one")))),
        store: store.clone(),
        logger: None,
    };
    refresh_subscription(&first, refresh_input(named_site())).await?;
    let held = store.load("ABCD-12345");

    let second = RefreshSubscriptionDeps {
        source: Arc::new(StaticSource::new(Some(descriptor_json("two")))),
        store: store.clone(),
        logger: None,
    };
    refresh_subscription(&second, refresh_input(named_site())).await?;

    let held_ids: Vec<String> = held
        .iter()
        .flat_map(|snapshot| snapshot.cores().iter().map(|core| core.core_id().to_owned()))
        .collect();
    assert!(held_ids.contains(&"ABCD-12345.prod.one".to_owned()));

    let fresh = store.load("ABCD-12345");
    let fresh_has_two = fresh
        .as_ref()
        .is_some_and(|snapshot| snapshot.find_core("ABCD-12345.prod.two").is_some());
    assert!(fresh_has_two);
    Ok(())
}

#[tokio::test]
async fn blocked_and_anonymous_sites_never_fetch() -> Result<()> {
    let source = Arc::new(StaticSource::new(Some(descriptor_json("mysite"))));
    let store = Arc::new(SnapshotCache::new());
    let deps = RefreshSubscriptionDeps {
        source: source.clone(),
        store: store.clone(),
        logger: None,
    };

    let blocked = SiteIdentity {
        blocked: true,
        ..named_site()
    };
    let outcome = refresh_subscription(&deps, refresh_input(blocked)).await?;
    assert_eq!(
        outcome,
        RefreshOutcome::Skipped {
            reason: RefreshSkipReason::SiteBlocked
        }
    );

    let outcome = refresh_subscription(&deps, refresh_input(SiteIdentity::default())).await?;
    assert_eq!(
        outcome,
        RefreshOutcome::Skipped {
            reason: RefreshSkipReason::AnonymousSite
        }
    );

    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert!(store.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot_and_logs() -> Result<()> {
    let store = Arc::new(SnapshotCache::new());
    let good = RefreshSubscriptionDeps {
        source: Arc::new(StaticSource::new(Some(descriptor_json("mysite")))),
        store: store.clone(),
        logger: None,
    };
    refresh_subscription(&good, refresh_input(named_site())).await?;

    let sink = Arc::new(MemoryLogSink::default());
    let broken = RefreshSubscriptionDeps {
        source: Arc::new(StaticSource::new(Some("{\"identifier\": 7}".to_owned()))),
        store: store.clone(),
        logger: Some(Arc::new(
            JsonLogger::new(sink.clone()).with_min_level(LogLevel::Debug),
        )),
    };
    let result = refresh_subscription(&broken, refresh_input(named_site())).await;
    assert!(matches!(&result, Err(error) if error.code.namespace() == "subscription"));
    assert!(store.load("ABCD-12345").is_some());

    let lines = sink.take();
    assert!(
        lines
            .iter()
            .any(|line| line.contains("backend.refreshSubscription.failed"))
    );
    assert!(lines.iter().all(|line| !line.contains("subscription-key")));
    Ok(())
}
