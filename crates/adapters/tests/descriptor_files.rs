//! Integration tests for the descriptor file source and snapshot cache.

use solr_multisub_adapters::{FileSubscriptionSource, SnapshotCache};
use solr_multisub_domain::parse_subscription_json;
use solr_multisub_ports::{SubscriptionRequest, SubscriptionSourcePort, SubscriptionStorePort};
use solr_multisub_shared::{ErrorEnvelope, Result, SecretString};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{nanos}"))
}

const DESCRIPTOR: &str = r#"{
  "identifier": "ABCD-12345",
  "key": "subscription-key",
  "derived_key_salt": "salt",
  "heartbeat_data": {
    "search_cores": [
      { "core_id": "ABCD-12345", "balancer": "useast1-c1.acquia-search.com" },
      { "core_id": "ABCD-12345.prod.mysite", "balancer": "prod-c3.acquia-search.com" }
    ]
  }
}"#;

#[tokio::test]
async fn reads_parses_and_publishes_descriptor() -> Result<()> {
    let dir = temp_dir("multisub-descriptors");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(ErrorEnvelope::from)?;
    tokio::fs::write(dir.join("ABCD-12345.json"), DESCRIPTOR)
        .await
        .map_err(ErrorEnvelope::from)?;

    let source = FileSubscriptionSource::new(&dir);
    let raw = source
        .fetch_raw(SubscriptionRequest::new(
            "ABCD-12345",
            SecretString::from("subscription-key"),
        ))
        .await?;
    let descriptor = parse_subscription_json(&raw).map_err(ErrorEnvelope::from)?;

    let cache = SnapshotCache::new();
    let published = cache.publish(descriptor);
    assert_eq!(published.cores().len(), 2);
    assert_eq!(
        cache.load("ABCD-12345").map(|snapshot| snapshot.cores().len()),
        Some(2)
    );

    tokio::fs::remove_dir_all(&dir)
        .await
        .map_err(ErrorEnvelope::from)?;
    Ok(())
}

#[tokio::test]
async fn invalid_json_surfaces_subscription_error() -> Result<()> {
    let dir = temp_dir("multisub-broken");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(ErrorEnvelope::from)?;
    tokio::fs::write(dir.join("ABCD-12345.json"), "{ not json")
        .await
        .map_err(ErrorEnvelope::from)?;

    let source = FileSubscriptionSource::new(&dir);
    let raw = source
        .fetch_raw(SubscriptionRequest::new("ABCD-12345", SecretString::from("k")))
        .await?;
    let envelope = parse_subscription_json(&raw).map_err(ErrorEnvelope::from);
    assert!(matches!(&envelope, Err(error) if error.code.namespace() == "subscription"));

    tokio::fs::remove_dir_all(&dir)
        .await
        .map_err(ErrorEnvelope::from)?;
    Ok(())
}
