//! Subscription snapshot boundary contracts.

use crate::BoxFuture;
use solr_multisub_domain::SubscriptionDescriptor;
use solr_multisub_shared::{Result, SecretString};
use std::sync::Arc;

/// What a source needs to fetch one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    /// Subscription identifier.
    pub identifier: Box<str>,
    /// Subscription key, for sources that authenticate.
    pub key: SecretString,
}

impl SubscriptionRequest {
    /// Build a request.
    pub fn new(identifier: impl Into<Box<str>>, key: SecretString) -> Self {
        Self {
            identifier: identifier.into(),
            key,
        }
    }
}

/// Boundary contract for fetching raw descriptor payloads.
pub trait SubscriptionSourcePort: Send + Sync {
    /// Fetch the raw JSON descriptor text for a subscription.
    fn fetch_raw(&self, request: SubscriptionRequest) -> BoxFuture<'_, Result<Box<str>>>;
}

/// Boundary contract for the copy-on-refresh snapshot store.
///
/// Published snapshots are never mutated. Readers holding an `Arc` keep a
/// consistent view while a refresh replaces the entry.
pub trait SubscriptionStorePort: Send + Sync {
    /// Current snapshot for an identifier, if one was published.
    fn load(&self, identifier: &str) -> Option<Arc<SubscriptionDescriptor>>;

    /// Replace the snapshot stored under the descriptor's identifier.
    fn publish(&self, descriptor: SubscriptionDescriptor) -> Arc<SubscriptionDescriptor>;
}
