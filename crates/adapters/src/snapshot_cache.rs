//! Copy-on-refresh snapshot store backed by `arc-swap`.

use arc_swap::ArcSwap;
use solr_multisub_domain::SubscriptionDescriptor;
use solr_multisub_ports::SubscriptionStorePort;
use std::collections::BTreeMap;
use std::sync::Arc;

type SnapshotMap = BTreeMap<Box<str>, Arc<SubscriptionDescriptor>>;

/// In-process snapshot store.
///
/// Readers load the current map without locking. Publishing builds a new map
/// and swaps it in, so an `Arc` handed out earlier is never mutated.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    snapshots: ArcSwap<SnapshotMap>,
}

impl SnapshotCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers with a published snapshot, sorted.
    #[must_use]
    pub fn identifiers(&self) -> Vec<Box<str>> {
        self.snapshots.load().keys().cloned().collect()
    }

    /// Number of published snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.load().len()
    }

    /// True when nothing has been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.load().is_empty()
    }
}

impl SubscriptionStorePort for SnapshotCache {
    fn load(&self, identifier: &str) -> Option<Arc<SubscriptionDescriptor>> {
        self.snapshots.load().get(identifier).cloned()
    }

    fn publish(&self, descriptor: SubscriptionDescriptor) -> Arc<SubscriptionDescriptor> {
        let snapshot = Arc::new(descriptor);
        let identifier: Box<str> = snapshot.identifier().into();
        self.snapshots.rcu(|current| {
            let mut next = SnapshotMap::clone(current);
            next.insert(identifier.clone(), Arc::clone(&snapshot));
            next
        });
        snapshot
    }
}
