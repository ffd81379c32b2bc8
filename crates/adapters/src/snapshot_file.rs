//! Snapshot store that keeps published descriptors on disk.

use crate::snapshot_cache::SnapshotCache;
use crate::subscription_file::descriptor_file_name;
use solr_multisub_domain::{SubscriptionDescriptor, parse_subscription_json};
use solr_multisub_ports::SubscriptionStorePort;
use solr_multisub_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory under the snapshot dir that holds published snapshots.
pub const PUBLISHED_SNAPSHOT_DIR: &str = "published";

const TEMP_FILE_EXT: &str = "tmp";

/// In-process cache backed by `<root>/<identifier>.json` files.
///
/// `publish` only swaps the in-memory entry; `persist` writes a published
/// snapshot to disk so a later process sees it through `ensure_loaded`.
#[derive(Debug)]
pub struct FileSnapshotStore {
    root: PathBuf,
    cache: SnapshotCache,
}

impl FileSnapshotStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: SnapshotCache::new(),
        }
    }

    /// Store rooted at the published directory under `snapshot_dir`.
    #[must_use]
    pub fn under_snapshot_dir(snapshot_dir: &Path) -> Self {
        Self::new(snapshot_dir.join(PUBLISHED_SNAPSHOT_DIR))
    }

    /// Directory snapshots are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the published snapshot for an identifier.
    pub fn snapshot_path(&self, identifier: &str) -> Result<PathBuf> {
        Ok(self.root.join(descriptor_file_name(identifier)?))
    }

    /// Return the snapshot for `identifier`, reading the published file when
    /// nothing is cached yet. `None` when no snapshot was ever persisted.
    pub async fn ensure_loaded(
        &self,
        identifier: &str,
    ) -> Result<Option<Arc<SubscriptionDescriptor>>> {
        if let Some(snapshot) = self.cache.load(identifier.trim()) {
            return Ok(Some(snapshot));
        }

        let path = self.snapshot_path(identifier)?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(snapshot_error("read_failed", "failed to read snapshot", &error)
                    .with_metadata("path", path.to_string_lossy()));
            },
        };
        let descriptor = parse_subscription_json(&text)
            .map_err(|error| ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy()))?;
        descriptor
            .ensure_identifier(identifier)
            .map_err(|error| ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy()))?;
        Ok(Some(self.cache.publish(descriptor)))
    }

    /// Write a snapshot to disk, replacing any earlier file in one rename.
    pub async fn persist(&self, snapshot: &SubscriptionDescriptor) -> Result<PathBuf> {
        let path = self.snapshot_path(snapshot.identifier())?;
        let temp_path = path.with_extension(format!("json.{TEMP_FILE_EXT}"));
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(ErrorEnvelope::from)?;

        let payload = serde_json::to_vec_pretty(&snapshot.to_json()).map_err(|error| {
            snapshot_error("serialize_failed", "failed to serialize snapshot", &error)
        })?;
        tokio::fs::write(&temp_path, payload)
            .await
            .map_err(|error| {
                snapshot_error("write_failed", "failed to write snapshot", &error)
                    .with_metadata("path", temp_path.to_string_lossy())
            })?;
        tokio::fs::rename(&temp_path, &path).await.map_err(|error| {
            snapshot_error("write_failed", "failed to replace snapshot", &error)
                .with_metadata("path", path.to_string_lossy())
        })?;
        Ok(path)
    }
}

impl SubscriptionStorePort for FileSnapshotStore {
    fn load(&self, identifier: &str) -> Option<Arc<SubscriptionDescriptor>> {
        self.cache.load(identifier)
    }

    fn publish(&self, descriptor: SubscriptionDescriptor) -> Arc<SubscriptionDescriptor> {
        self.cache.publish(descriptor)
    }
}

fn snapshot_error(code: &'static str, message: &str, error: &impl std::error::Error) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("snapshot_store", code),
        format!("{message}: {error}"),
        ErrorClass::NonRetriable,
    )
}
