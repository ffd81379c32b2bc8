//! # solr-multisub-adapters
//!
//! Adapter implementations for ports (logging, descriptor files, snapshot stores).
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod log_sink;
pub mod logger;
pub mod snapshot_cache;
pub mod snapshot_file;
pub mod subscription_file;
pub mod tracing_logger;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use snapshot_cache::SnapshotCache;
pub use snapshot_file::{FileSnapshotStore, PUBLISHED_SNAPSHOT_DIR};
pub use subscription_file::FileSubscriptionSource;
pub use tracing_logger::TracingLogger;
