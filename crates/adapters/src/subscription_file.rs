//! Subscription source that reads descriptor files from a directory.

use solr_multisub_ports::{BoxFuture, SubscriptionRequest, SubscriptionSourcePort};
use solr_multisub_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use std::path::{Path, PathBuf};

const DESCRIPTOR_FILE_EXT: &str = "json";

/// Reads `<dir>/<identifier>.json`.
///
/// The subscription key is not used; the directory is trusted local state
/// written by whatever syncs descriptors from the service.
#[derive(Debug, Clone)]
pub struct FileSubscriptionSource {
    dir: PathBuf,
}

impl FileSubscriptionSource {
    /// Create a source rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the source reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the descriptor file for an identifier.
    pub fn descriptor_path(&self, identifier: &str) -> Result<PathBuf> {
        Ok(self.dir.join(descriptor_file_name(identifier)?))
    }
}

/// `<identifier>.json`, refusing identifiers that would escape the directory.
pub(crate) fn descriptor_file_name(identifier: &str) -> Result<String> {
    let identifier = identifier.trim();
    let safe = !identifier.is_empty()
        && identifier
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        && !identifier.starts_with('.');
    if !safe {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("subscription_source", "invalid_identifier"),
            "subscription identifier cannot be used as a file name",
        )
        .with_metadata("identifier", identifier));
    }
    Ok(format!("{identifier}.{DESCRIPTOR_FILE_EXT}"))
}

impl SubscriptionSourcePort for FileSubscriptionSource {
    fn fetch_raw(&self, request: SubscriptionRequest) -> BoxFuture<'_, Result<Box<str>>> {
        Box::pin(async move {
            let path = self.descriptor_path(&request.identifier)?;
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => Ok(text.into_boxed_str()),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                    Err(ErrorEnvelope::expected(
                        ErrorCode::new("subscription_source", "not_found"),
                        "no descriptor file for subscription",
                    )
                    .with_metadata("identifier", &*request.identifier)
                    .with_metadata("path", path.to_string_lossy()))
                },
                Err(error) => Err(ErrorEnvelope::unexpected(
                    ErrorCode::new("subscription_source", "read_failed"),
                    format!("failed to read descriptor file: {error}"),
                    ErrorClass::Retriable,
                )
                .with_metadata("path", path.to_string_lossy())),
            }
        })
    }
}
