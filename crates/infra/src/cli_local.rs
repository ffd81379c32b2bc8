//! Local CLI orchestration helpers.

use crate::composition::{ambient_environment, override_config, site_identity};
use crate::config_check::LoadedConfig;
use crate::{InfraError, InfraResult};
use solr_multisub_adapters::{FileSnapshotStore, FileSubscriptionSource};
use solr_multisub_app::{
    ConnectionResolution, RefreshOutcome, RefreshSubscriptionDeps, RefreshSubscriptionInput,
    ResolveConnectionDeps, ResolveConnectionInput, SettingsSummary, describe_settings,
    refresh_subscription, resolve_connection,
};
use solr_multisub_domain::{Scheme, SubscriptionDescriptor, parse_subscription_json};
use solr_multisub_ports::{
    LoggerPort, SubscriptionRequest, SubscriptionSourcePort, SubscriptionStorePort, log_fields,
};
use solr_multisub_shared::{ErrorCode, ErrorEnvelope, SecretString};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of the resolve command.
#[derive(Debug, Clone)]
pub struct ResolveReport {
    /// Subscription the snapshot came from.
    pub identifier: Box<str>,
    /// Scheme used for the endpoint.
    pub scheme: Scheme,
    /// Resolution result.
    pub resolution: ConnectionResolution,
}

impl ResolveReport {
    /// Base URL of the resolved core.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.resolution.target.endpoint(self.scheme)
    }
}

/// Result of the refresh command.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    /// Subscription that was refreshed.
    pub identifier: Box<str>,
    /// What happened.
    pub outcome: RefreshOutcome,
    /// File the refreshed snapshot was written to.
    pub published_path: Option<PathBuf>,
}

/// Resolve the connection target from the local descriptor files.
///
/// A snapshot published by `refresh` takes precedence over the raw
/// descriptor file.
pub fn run_resolve_local(
    loaded: &LoadedConfig,
    logger: Option<Arc<dyn LoggerPort>>,
) -> InfraResult<ResolveReport> {
    let identifier = required_identifier(loaded)?;
    let source = FileSubscriptionSource::new(loaded.config.subscription.snapshot_dir.clone());
    let store = FileSnapshotStore::under_snapshot_dir(&loaded.config.subscription.snapshot_dir);
    let overrides = override_config(&loaded.config, &loaded.env);

    let manual_identifier = overrides
        .manual
        .identifier
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != &*identifier)
        .map(Box::<str>::from);

    let (primary, manual_snapshot) = run_async(async {
        let primary = load_snapshot(&source, &store, &identifier).await?;
        let manual_snapshot = match manual_identifier.as_deref() {
            Some(manual) => load_optional_snapshot(&source, &store, manual).await?,
            None => None,
        };
        Ok((primary, manual_snapshot))
    })?;

    let input = ResolveConnectionInput {
        manual_snapshot,
        overrides,
        ambient: ambient_environment(&loaded.env),
        scheme: loaded.config.connection.scheme,
        default_host: loaded.config.connection.search_host.clone(),
    };
    let deps = ResolveConnectionDeps { logger };
    let resolution = resolve_connection(&deps, &primary, &input).map_err(ErrorEnvelope::from)?;

    Ok(ResolveReport {
        identifier,
        scheme: input.scheme,
        resolution,
    })
}

/// Summarize the selection settings for the configured subscription.
pub fn run_settings_local(loaded: &LoadedConfig) -> InfraResult<SettingsSummary> {
    let identifier = required_identifier(loaded)?;
    let source = FileSubscriptionSource::new(loaded.config.subscription.snapshot_dir.clone());
    let store = FileSnapshotStore::under_snapshot_dir(&loaded.config.subscription.snapshot_dir);
    let snapshot = run_async(load_snapshot(&source, &store, &identifier))?;
    let overrides = override_config(&loaded.config, &loaded.env);
    Ok(describe_settings(&snapshot, &overrides))
}

/// Refresh the configured subscription snapshot and persist it for later
/// resolve and settings runs.
pub fn run_refresh_local(
    loaded: &LoadedConfig,
    logger: Option<Arc<dyn LoggerPort>>,
) -> InfraResult<RefreshReport> {
    let identifier = required_identifier(loaded)?;
    let key = loaded.env.subscription_key.clone().ok_or_else(|| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "missing_subscription_key"),
            "MULTISUB_SUBSCRIPTION_KEY is required for refresh",
        )
    })?;

    let snapshot_dir = &loaded.config.subscription.snapshot_dir;
    let store = Arc::new(FileSnapshotStore::under_snapshot_dir(snapshot_dir));
    let deps = RefreshSubscriptionDeps {
        source: Arc::new(FileSubscriptionSource::new(snapshot_dir.clone())),
        store: store.clone(),
        logger,
    };
    let input = RefreshSubscriptionInput {
        identity: site_identity(&loaded.env),
        identifier: identifier.clone(),
        key,
    };
    let (outcome, published_path) = run_async(async {
        let outcome = refresh_subscription(&deps, input).await?;
        let published_path = match &outcome {
            RefreshOutcome::Refreshed { snapshot } => {
                let path = store.persist(snapshot).await?;
                if let Some(logger) = deps.logger.as_ref() {
                    logger.info(
                        "backend.refreshSubscription.persisted",
                        "Subscription snapshot written",
                        log_fields([
                            ("identifier", snapshot.identifier().to_owned()),
                            ("path", path.to_string_lossy().into_owned()),
                        ]),
                    );
                }
                Some(path)
            },
            RefreshOutcome::Skipped { .. } => None,
        };
        Ok((outcome, published_path))
    })?;
    Ok(RefreshReport {
        identifier,
        outcome,
        published_path,
    })
}

fn required_identifier(loaded: &LoadedConfig) -> InfraResult<Box<str>> {
    loaded.config.subscription.identifier.clone().ok_or_else(|| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "missing_identifier"),
            "subscription identifier is not configured",
        )
        .with_metadata("section", "subscription")
        .with_metadata("field", "identifier")
    })
}

async fn load_snapshot(
    source: &dyn SubscriptionSourcePort,
    store: &FileSnapshotStore,
    identifier: &str,
) -> InfraResult<Arc<SubscriptionDescriptor>> {
    if let Some(snapshot) = store.ensure_loaded(identifier).await? {
        return Ok(snapshot);
    }
    let raw = source
        .fetch_raw(SubscriptionRequest::new(identifier, SecretString::default()))
        .await?;
    let descriptor = parse_subscription_json(&raw).map_err(ErrorEnvelope::from)?;
    descriptor
        .ensure_identifier(identifier)
        .map_err(ErrorEnvelope::from)?;
    Ok(store.publish(descriptor))
}

async fn load_optional_snapshot(
    source: &dyn SubscriptionSourcePort,
    store: &FileSnapshotStore,
    identifier: &str,
) -> InfraResult<Option<Arc<SubscriptionDescriptor>>> {
    match load_snapshot(source, store, identifier).await {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(error) if error.has_code("subscription_source", "not_found") => Ok(None),
        Err(error) => Err(error),
    }
}

fn run_async<F, T>(future: F) -> InfraResult<T>
where
    F: Future<Output = Result<T, ErrorEnvelope>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(future)
}
