//! Resolve the connection target for the current site.
//!
//! Stages run in a fixed order and every transition is reported to the
//! optional logger:
//!
//! `start -> parseSubscription -> resolve -> (detect | deriveKey) -> assemble -> done`
//!
//! Any error stops the run; no partial target is produced.

use crate::detector::{AmbientEnvironment, detect_environment_core};
use crate::resolver::{ResolutionOutcome, resolve_outcome};
use serde_json::Value;
use solr_multisub_domain::{
    DerivedKey, InvalidCredentialError, OverrideConfig, ResolutionSource, ResolveError,
    ResolvedTarget, Scheme, SubscriptionDescriptor, assemble_target, derive_key,
    parse_subscription,
};
use solr_multisub_ports::{LogFields, LoggerPort, log_fields};
use solr_multisub_shared::{ErrorEnvelope, SecretString};
use std::sync::Arc;

/// Stages of a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    /// Nothing done yet.
    Start,
    /// Descriptor parsed or taken from the snapshot store.
    ParseSubscription,
    /// Override precedence applied.
    Resolve,
    /// Site environment matched against cores.
    Detect,
    /// Derived key computed.
    DeriveKey,
    /// Target assembled.
    Assemble,
    /// Finished.
    Done,
}

impl ResolutionStage {
    /// Stage name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ParseSubscription => "parseSubscription",
            Self::Resolve => "resolve",
            Self::Detect => "detect",
            Self::DeriveKey => "deriveKey",
            Self::Assemble => "assemble",
            Self::Done => "done",
        }
    }
}

/// Every stage in declaration order.
pub const RESOLUTION_STAGES: [ResolutionStage; 7] = [
    ResolutionStage::Start,
    ResolutionStage::ParseSubscription,
    ResolutionStage::Resolve,
    ResolutionStage::Detect,
    ResolutionStage::DeriveKey,
    ResolutionStage::Assemble,
    ResolutionStage::Done,
];

/// Allowed `(from, to)` transitions.
pub const RESOLUTION_TRANSITIONS: [(ResolutionStage, ResolutionStage); 9] = [
    (ResolutionStage::Start, ResolutionStage::ParseSubscription),
    (ResolutionStage::ParseSubscription, ResolutionStage::Resolve),
    (ResolutionStage::Resolve, ResolutionStage::Detect),
    (ResolutionStage::Resolve, ResolutionStage::DeriveKey),
    (ResolutionStage::Resolve, ResolutionStage::Assemble),
    (ResolutionStage::Detect, ResolutionStage::DeriveKey),
    (ResolutionStage::Detect, ResolutionStage::Assemble),
    (ResolutionStage::DeriveKey, ResolutionStage::Assemble),
    (ResolutionStage::Assemble, ResolutionStage::Done),
];

/// Returns true when `(from, to)` is an allowed transition.
#[must_use]
pub fn is_allowed_transition(from: ResolutionStage, to: ResolutionStage) -> bool {
    RESOLUTION_TRANSITIONS.contains(&(from, to))
}

/// Dependencies required by resolve-connection.
#[derive(Clone, Default)]
pub struct ResolveConnectionDeps {
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Everything a run needs besides the primary snapshot.
#[derive(Debug, Clone, Default)]
pub struct ResolveConnectionInput {
    /// Snapshot for the manual identifier, when it differs from the primary.
    pub manual_snapshot: Option<Arc<SubscriptionDescriptor>>,
    /// Operator overrides.
    pub overrides: OverrideConfig,
    /// Hosting platform identity.
    pub ambient: AmbientEnvironment,
    /// Transport scheme.
    pub scheme: Scheme,
    /// Host used when the chosen core has no known balancer.
    pub default_host: Box<str>,
}

/// Target plus the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionResolution {
    /// Resolved target.
    pub target: ResolvedTarget,
    /// Rule that produced the target.
    pub source: ResolutionSource,
    /// Stages visited, in order.
    pub stages: Vec<ResolutionStage>,
}

/// Parse a raw descriptor, then resolve against it.
pub fn resolve_connection_raw(
    deps: &ResolveConnectionDeps,
    raw: &Value,
    input: &ResolveConnectionInput,
) -> Result<ConnectionResolution, ResolveError> {
    let mut trace = Trace::start(deps);
    let result = parse_subscription(raw)
        .map_err(ResolveError::from)
        .and_then(|primary| {
            trace.advance(ResolutionStage::ParseSubscription);
            run(&mut trace, &primary, input)
        });
    trace.finish(result)
}

/// Resolve the connection target against an already parsed snapshot.
pub fn resolve_connection(
    deps: &ResolveConnectionDeps,
    primary: &SubscriptionDescriptor,
    input: &ResolveConnectionInput,
) -> Result<ConnectionResolution, ResolveError> {
    let mut trace = Trace::start(deps);
    trace.advance(ResolutionStage::ParseSubscription);
    let result = run(&mut trace, primary, input);
    trace.finish(result)
}

struct Chosen<'a> {
    core_id: &'a str,
    source: ResolutionSource,
    host_snapshot: Option<&'a SubscriptionDescriptor>,
    derived_key: Option<DerivedKey>,
}

fn run(
    trace: &mut Trace<'_>,
    primary: &SubscriptionDescriptor,
    input: &ResolveConnectionInput,
) -> Result<(ResolvedTarget, ResolutionSource), ResolveError> {
    let outcome = resolve_outcome(&input.overrides)?;
    trace.advance(ResolutionStage::Resolve);
    trace.debug(
        "backend.resolveConnection.outcome",
        "Override precedence applied",
        log_fields([("outcome", outcome.kind())]),
    );

    let chosen = match &outcome {
        ResolutionOutcome::Selected(core_id) => {
            trace.advance(ResolutionStage::DeriveKey);
            primary_choice(primary, core_id, ResolutionSource::Selected)?
        },
        ResolutionOutcome::NeedsAutoDetect => {
            trace.advance(ResolutionStage::Detect);
            match detect_environment_core(primary, &input.ambient) {
                Some(core) => {
                    trace.advance(ResolutionStage::DeriveKey);
                    primary_choice(primary, core.core_id(), ResolutionSource::AutoDetected)?
                },
                None => {
                    trace.warn(
                        "backend.resolveConnection.detectMiss",
                        "No core matches the site environment; using the default core",
                        log_fields([
                            ("environment", input.ambient.environment().unwrap_or_default()),
                            ("identifier", primary.identifier()),
                        ]),
                    );
                    default_choice(primary)
                },
            }
        },
        ResolutionOutcome::ManualOverride {
            identifier,
            key,
            core_name,
        } => {
            trace.advance(ResolutionStage::DeriveKey);
            manual_choice(primary, input, identifier, key, core_name)?
        },
        ResolutionOutcome::UseDefault => default_choice(primary),
    };

    trace.advance(ResolutionStage::Assemble);
    let host = chosen
        .host_snapshot
        .and_then(|snapshot| snapshot.find_core(chosen.core_id))
        .map(|core| core.balancer_label().trim())
        .filter(|balancer| !balancer.is_empty())
        .unwrap_or(&*input.default_host);

    let target = assemble_target(input.scheme, chosen.core_id, chosen.derived_key, host);
    Ok((target, chosen.source))
}

fn primary_choice<'a>(
    primary: &'a SubscriptionDescriptor,
    core_id: &'a str,
    source: ResolutionSource,
) -> Result<Chosen<'a>, InvalidCredentialError> {
    let derived_key = derive_key(primary.derived_key_salt(), core_id, primary.key())?;
    Ok(Chosen {
        core_id,
        source,
        host_snapshot: Some(primary),
        derived_key: Some(derived_key),
    })
}

fn manual_choice<'a>(
    primary: &'a SubscriptionDescriptor,
    input: &'a ResolveConnectionInput,
    identifier: &str,
    key: &SecretString,
    core_name: &'a str,
) -> Result<Chosen<'a>, InvalidCredentialError> {
    let snapshot = std::iter::once(primary)
        .chain(input.manual_snapshot.as_deref())
        .find(|snapshot| snapshot.identifier() == identifier)
        .ok_or_else(|| InvalidCredentialError::UnknownSubscription {
            identifier: identifier.to_owned(),
        })?;

    let derived_key = derive_key(snapshot.derived_key_salt(), core_name, key)?;
    Ok(Chosen {
        core_id: core_name,
        source: ResolutionSource::Manual,
        host_snapshot: Some(snapshot),
        derived_key: Some(derived_key),
    })
}

fn default_choice(primary: &SubscriptionDescriptor) -> Chosen<'_> {
    Chosen {
        core_id: primary.primary_core_id(),
        source: ResolutionSource::Default,
        host_snapshot: None,
        derived_key: None,
    }
}

struct Trace<'a> {
    logger: Option<&'a dyn LoggerPort>,
    stages: Vec<ResolutionStage>,
}

impl<'a> Trace<'a> {
    fn start(deps: &'a ResolveConnectionDeps) -> Self {
        let trace = Self {
            logger: deps.logger.as_deref(),
            stages: vec![ResolutionStage::Start],
        };
        if let Some(logger) = trace.logger {
            logger.info(
                "backend.resolveConnection.start",
                "Connection resolution started",
                LogFields::new(),
            );
        }
        trace
    }

    fn current(&self) -> ResolutionStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(ResolutionStage::Start)
    }

    fn advance(&mut self, to: ResolutionStage) {
        let from = self.current();
        debug_assert!(
            is_allowed_transition(from, to),
            "transition {} -> {} is not allowed",
            from.as_str(),
            to.as_str()
        );
        self.debug(
            "backend.resolveConnection.stage",
            "Resolution stage changed",
            log_fields([("from", from.as_str()), ("to", to.as_str())]),
        );
        self.stages.push(to);
    }

    fn debug(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger {
            logger.debug(event, message, fields);
        }
    }

    fn warn(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger {
            logger.warn(event, message, fields);
        }
    }

    fn finish(
        mut self,
        result: Result<(ResolvedTarget, ResolutionSource), ResolveError>,
    ) -> Result<ConnectionResolution, ResolveError> {
        match result {
            Ok((target, source)) => {
                self.advance(ResolutionStage::Done);
                if let Some(logger) = self.logger {
                    logger.info(
                        "backend.resolveConnection.completed",
                        "Connection resolution completed",
                        log_fields([
                            ("source", Value::from(source.as_str())),
                            ("coreId", Value::from(&*target.core_id)),
                            ("host", Value::from(&*target.host)),
                            ("port", Value::from(target.port)),
                            ("withDerivation", Value::from(target.derived_key.is_some())),
                        ]),
                    );
                }
                Ok(ConnectionResolution {
                    target,
                    source,
                    stages: self.stages,
                })
            },
            Err(error) => {
                if let Some(logger) = self.logger {
                    let envelope = ErrorEnvelope::from(error.clone());
                    logger.warn(
                        "backend.resolveConnection.failed",
                        "Connection resolution failed",
                        log_fields([
                            ("stage", self.current().as_str().to_owned()),
                            ("errorCode", envelope.code.to_string()),
                        ]),
                    );
                }
                Err(error)
            },
        }
    }
}
