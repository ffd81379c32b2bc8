//! Builds use-case inputs and adapters from the effective config.

use solr_multisub_adapters::{JsonLogger, StderrLogSink, TracingLogger};
use solr_multisub_app::{AmbientEnvironment, SiteIdentity};
use solr_multisub_config::{BackendConfig, BackendEnv};
use solr_multisub_domain::{ManualCredentials, OverrideConfig};
use solr_multisub_ports::{LogLevel, LoggerPort, log_fields};
use std::sync::Arc;

/// Where structured use-case events go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Forward to the installed `tracing` subscriber.
    Tracing,
    /// One JSON line per event on stderr.
    Json(LogLevel),
}

/// Build the logger for a CLI command, scoped with the command name.
#[must_use]
pub fn build_logger(output: LogOutput, command: &str) -> Arc<dyn LoggerPort> {
    let base: Box<dyn LoggerPort> = match output {
        LogOutput::Tracing => Box::new(TracingLogger::new()),
        LogOutput::Json(level) => {
            Box::new(JsonLogger::new(Arc::new(StderrLogSink)).with_min_level(level))
        },
    };
    Arc::from(base.child(log_fields([("command", command)])))
}

/// Override options from config plus the manual key from env.
#[must_use]
pub fn override_config(config: &BackendConfig, env: &BackendEnv) -> OverrideConfig {
    OverrideConfig {
        selector: config.overrides.selector.clone(),
        auto_switch_enabled: config.overrides.auto_switch,
        manual: ManualCredentials {
            identifier: config.overrides.manual_identifier.clone(),
            key: env.manual_key.clone(),
            core_name: config.overrides.manual_core_name.clone(),
        },
    }
}

/// Hosting platform identity used for auto-detection.
#[must_use]
pub fn ambient_environment(env: &BackendEnv) -> AmbientEnvironment {
    AmbientEnvironment::new(env.site_name.as_deref(), env.site_environment.as_deref())
}

/// Site identity used to guard refreshes.
#[must_use]
pub fn site_identity(env: &BackendEnv) -> SiteIdentity {
    SiteIdentity {
        site_name: env.site_name.clone(),
        machine_name: env.site_machine_name.clone(),
        blocked: env.site_blocked.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> Result<BackendEnv, Box<dyn std::error::Error>> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        Ok(BackendEnv::from_map(&map)?)
    }

    #[test]
    fn manual_key_comes_from_env_only() -> Result<(), Box<dyn std::error::Error>> {
        let mut config = BackendConfig::default();
        config.overrides.manual_identifier = Some("WXYZ-1".into());
        config.overrides.manual_core_name = Some("WXYZ-1.prod".into());
        let env = env(&[("MULTISUB_MANUAL_KEY", "manual-secret")])?;

        let overrides = override_config(&config, &env);
        assert!(overrides.manual.complete().is_some());
        assert!(!format!("{overrides:?}").contains("manual-secret"));
        Ok(())
    }

    #[test]
    fn identity_defaults_to_unblocked() -> Result<(), Box<dyn std::error::Error>> {
        let identity = site_identity(&env(&[("AH_SITE_NAME", "mysite")])?);
        assert!(!identity.blocked);
        assert_eq!(identity.site_name.as_deref(), Some("mysite"));

        let blocked = site_identity(&env(&[("MULTISUB_SITE_BLOCKED", "true")])?);
        assert!(blocked.blocked);
        Ok(())
    }

    #[test]
    fn ambient_reads_site_environment() -> Result<(), Box<dyn std::error::Error>> {
        let ambient = ambient_environment(&env(&[("AH_SITE_ENVIRONMENT", "prod")])?);
        assert_eq!(ambient.environment(), Some("prod"));
        Ok(())
    }
}
