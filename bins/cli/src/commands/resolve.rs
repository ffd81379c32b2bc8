//! Resolve command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_ndjson_summary, log_info};
use solr_multisub_infra::{LoadedConfig, ResolveReport, run_resolve_local};
use solr_multisub_ports::LoggerPort;
use solr_multisub_shared::REDACTED_VALUE;
use std::sync::Arc;

/// Run the resolve command.
pub fn run_resolve(
    mode: OutputMode,
    loaded: &LoadedConfig,
    logger: Option<Arc<dyn LoggerPort>>,
    reveal_key: bool,
) -> Result<CliOutput, CliError> {
    let report = run_resolve_local(loaded, logger)?;

    let mut stderr = String::new();
    log_info(&mut stderr, "resolve completed", mode.no_progress);

    let payload = resolve_payload(&report, reveal_key);
    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "resolve", Some(payload))
    } else if mode.is_json() {
        let mut output = serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "resolution": payload,
        }))?;
        output.push('\n');
        output
    } else {
        format_resolve_text(&report, reveal_key)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn derived_key_value(report: &ResolveReport, reveal_key: bool) -> Option<String> {
    report.resolution.target.derived_key.as_ref().map(|key| {
        if reveal_key {
            key.expose().to_owned()
        } else {
            REDACTED_VALUE.to_owned()
        }
    })
}

fn resolve_payload(report: &ResolveReport, reveal_key: bool) -> serde_json::Value {
    let target = &report.resolution.target;
    let stages: Vec<&str> = report
        .resolution
        .stages
        .iter()
        .map(|stage| stage.as_str())
        .collect();
    serde_json::json!({
        "identifier": &*report.identifier,
        "source": report.resolution.source.as_str(),
        "coreId": &*target.core_id,
        "host": &*target.host,
        "port": target.port,
        "path": &*target.path,
        "scheme": report.scheme.as_str(),
        "endpoint": report.endpoint(),
        "derivedKey": derived_key_value(report, reveal_key),
        "stages": stages,
    })
}

fn format_resolve_text(report: &ResolveReport, reveal_key: bool) -> String {
    let target = &report.resolution.target;
    let stages: Vec<&str> = report
        .resolution
        .stages
        .iter()
        .map(|stage| stage.as_str())
        .collect();
    format!(
        "status: ok\nsubscription: {}\nsource: {}\ncore: {}\nendpoint: {}\nderivedKey: {}\nstages: {}\n",
        report.identifier,
        report.resolution.source,
        target.core_id,
        report.endpoint(),
        derived_key_value(report, reveal_key).as_deref().unwrap_or("none"),
        stages.join(" > "),
    )
}
