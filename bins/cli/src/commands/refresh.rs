//! Refresh command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_ndjson_summary, log_info};
use solr_multisub_app::RefreshOutcome;
use solr_multisub_infra::{LoadedConfig, RefreshReport, run_refresh_local};
use solr_multisub_ports::LoggerPort;
use std::sync::Arc;

/// Run the refresh command.
pub fn run_refresh(
    mode: OutputMode,
    loaded: &LoadedConfig,
    logger: Option<Arc<dyn LoggerPort>>,
) -> Result<CliOutput, CliError> {
    let report = run_refresh_local(loaded, logger)?;

    let mut stderr = String::new();
    log_info(&mut stderr, "refresh completed", mode.no_progress);

    let payload = refresh_payload(&report);
    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "refresh", Some(payload))
    } else if mode.is_json() {
        let mut output = serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "refresh": payload,
        }))?;
        output.push('\n');
        output
    } else {
        format_refresh_text(&report)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn refresh_payload(report: &RefreshReport) -> serde_json::Value {
    match &report.outcome {
        RefreshOutcome::Refreshed { snapshot } => serde_json::json!({
            "identifier": &*report.identifier,
            "outcome": "refreshed",
            "cores": snapshot.cores(),
            "publishedPath": report
                .published_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
        }),
        RefreshOutcome::Skipped { reason } => serde_json::json!({
            "identifier": &*report.identifier,
            "outcome": "skipped",
            "reason": reason.as_str(),
        }),
    }
}

fn format_refresh_text(report: &RefreshReport) -> String {
    match &report.outcome {
        RefreshOutcome::Refreshed { snapshot } => {
            let mut out = format!(
                "status: ok\nsubscription: {}\noutcome: refreshed\ncores: {}\n",
                report.identifier,
                snapshot.cores().len(),
            );
            if let Some(path) = &report.published_path {
                out.push_str("published: ");
                out.push_str(&path.to_string_lossy());
                out.push('\n');
            }
            out
        },
        RefreshOutcome::Skipped { reason } => format!(
            "status: ok\nsubscription: {}\noutcome: skipped\nreason: {}\n",
            report.identifier,
            reason.as_str(),
        ),
    }
}
