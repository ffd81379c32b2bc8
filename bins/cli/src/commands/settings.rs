//! Settings command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_ndjson_summary, log_info};
use solr_multisub_app::SettingsSummary;
use solr_multisub_infra::{LoadedConfig, run_settings_local};

/// Run the settings command.
pub fn run_settings(mode: OutputMode, loaded: &LoadedConfig) -> Result<CliOutput, CliError> {
    let summary = run_settings_local(loaded)?;

    let mut stderr = String::new();
    log_info(&mut stderr, "settings loaded", mode.no_progress);
    if summary.single_core_warning {
        stderr.push_str("warning: subscription has a single core; selection has no effect\n");
    }

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary(
            "ok",
            "settings",
            Some(serde_json::json!({ "settings": serde_json::to_value(&summary)? })),
        )
    } else if mode.is_json() {
        let mut output = serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "settings": summary,
        }))?;
        output.push('\n');
        output
    } else {
        format_settings_text(&summary)
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn format_settings_text(summary: &SettingsSummary) -> String {
    let mut out = String::from("status: ok\n");
    out.push_str(&format!("subscription: {}\n", summary.identifier));
    out.push_str(&format!(
        "autoDetection: {}\n",
        if summary.auto_detection_enabled { "on" } else { "off" }
    ));
    out.push_str(&format!(
        "selector: {}\n",
        summary.selector.as_deref().unwrap_or("none")
    ));
    out.push_str(&format!(
        "failoverRegion: {}\n",
        summary.failover_region.as_deref().unwrap_or("none")
    ));
    out.push_str("options:\n");
    for option in &summary.selector_options {
        out.push_str("  ");
        out.push_str(option);
        out.push('\n');
    }
    out
}
