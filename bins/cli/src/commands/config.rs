//! Config command handlers.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, format_ndjson_summary, log_info};
use solr_multisub_infra::{load_effective_config_json, load_effective_config_toml};
use std::collections::BTreeMap;
use std::path::Path;

/// Validate config loading, env merging, and normalization.
pub fn run_config_check(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let config_json = match load_effective_config_json(env, path) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "config", None)
    } else if mode.is_json() {
        let config_value: serde_json::Value = serde_json::from_str(config_json.trim())?;
        let mut output = serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": config_value,
        }))?;
        output.push('\n');
        output
    } else {
        path.map_or_else(
            || "status: ok\nconfig: ok\n".to_string(),
            |path| format!("status: ok\nconfig: ok\npath: {}\n", path.to_string_lossy()),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Show the effective config; TOML in text mode, JSON otherwise.
pub fn run_config_show(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let mut stderr = String::new();

    let stdout = if mode.is_json() || mode.is_ndjson() {
        let config_json = match load_effective_config_json(env, path) {
            Ok(config) => config,
            Err(error) => return Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
        };
        let config_value: serde_json::Value = serde_json::from_str(config_json.trim())?;
        if mode.is_ndjson() {
            format_ndjson_summary(
                "ok",
                "config",
                Some(serde_json::json!({ "effectiveConfig": config_value })),
            )
        } else {
            let mut output = serde_json::to_string_pretty(&serde_json::json!({
                "status": "ok",
                "configPath": path.map(|value| value.to_string_lossy().to_string()),
                "effectiveConfig": config_value,
            }))?;
            output.push('\n');
            output
        }
    } else {
        let config_toml = match load_effective_config_toml(env, path) {
            Ok(config) => config,
            Err(error) => return Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
        };
        let mut out = String::from("status: ok\nconfig:\n");
        out.push_str(&config_toml);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    };

    log_info(&mut stderr, "config show completed", mode.no_progress);

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
