//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{run_config_check, run_config_show, run_refresh, run_resolve, run_settings};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use solr_multisub_infra::{
    InfraError, LoadedConfig, LogOutput, build_logger, is_secret_key, load_local_config_from_map,
};
use solr_multisub_ports::{LogLevel, LoggerPort};
use solr_multisub_shared::{ErrorKind, REDACTED_VALUE};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Env variable holding the tracing filter directives.
const LOG_FILTER_ENV: &str = "MULTISUB_LOG";

/// Env prefixes read into the config layer.
const ENV_PREFIXES: [&str; 2] = ["MULTISUB_", "AH_"];

#[derive(Debug, Parser)]
#[command(
    name = "multisub",
    version,
    about = "Search core selection and derived-key resolution",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Optional config file path (JSON/TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the core, host, and derived key for this site.
    Resolve {
        /// Print the derived key instead of a redacted placeholder.
        #[arg(long)]
        reveal_key: bool,
    },
    /// Show the selector options offered by the subscription.
    Settings,
    /// Re-read the subscription descriptor and publish a new snapshot.
    Refresh,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Validate config loading, env merging, and normalization.
    Check,
    /// Show the effective config after env overrides.
    Show,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);
    let log_output = if cli.output.log_json {
        LogOutput::Json(LogLevel::Info)
    } else {
        install_tracing();
        LogOutput::Tracing
    };

    let env = collect_scoped_env(&ENV_PREFIXES);
    match run(&cli, mode, log_output, &env) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn install_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(
    cli: &Cli,
    mode: OutputMode,
    log_output: LogOutput,
    env: &BTreeMap<String, String>,
) -> Result<CliOutput, CliError> {
    let config_path = cli.config.as_deref();
    tracing::debug!(config = ?config_path, command = ?cli.command, "dispatching command");
    let result = match &cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Check => run_config_check(mode, env, config_path),
            ConfigCommands::Show => run_config_show(mode, env, config_path),
        },
        Commands::Resolve { reveal_key } => with_loaded_config(mode, env, config_path, |loaded| {
            run_resolve(
                mode,
                loaded,
                Some(command_logger(log_output, "resolve")),
                *reveal_key,
            )
        }),
        Commands::Settings => {
            with_loaded_config(mode, env, config_path, |loaded| run_settings(mode, loaded))
        },
        Commands::Refresh => with_loaded_config(mode, env, config_path, |loaded| {
            run_refresh(mode, loaded, Some(command_logger(log_output, "refresh")))
        }),
    };
    match result {
        Err(CliError::Backend(error)) => Ok(format_error_output(
            mode,
            &error,
            ExitCode::for_kind(error.kind),
        )),
        other => other,
    }
}

fn with_loaded_config(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    command: impl FnOnce(&LoadedConfig) -> Result<CliOutput, CliError>,
) -> Result<CliOutput, CliError> {
    match load_local_config_from_map(env, config_path) {
        Ok(loaded) => command(&loaded),
        Err(error) => Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
    }
}

fn command_logger(output: LogOutput, command: &str) -> Arc<dyn LoggerPort> {
    build_logger(output, command)
}

pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &InfraError,
    exit_code: ExitCode,
) -> CliOutput {
    let error = sanitize_error(error);

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        format_ndjson_error(&error)
    } else if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error,
        });

        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"invariant\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        format_error_text(&error)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

fn sanitize_error(error: &InfraError) -> InfraError {
    let mut error = error.clone();
    for (key, value) in &mut error.metadata {
        if is_secret_key(key) {
            *value = REDACTED_VALUE.to_string();
        }
    }
    error
}

fn format_error_text(error: &InfraError) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code.to_string());
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(match error.kind {
        ErrorKind::Expected => "EXPECTED",
        ErrorKind::Invariant => "INVARIANT",
        ErrorKind::Unexpected => "UNEXPECTED",
    });
    out.push('\n');

    if !error.metadata.is_empty() {
        out.push_str("meta:\n");
        for (key, value) in &error.metadata {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }

    out
}

pub(crate) fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

pub(crate) fn format_ndjson_summary(
    status: &str,
    kind: &str,
    extra: Option<serde_json::Value>,
) -> String {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "type".to_string(),
        serde_json::Value::String("summary".to_string()),
    );
    payload.insert(
        "status".to_string(),
        serde_json::Value::String(status.to_string()),
    );
    payload.insert(
        "kind".to_string(),
        serde_json::Value::String(kind.to_string()),
    );
    if let Some(serde_json::Value::Object(map)) = extra {
        for (key, value) in map {
            payload.insert(key, value);
        }
    }
    let mut out = serde_json::to_string(&serde_json::Value::Object(payload)).unwrap_or_else(|_| {
        "{\"type\":\"summary\",\"status\":\"error\",\"kind\":\"internal\"}".to_string()
    });
    out.push('\n');
    out
}

fn format_ndjson_error(error: &InfraError) -> String {
    let payload = serde_json::json!({
        "type": "error",
        "status": "error",
        "error": error,
    });
    let mut out = serde_json::to_string(&payload).unwrap_or_else(|_| {
        "{\"type\":\"error\",\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"invariant\"}}".to_string()
    });
    out.push('\n');
    out
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

fn collect_scoped_env(prefixes: &[&str]) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| prefixes.iter().any(|prefix| key.starts_with(prefix)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use clap::CommandFactory;
    use solr_multisub_shared::ErrorCode;

    fn mode(format: Option<OutputFormat>) -> OutputMode {
        OutputMode::from_args(&OutputArgs {
            output: format,
            no_progress: true,
            log_json: false,
        })
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_flag_is_supported() {
        let result = Cli::command().try_get_matches_from(["multisub", "--version"]);
        let is_version = matches!(
            result,
            Err(error) if error.kind() == clap::error::ErrorKind::DisplayVersion
        );

        assert!(is_version, "expected clap to render version");
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::try_parse_from([
            "multisub",
            "resolve",
            "--reveal-key",
            "--output",
            "json",
            "--config",
            "/etc/multisub.toml",
            "--log-json",
        ])?;
        assert_eq!(cli.output.output, Some(OutputFormat::Json));
        assert!(cli.output.log_json);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/multisub.toml")));
        assert!(matches!(cli.command, Commands::Resolve { reveal_key: true }));
        Ok(())
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let expected = InfraError::expected(ErrorCode::invalid_input(), "bad");
        let invariant = InfraError::invariant(ErrorCode::internal(), "broken");
        assert_eq!(ExitCode::for_kind(expected.kind), ExitCode::InvalidInput);
        assert_eq!(ExitCode::for_kind(invariant.kind), ExitCode::Internal);
    }

    #[test]
    fn backend_failure_is_rendered_as_command_output() -> Result<(), Box<dyn std::error::Error>> {
        let empty_dir = std::env::temp_dir().join(format!("multisub-cli-empty-{}", std::process::id()));
        let env = BTreeMap::from([
            (
                "MULTISUB_SUBSCRIPTION_IDENTIFIER".to_owned(),
                "ABCD-12345".to_owned(),
            ),
            (
                "MULTISUB_SNAPSHOT_DIR".to_owned(),
                empty_dir.to_string_lossy().into_owned(),
            ),
        ]);
        let cli = Cli::try_parse_from(["multisub", "resolve"])?;
        let output = run(&cli, mode(Some(OutputFormat::Json)), LogOutput::Json(LogLevel::Error), &env)?;
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;
        assert_eq!(value.get("status").and_then(serde_json::Value::as_str), Some("error"));
        assert!(output.stdout.contains("subscription_source"));
        Ok(())
    }

    #[test]
    fn error_formatting_redacts_sensitive_meta_keys() {
        let error = InfraError::expected(ErrorCode::new("config", "invalid_env"), "bad env")
            .with_metadata("subscriptionKey", "secret-value")
            .with_metadata("field", "scheme");

        let output = format_error_output(mode(None), &error, ExitCode::InvalidInput);
        assert!(output.stdout.contains("status: error"));
        assert!(output.stdout.contains("code: config:invalid_env"));
        assert!(output.stdout.contains("field: scheme"));
        assert!(!output.stdout.contains("secret-value"));
    }

    #[test]
    fn ndjson_error_is_a_single_line() -> Result<(), Box<dyn std::error::Error>> {
        let error = InfraError::expected(ErrorCode::not_found(), "missing");
        let output = format_error_output(mode(Some(OutputFormat::Ndjson)), &error, ExitCode::InvalidInput);
        assert_eq!(output.stdout.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;
        assert_eq!(value.get("type").and_then(serde_json::Value::as_str), Some("error"));
        Ok(())
    }

    #[test]
    fn config_check_failure_exit_code_is_invalid_input() -> Result<(), Box<dyn std::error::Error>> {
        let missing = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("missing-config.json");
        let output = run_config_check(mode(None), &BTreeMap::new(), Some(missing.as_path()))?;
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(output.stdout.contains("status: error"));
        Ok(())
    }

    #[test]
    fn config_show_json_hides_secrets() -> Result<(), Box<dyn std::error::Error>> {
        let env = BTreeMap::from([
            (
                "MULTISUB_SUBSCRIPTION_IDENTIFIER".to_owned(),
                "ABCD-12345".to_owned(),
            ),
            ("MULTISUB_SUBSCRIPTION_KEY".to_owned(), "hunter2".to_owned()),
        ]);
        let output = run_config_show(mode(Some(OutputFormat::Json)), &env, None)?;
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;
        let identifier = value
            .get("effectiveConfig")
            .and_then(|config| config.get("subscription"))
            .and_then(|section| section.get("identifier"))
            .and_then(serde_json::Value::as_str);
        assert_eq!(identifier, Some("ABCD-12345"));
        assert!(!output.stdout.contains("hunter2"));
        Ok(())
    }

    #[test]
    fn missing_identifier_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::try_parse_from(["multisub", "settings"])?;
        let output = run(&cli, mode(None), LogOutput::Json(LogLevel::Error), &BTreeMap::new())?;
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(output.stdout.contains("config:missing_identifier"));
        Ok(())
    }

    #[test]
    fn log_info_respects_no_progress() {
        let mut stderr = String::new();
        log_info(&mut stderr, "message", true);
        assert!(stderr.is_empty());
    }
}
