mod actions;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use runlog_core::{parse_args, HarnessConfig, HarnessError, Orchestrator, ParsedArguments};
use tracing_subscriber::EnvFilter;

/// Output format for harness errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Run a training action and record its provenance.
///
/// Harness flags go before the action. Everything from the action onward
/// is passed through untouched: `runlog [FLAGS] <action> [target] [options...]`.
#[derive(Parser)]
#[command(
    name = "runlog",
    version,
    about = "Run a training action and record its provenance"
)]
struct Cli {
    /// Directory for run logs (overrides runlog.toml and RUNLOG_LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Configuration file (default: ./runlog.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Error output format (text or json)
    #[arg(long, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress the argument summary
    #[arg(long)]
    quiet: bool,

    /// Action, optional target, and options for the user action
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "ACTION [TARGET] [OPTIONS]"
    )]
    args: Vec<String>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let process_argv: Vec<String> = std::env::args().collect();
    let program = process_argv
        .first()
        .cloned()
        .unwrap_or_else(|| "runlog".to_string());
    let parsed = parse_args(std::iter::once(program).chain(cli.args));
    if !cli.quiet {
        println!("{}", parsed);
    }

    if let Err(e) = cmd_run(parsed, process_argv, cli.config.as_deref(), cli.log_dir) {
        report_error(&format!("error: {}", e), cli.output);
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// `process_argv` is what gets recorded, harness flags included.
fn cmd_run(
    parsed: ParsedArguments,
    process_argv: Vec<String>,
    config_path: Option<&Path>,
    log_dir: Option<PathBuf>,
) -> Result<(), HarnessError> {
    let config = resolve_config(config_path, log_dir)?;
    tracing::debug!(?config, "resolved configuration");

    let registry = actions::registry(&config.action_base_name);
    let action = registry.instantiate(&parsed)?;
    let outcome = Orchestrator::new(parsed, action, &config)
        .with_process_argv(process_argv)
        .run()?;
    tracing::debug!(?outcome, "run finished");
    Ok(())
}

/// Defaults, then the config file, then `RUNLOG_LOG_DIR`, then `--log-dir`.
fn resolve_config(
    config_path: Option<&Path>,
    log_dir: Option<PathBuf>,
) -> Result<HarnessConfig, HarnessError> {
    let config = match config_path {
        Some(path) => HarnessConfig::load_file(path)?,
        None => HarnessConfig::discover(Path::new("."))?,
    };
    let mut config = config.with_env(|key| std::env::var(key).ok());
    if let Some(dir) = log_dir {
        config.log_dir = dir;
    }
    Ok(config)
}

pub(crate) fn report_error(msg: &str, output: OutputFormat) {
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            let value = serde_json::json!({ "error": msg });
            eprintln!("{}", value);
        }
    }
}
