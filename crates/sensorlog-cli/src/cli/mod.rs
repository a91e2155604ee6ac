mod commands;
mod helpers;

use clap::Parser;
use sensorlog_core::domain::SensorLogError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

pub fn run_from_env() -> i32 {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_sensorlog_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            if let Some(summary_line) = diagnostic.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("sensorlog".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

/// Logs go to stderr so chart JSON on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "sensorlog",
    version,
    about = "Merge, extract, chart and batch-edit legacy-encoded sensor CSV logs"
)]
struct Cli {
    /// JSON file overriding column names and pipeline constants
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Group files by the character before the extension and outer-join the groups
    Merge(commands::MergeArgs),
    /// Pick configured columns from a merged table and index them by time
    Extract(commands::ExtractArgs),
    /// Build chart JSON for selected columns over a time window
    Chart(commands::ChartArgs),
    /// Lower one column step by step until it reaches zero, one file per step
    Decrement(commands::DecrementArgs),
    /// Write one copy of a template per replacement row
    Substitute(commands::SubstituteArgs),
}

fn dispatch_parsed(cli: Cli) -> Result<i32, CliError> {
    let settings = helpers::load_settings(cli.settings.as_deref())?;
    match cli.command {
        CliCommand::Merge(args) => commands::run_merge_command(args, &settings),
        CliCommand::Extract(args) => commands::run_extract_command(args, &settings),
        CliCommand::Chart(args) => commands::run_chart_command(args, &settings),
        CliCommand::Decrement(args) => commands::run_decrement_command(args, &settings),
        CliCommand::Substitute(args) => commands::run_substitute_command(args, &settings),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(SensorLogError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SensorLogError> for CliError {
    fn from(error: SensorLogError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_sensorlog_error(&self) -> SensorLogError {
        match self {
            Self::Usage(message) => {
                SensorLogError::invalid_parameter("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => SensorLogError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};
    use sensorlog_core::domain::ErrorKind;

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(run(["--help"]).expect("help is not an error"), 0);
        assert_eq!(run(["merge", "--help"]).expect("help is not an error"), 0);
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["explode"]).expect_err("no such subcommand");
        assert!(matches!(error, CliError::Usage(_)));
        let diagnostic = error.as_sensorlog_error();
        assert_eq!(diagnostic.kind(), ErrorKind::InvalidParameter);
        assert_eq!(diagnostic.exit_code(), 2);
    }

    #[test]
    fn missing_input_file_maps_to_io_exit_code() {
        let error = run(["merge", "/nonexistent/sensor_A.csv"]).expect_err("file is absent");
        assert!(matches!(error, CliError::Internal(_)));
        assert_eq!(error.as_sensorlog_error().exit_code(), 3);
    }
}
