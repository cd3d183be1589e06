//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::Vin;
use std::path::PathBuf;

/// Telemetry Agent - predictive store-and-forward uplink for one vehicle
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-agent",
    author,
    version,
    about = "Vehicle telemetry edge agent",
    long_about = "Reads raw vehicle records, suppresses fields the cloud can predict, \n\
                  uploads the rest and buffers to disk while the link is down.\n\n\
                  Without a subcommand the agent runs for the given VIN.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_AGENT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "TELEMETRY_AGENT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display the resolved configuration and buffer state
    Info(InfoArgs),
}

/// Arguments for running the agent
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Vehicle VIN (overrides VEHICLE_VIN and the config file)
    #[arg(value_parser = parse_vin)]
    pub vin: Option<Vin>,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "TELEMETRY_AGENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Raw JSONL record file (default: source.path_template)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Override the upload server host
    #[arg(long)]
    pub server_host: Option<String>,

    /// Override the upload server port
    #[arg(long, env = "SERVER_PORT")]
    pub server_port: Option<u16>,

    /// Directory for the offline buffer file
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Start with the link marked offline
    #[arg(long)]
    pub start_offline: bool,

    /// Do not read connectivity commands from stdin
    #[arg(long)]
    pub no_console: bool,

    /// Process records as fast as possible instead of real-time pacing
    #[arg(long)]
    pub no_pacing: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "TELEMETRY_AGENT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "agent.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Vehicle VIN (overrides VEHICLE_VIN and the config file)
    #[arg(value_parser = parse_vin)]
    pub vin: Option<Vin>,

    /// Path to configuration file
    #[arg(short, long, env = "TELEMETRY_AGENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the offline buffer file
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

fn parse_vin(s: &str) -> Result<Vin, String> {
    Vin::new(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_invocation_runs() {
        let cli = Cli::try_parse_from(["telemetry-agent", "5YJ3E1EA2KF000002", "--no-pacing"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.vin.unwrap().as_str(), "5YJ3E1EA2KF000002");
        assert!(cli.run.no_pacing);
    }

    #[test]
    fn test_invalid_vin_rejected() {
        assert!(Cli::try_parse_from(["telemetry-agent", "NOT-A-VIN"]).is_err());
    }

    #[test]
    fn test_validate_subcommand() {
        let cli = Cli::try_parse_from(["telemetry-agent", "validate", "-c", "a.toml", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Validate(args)) => {
                assert_eq!(args.config, PathBuf::from("a.toml"));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_flags_conflict_with_subcommand() {
        assert!(Cli::try_parse_from(["telemetry-agent", "--start-offline", "info"]).is_err());
    }
}
