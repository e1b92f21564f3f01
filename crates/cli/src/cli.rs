//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// vlog - structured logging with asynchronous Kafka forwarding
#[derive(Parser, Debug)]
#[command(
    name = "vlog",
    author,
    version,
    about = "Structured logging pipeline with Kafka forwarding",
    long_about = "Writes JSON log records to rotating files and forwards the error stream \n\
                  (and optionally the info stream) to Kafka through a bounded worker pool."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "VLOG_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Diagnostic output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "VLOG_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the pipeline and write log records
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML, JSON or YAML)
    #[arg(short, long, default_value = "vlog.toml", env = "VLOG_CONFIG")]
    pub config: PathBuf,

    /// Stream the records are written to
    #[arg(long, value_enum, default_value = "info")]
    pub stream: StreamArg,

    /// Number of generated records to write (0 = read lines from stdin)
    #[arg(long, default_value = "0")]
    pub count: u64,

    /// Message for generated records; `{i}` is replaced by the sequence number
    #[arg(long, default_value = "message {i}")]
    pub message: String,

    /// Disable Kafka forwarding even if the configuration enables it
    #[arg(long)]
    pub no_kafka: bool,

    /// Validate configuration and exit without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "VLOG_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "vlog.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "vlog.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Target stream for the `run` command
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamArg {
    Debug,
    Access,
    Info,
    Error,
}

impl From<StreamArg> for logger::Stream {
    fn from(value: StreamArg) -> Self {
        match value {
            StreamArg::Debug => logger::Stream::Debug,
            StreamArg::Access => logger::Stream::Access,
            StreamArg::Info => logger::Stream::Info,
            StreamArg::Error => logger::Stream::Error,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["vlog", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.stream, StreamArg::Info);
        assert_eq!(args.count, 0);
        assert!(!args.no_kafka);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "vlog", "-v", "run", "--config", "a.json", "--stream", "error", "--count", "10",
            "--no-kafka",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("a.json"));
        assert_eq!(logger::Stream::from(args.stream), logger::Stream::Error);
        assert_eq!(args.count, 10);
        assert!(args.no_kafka);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["vlog", "-q", "-v", "validate"]).is_err());
    }
}
