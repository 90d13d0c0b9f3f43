//! Command-line interface for interlog.
//!
//! This module provides the CLI structure and command handlers for the
//! `interlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, EmitCommand, KindArg, OutputFormat, RecentCommand, ServeCommand, StatusCommand,
};

/// interlog - Consent-gated interaction telemetry
///
/// Runs the ingestion server, records interactions from the command line, and
/// lets operators inspect the most recent events.
#[derive(Debug, Parser)]
#[command(name = "interlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the ingestion and admin HTTP server
    Serve(ServeCommand),

    /// Show the most recently accepted events
    Recent(RecentCommand),

    /// Show event log status
    Status(StatusCommand),

    /// Record one interaction
    Emit(EmitCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "interlog");
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(cli(0, true).verbosity(), crate::logging::Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), crate::logging::Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), crate::logging::Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["interlog", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve(ServeCommand { bind: None })));

        let cli = Cli::try_parse_from(["interlog", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        let Command::Serve(cmd) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(cmd.bind, Some("0.0.0.0:9000".parse().unwrap()));
    }

    #[test]
    fn test_parse_serve_bad_bind() {
        assert!(Cli::try_parse_from(["interlog", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn test_parse_recent() {
        let cli = Cli::try_parse_from(["interlog", "recent", "-l", "5", "-f", "json"]).unwrap();
        let Command::Recent(cmd) = cli.command else {
            panic!("expected recent");
        };
        assert_eq!(cmd.limit, Some(5));
        assert_eq!(cmd.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_emit() {
        let cli = Cli::try_parse_from([
            "interlog",
            "emit",
            "--kind",
            "feature-usage",
            "--payload",
            r#"{"featureName":"upload"}"#,
            "--user",
            "u1",
        ])
        .unwrap();
        let Command::Emit(cmd) = cli.command else {
            panic!("expected emit");
        };
        assert_eq!(cmd.kind, KindArg::FeatureUsage);
        assert_eq!(cmd.user.as_deref(), Some("u1"));
        assert!(cmd.endpoint.is_none());
        assert!(!cmd.deny_consent);
    }

    #[test]
    fn test_parse_emit_requires_kind() {
        assert!(Cli::try_parse_from(["interlog", "emit"]).is_err());
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::try_parse_from(["interlog", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Status(StatusCommand { json: true })));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["interlog", "config", "validate", "-f", "/tmp/x.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["interlog", "-c", "/custom/config.toml", "status"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["interlog", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["interlog", "-q", "status"]).unwrap();
        assert!(cli.quiet);
    }
}
