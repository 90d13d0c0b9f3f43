//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::event::EventKind;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Listen address (overrides `server.bind_address`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,
}

/// Recent command arguments.
#[derive(Debug, Args)]
pub struct RecentCommand {
    /// Maximum number of events (at most 1000)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Emit command arguments.
#[derive(Debug, Args)]
pub struct EmitCommand {
    /// Event kind
    #[arg(short, long, value_enum)]
    pub kind: KindArg,

    /// Event payload as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub payload: String,

    /// User id to attribute the event to
    #[arg(short, long)]
    pub user: Option<String>,

    /// Base URL of a running server; records into the local database when
    /// omitted
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Emit as a user who withheld consent
    #[arg(long)]
    pub deny_consent: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Event kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// `CONTENT_GENERATION`
    ContentGeneration,
    /// `FEATURE_USAGE`
    FeatureUsage,
    /// `SEARCH_QUERY`
    SearchQuery,
    /// `FAQ_QUESTION`
    FaqQuestion,
    /// `FAITH_MODE_EVENT`
    FaithModeEvent,
    /// `UPLOAD_METADATA`
    UploadMetadata,
}

impl From<KindArg> for EventKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::ContentGeneration => Self::ContentGeneration,
            KindArg::FeatureUsage => Self::FeatureUsage,
            KindArg::SearchQuery => Self::SearchQuery,
            KindArg::FaqQuestion => Self::FaqQuestion,
            KindArg::FaithModeEvent => Self::FaithModeEvent,
            KindArg::UploadMetadata => Self::UploadMetadata,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
