//! `interlog` - CLI for the interaction telemetry pipeline
//!
//! This binary runs the ingestion server and gives operators command-line
//! access to the event log.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::Value;

use interlog::capture::{CaptureAdapter, EmitOutcome, HttpIngestClient, IngestSink};
use interlog::cli::{
    Cli, Command, ConfigCommand, EmitCommand, OutputFormat, RecentCommand, StatusCommand,
};
use interlog::consent::Preferences;
use interlog::event::{EventKind, InteractionEvent, Payload};
use interlog::{init_logging, server, Config, IngestionGateway, QuerySurface, SqliteEventStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Serve(cmd) => server::serve(&config, cmd.bind).await?,
        Command::Recent(cmd) => handle_recent(&config, &cmd).await?,
        Command::Status(cmd) => handle_status(&config, &cmd).await?,
        Command::Emit(cmd) => handle_emit(&config, cmd).await?,
        Command::Config(cmd) => handle_config(&config, cmd)?,
    }
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<SqliteEventStore> {
    let path = config.database_path();
    SqliteEventStore::open(&path, config.busy_timeout(), config.lock_timeout())
        .with_context(|| format!("failed to open event log at {}", path.display()))
}

async fn handle_recent(config: &Config, cmd: &RecentCommand) -> anyhow::Result<()> {
    let query = QuerySurface::new(Arc::new(open_store(config)?))
        .with_default_limit(config.query.default_limit);
    let events = query.recent(cmd.limit).await?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Plain => {
            for event in &events {
                println!("{}", plain_line(event));
            }
        }
        OutputFormat::Table => print_table(&events),
    }
    Ok(())
}

fn plain_line(event: &InteractionEvent) -> String {
    format!(
        "{} {} {} {} {}",
        event.accepted_at.to_rfc3339(),
        event.id,
        event.kind,
        event.user_id,
        Value::Object(event.payload.clone())
    )
}

fn print_table(events: &[InteractionEvent]) {
    if events.is_empty() {
        println!("No events recorded.");
        return;
    }

    println!(
        "{:<27}  {:<20}  {:<16}  PAYLOAD",
        "ACCEPTED", "KIND", "USER"
    );
    for event in events {
        let mut payload = Value::Object(event.payload.clone()).to_string();
        if payload.chars().count() > 60 {
            payload = payload.chars().take(57).collect::<String>() + "...";
        }
        println!(
            "{:<27}  {:<20}  {:<16}  {}",
            event.accepted_at.format("%Y-%m-%d %H:%M:%S%.6f"),
            event.kind,
            event.user_id,
            payload
        );
    }
    println!();
    println!("{} event(s)", events.len());
}

async fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.stats().await?;

    if cmd.json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("interlog status");
        println!("---------------");
        println!("Database:      {}", config.database_path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Events:        {}", stats.total_events);
        if let (Some(oldest), Some(newest)) = (stats.oldest_event, stats.newest_event) {
            println!("Oldest:        {}", oldest.to_rfc3339());
            println!("Newest:        {}", newest.to_rfc3339());
        }
        if !stats.by_kind.is_empty() {
            println!();
            for (kind, count) in &stats.by_kind {
                println!("  {kind:<20} {count}");
            }
        }
    }
    Ok(())
}

async fn handle_emit(config: &Config, cmd: EmitCommand) -> anyhow::Result<()> {
    let payload: Payload = match serde_json::from_str(&cmd.payload)
        .context("payload is not valid JSON")?
    {
        Value::Object(map) => map,
        _ => bail!("payload must be a JSON object"),
    };
    let preferences = if cmd.deny_consent {
        Preferences::denying()
    } else {
        Preferences::allowing()
    };
    let kind = EventKind::from(cmd.kind);

    let outcome = match &cmd.endpoint {
        Some(endpoint) => {
            let client = HttpIngestClient::new(endpoint, config.server.identity_header.clone())?;
            emit_with(client, cmd.user, &preferences, kind, payload).await
        }
        None => {
            let gateway = IngestionGateway::new(Arc::new(open_store(config)?))
                .with_consent_recheck(config.ingest.recheck_consent);
            emit_with(gateway, cmd.user, &preferences, kind, payload).await
        }
    };

    match outcome {
        EmitOutcome::Accepted(id) => println!("{id}"),
        EmitOutcome::Suppressed => println!("Suppressed: consent withheld"),
        EmitOutcome::Failed(e) => bail!("event not recorded: {e}"),
    }
    Ok(())
}

async fn emit_with<S: IngestSink + 'static>(
    sink: S,
    user: Option<String>,
    preferences: &Preferences,
    kind: EventKind,
    payload: Payload,
) -> EmitOutcome {
    let mut adapter = CaptureAdapter::new(sink);
    if let Some(user) = user {
        adapter = adapter.with_user(user);
    }
    adapter.emit(preferences, kind.as_str(), payload).await
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_address);
                println!(
                    "  Admin token:        {}",
                    if config.server.admin_token.is_some() {
                        "set"
                    } else {
                        "not set (admin endpoint disabled)"
                    }
                );
                println!("  Identity header:    {}", config.server.identity_header);
                println!("  Max body bytes:     {}", config.server.max_body_bytes);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Busy timeout (ms):  {}", config.storage.busy_timeout_ms);
                println!("  Lock timeout (ms):  {}", config.storage.lock_timeout_ms);
                println!();
                println!("[Ingest]");
                println!("  Recheck consent:    {}", config.ingest.recheck_consent);
                println!();
                println!("[Query]");
                println!("  Default limit:      {}", config.query.default_limit);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
