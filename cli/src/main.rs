//! MeshIndex CLI.
//!
//! # Commands
//! ```text
//! meshindex collect --node <ws-url> --listen <addr> [--config <file.json>] [--log-json]
//! meshindex decode  --hex <raw-tx> [--hex <raw-tx> ...] [--summary]
//! meshindex info
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meshindex_collector::{Collector, CollectorBuilder, NodeConnector, Resync, WsNodeConnector};
use meshindex_core::Listener;
use meshindex_storage::InMemoryStorage;
use serde_json::json;
use tracing::{info, warn};

mod api;
mod logging;
mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(
    name = "meshindex",
    about = "Spacemesh node indexer: stream collector and transaction decoder",
    long_about = "
MeshIndex keeps a live subscription to a Spacemesh node, forwards layers,
accounts, rewards and receipts to storage, and exposes an admin HTTP surface
for on-demand resynchronisation.

ENVIRONMENT VARIABLES:
  MESHINDEX_NODE_URL   Node WebSocket endpoint
  MESHINDEX_LISTEN     Admin HTTP listen address
  RUST_LOG             Log filter, overrides the configured level
",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collector and the admin HTTP server until Ctrl-C
    Collect {
        /// Node WebSocket endpoint
        #[arg(long, env = "MESHINDEX_NODE_URL")]
        node: Option<String>,
        /// Admin HTTP listen address
        #[arg(long, env = "MESHINDEX_LISTEN")]
        listen: Option<String>,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Log level (trace, debug, info, warn, error)
        #[arg(long)]
        log_level: Option<String>,
        /// Emit JSON structured logs
        #[arg(long)]
        log_json: bool,
    },

    /// Decode raw transactions given as hex
    Decode {
        /// Raw transaction bytes, hex encoded (0x prefix optional)
        #[arg(long = "hex", num_args = 1.., required = true)]
        raw: Vec<String>,
        /// Print a human-readable summary instead of JSON
        #[arg(long)]
        summary: bool,
    },

    /// Show version and default settings
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            node,
            listen,
            config,
            log_level,
            log_json,
        } => cmd_collect(node, listen, config, log_level, log_json).await,
        Commands::Decode { raw, summary } => cmd_decode(&raw, summary),
        Commands::Info => cmd_info(),
    }
}

async fn cmd_collect(
    node: Option<String>,
    listen: Option<String>,
    config: Option<PathBuf>,
    log_level: Option<String>,
    log_json: bool,
) -> Result<()> {
    let mut settings = match config {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    if let Some(level) = log_level {
        settings.log.level = level;
    }
    if log_json {
        settings.log.format = logging::LogFormat::Json;
    }
    logging::init_tracing(&settings.log);

    if listen.is_some() {
        settings.listen = listen;
    }
    let mut builder = CollectorBuilder::from_config(settings.collector.clone());
    if let Some(url) = node {
        builder = builder.node_url(url);
    }
    let config = builder.build_config();

    let storage: Arc<dyn Listener> = Arc::new(InMemoryStorage::new());
    let connector: Arc<dyn NodeConnector> = Arc::new(WsNodeConnector::from_config(&config));
    let resync = Resync::new(connector.clone(), storage.clone(), config.resync_batch_size);
    let collector = Arc::new(Collector::new(config, connector, storage));

    let app = api::router(api::AdminState {
        resync,
        collector: collector.clone(),
    });
    let addr = settings.listen();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding admin listener on {addr}"))?;
    info!(listen = %addr, "admin server listening");

    tokio::select! {
        _ = collector.run() => {}
        served = axum::serve(listener, app) => {
            served.context("admin server failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "ctrl-c handler failed");
            }
            info!("shutting down");
        }
    }

    let metrics = collector.metrics();
    info!(
        sessions = metrics.sessions_started,
        online = metrics.sessions_online,
        delivered = metrics.messages_delivered,
        "collector stopped"
    );
    Ok(())
}

fn cmd_decode(raw: &[String], summary: bool) -> Result<()> {
    let bytes = raw
        .iter()
        .map(|h| {
            hex::decode(h.trim().trim_start_matches("0x"))
                .with_context(|| format!("invalid hex input {h:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let results = meshindex_codec::decode_batch(bytes.iter().map(Vec::as_slice));
    let mut failed = 0usize;

    if !summary {
        let out: Vec<_> = results
            .iter()
            .map(|r| match r {
                Ok(tx) => json!({ "ok": tx }),
                Err(e) => {
                    failed += 1;
                    json!({ "error": e.to_string(), "field": e.field() })
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (i, result) in results.iter().enumerate() {
            if i > 0 {
                println!();
            }
            match result {
                Ok(tx) => {
                    println!("Template:   {}", tx.template);
                    println!("Method:     {}", tx.method);
                    println!("Principal:  {}", tx.principal);
                    println!("Nonce:      {}", tx.nonce);
                    println!("Gas price:  {}", tx.gas_price);
                    println!("Signatures: {}", tx.signatures);
                    if let Some(spawned) = tx.contents.spawn_principal() {
                        println!("Spawns:     {spawned}");
                    }
                    println!("Contents:   {}", serde_json::to_string(&tx.contents)?);
                }
                Err(e) => {
                    failed += 1;
                    println!("Error:      {e}");
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} transactions failed to decode", results.len());
    }
    Ok(())
}

fn cmd_info() -> Result<()> {
    let settings = Settings::default();
    println!("MeshIndex v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Defaults:");
    println!("  node url:         {}", settings.collector.node_url);
    println!("  admin listen:     {}", settings.listen());
    println!("  reconnect delay:  {} ms", settings.collector.reconnect.initial_ms);
    println!("  stream buffer:    {}", settings.collector.stream_buffer);
    println!("  request timeout:  {} ms", settings.collector.request_timeout_ms);
    println!("  resync batch:     {} layers", settings.collector.resync_batch_size);
    println!();
    println!("Admin routes:");
    println!("  GET /status");
    println!("  GET /sync/layer/:layer");
    println!("  GET /sync/epoch/:epoch");
    println!("  GET /sync/from/:timestamp");
    println!("  GET /stats/epoch/:epoch");
    Ok(())
}
