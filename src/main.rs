//! CLI entry point for thermolog.
//!
//! Subcommands:
//! - `serve`: run the ingest server and durable log writer
//! - `node`:  run a sensor node shipping readings to a server
//! - `stats`: aggregate the persisted log, read-only
//!
//! Settings come from an optional `config/<name>.toml`; the flags below
//! override the common fields.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thermolog::config::Settings;
use thermolog::server::{IngestServer, WriterHandle};
use thermolog::{logging, node, stats};
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "thermolog")]
#[command(about = "Environmental telemetry: sensor nodes, TCP ingest, durable CSV log", long_about = None)]
struct Cli {
    /// Config file name under config/ (without extension)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingest server
    Serve {
        /// Listening port
        #[arg(short, long)]
        port: Option<u16>,

        /// Path of the append-only log
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Run a sensor node
    Node {
        /// Server hostname or address
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Acquisition method: gpio, serial or sim
        #[arg(short, long)]
        method: Option<String>,

        /// Location label stamped on readings
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Summarize the persisted log
    Stats {
        /// Path of the log to read
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::new(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, log } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(log) = log {
                settings.server.log_path = log.display().to_string();
            }
            logging::init(&settings.log_level).ok();
            serve(settings).await
        }
        Commands::Node {
            host,
            port,
            method,
            location,
        } => {
            if let Some(host) = host {
                settings.node.server_addr = host;
            }
            if let Some(port) = port {
                settings.node.server_port = port;
            }
            if let Some(method) = method {
                settings.node.method = method;
            }
            if let Some(location) = location {
                settings.node.location = location;
            }
            logging::init(&settings.log_level).ok();
            run_node(settings).await
        }
        Commands::Stats { log } => {
            let path = log.unwrap_or_else(|| PathBuf::from(&settings.server.log_path));
            let (summaries, skipped) = stats::summarize(&path)?;
            print!("{}", stats::render(&summaries, skipped));
            Ok(())
        }
    }
}

/// Run the ingest pipeline: writer task, accept loop, graceful drain on
/// ctrl-c.
async fn serve(settings: Settings) -> Result<()> {
    let writer = WriterHandle::spawn(PathBuf::from(&settings.server.log_path));
    let server = IngestServer::bind(&settings.server, writer.sender()).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received");
            let _ = shutdown_tx.send(true);
        }
    });

    server.run(shutdown_rx).await?;

    // stop sentinel goes in behind any queued rows; writer drains then exits
    writer.shutdown().await;
    info!("server stopped");
    Ok(())
}

async fn run_node(settings: Settings) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received");
            let _ = shutdown_tx.send(true);
        }
    });

    node::run(settings.node, shutdown_rx).await?;
    Ok(())
}
