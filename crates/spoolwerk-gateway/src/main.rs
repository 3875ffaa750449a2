// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk — command-line front end to the print gateway.
//
// Entry point. Initialises logging, loads configuration, builds the gateway,
// and runs one command.  Results go to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use spoolwerk_core::config::GatewayConfig;
use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_gateway::Gateway;
use spoolwerk_gateway::PrintRequest;
use spoolwerk_gateway::services::data_dir;

/// Spoolwerk - uniform management gateway for network print queues
#[derive(Parser, Debug)]
#[command(name = "spoolwerk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file (defaults to config.json in the data directory)
    #[arg(long, global = true, env = "SPOOLWERK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List printers (served from cache when possible)
    List {
        /// Bypass the cache and query the print server
        #[arg(long)]
        refresh: bool,
    },
    /// Show one printer by id
    Show { id: String },
    /// Print a file to a printer by id
    Print { id: String, file: PathBuf },
    /// Query printer status
    Status { id: String },
    /// List jobs in a printer's queue
    Queue { id: String },
    /// Cancel a job
    Cancel { id: String, job: u32 },
    /// Pause a job
    PauseJob { id: String, job: u32 },
    /// Resume a paused job
    ResumeJob { id: String, job: u32 },
    /// Pause a printer
    Pause { id: String },
    /// Resume a paused printer
    Resume { id: String },
    /// Cancel every job in a printer's queue
    ClearQueue { id: String },
    /// Drop the cached printer list
    ClearCache,
    /// Report whether the cache is empty, fresh or stale
    CacheState,
    /// Read one submission message per stdin line; write one outcome per line
    Consume,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!(kind = e.kind().as_str(), error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .or_else(|| data_dir::default_config_file(&data_dir::data_dir()));
    let config = GatewayConfig::load(config_path.as_deref())?;
    tracing::debug!(config = ?config, "configuration loaded");

    let gateway = Gateway::init(config)?;
    let manager = gateway.manager();

    match cli.command {
        Commands::List { refresh } => emit(&gateway.directory().list(refresh).await?),
        Commands::Show { id } => {
            let printer = gateway
                .directory()
                .get_printer_by_id(&id)
                .await?
                .ok_or(SpoolwerkError::PrinterNotFound(id))?;
            emit(&printer)
        }
        Commands::Print { id, file } => {
            let bytes = tokio::fs::read(&file).await?;
            let response = gateway
                .dispatcher()
                .print(PrintRequest {
                    printer_id: id,
                    file_base64: STANDARD.encode(bytes),
                })
                .await?;
            emit(&response)
        }
        Commands::Status { id } => emit(&manager.printer_status(&id).await?),
        Commands::Queue { id } => emit(&manager.queue(&id).await?),
        Commands::Cancel { id, job } => emit(&manager.cancel_job(&id, job).await?),
        Commands::PauseJob { id, job } => emit(&manager.pause_job(&id, job).await?),
        Commands::ResumeJob { id, job } => emit(&manager.resume_job(&id, job).await?),
        Commands::Pause { id } => emit(&manager.pause_printer(&id).await?),
        Commands::Resume { id } => emit(&manager.resume_printer(&id).await?),
        Commands::ClearQueue { id } => emit(&manager.clear_queue(&id).await?),
        Commands::ClearCache => {
            gateway.directory().clear_cache().await?;
            emit(&serde_json::json!({ "cleared": true }))
        }
        Commands::CacheState => emit(&gateway.directory().cache_state().await?),
        Commands::Consume => consume(&gateway).await,
    }
}

/// Line-delimited stand-in for a message-queue consumer.
async fn consume(gateway: &Gateway) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let outcome = gateway.submissions().handle_message(line.as_bytes()).await;
        println!("{}", serde_json::to_string(&outcome)?);
    }
    Ok(())
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
