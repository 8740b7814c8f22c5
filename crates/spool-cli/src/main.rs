//! spool CLI - operator interface to a Redis-backed work queue.
//!
//! Connection and queue settings come from `SPOOL_*` environment variables
//! (a `.env` file is loaded first); `--queue` overrides `SPOOL_QUEUE`.

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use spool_core::impls::RedisStore;
use spool_core::telemetry::init_tracing;
use spool_core::{Message, MessageHandler, MessageId, QueueConfig, StoreConfig, WorkQueue, WorkerGroup};

#[derive(Parser)]
#[command(name = "spool", about = "Reliable work queue over Redis")]
struct Cli {
    /// Queue name (defaults to SPOOL_QUEUE)
    #[arg(long, global = true)]
    queue: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enqueue a JSON payload
    Add {
        /// JSON payload
        payload: String,
    },
    /// Check out one message and print it
    Get {
        /// Acknowledge immediately after printing
        #[arg(long)]
        ack: bool,
    },
    /// Acknowledge a checked-out message
    Ack {
        id: String,
    },
    /// Return a checked-out message for retry
    Rollback {
        id: String,
    },
    /// Restore blocked and orphaned messages
    Repair,
    /// Show pending and blocked counts
    Status,
    /// Run workers that print and acknowledge every message until Ctrl-C
    Work {
        /// Number of concurrent workers
        #[arg(long, default_value_t = 1)]
        workers: usize,
    },
}

/// Prints each payload as one JSON line.
struct PrintHandler;

#[async_trait]
impl MessageHandler for PrintHandler {
    async fn handle(&self, message: &Message) -> Result<(), String> {
        let line = serde_json::to_string(message).map_err(|e| format!("json encode: {e}"))?;
        println!("{line}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = match cli.queue {
        Some(name) => QueueConfig::new(name).with_env_overrides()?,
        None => QueueConfig::from_env()?,
    };
    let store = StoreConfig::from_env()?;
    let queue = WorkQueue::connect(config, &store).await?;

    match cli.command {
        Command::Add { payload } => cmd_add(&queue, &payload).await,
        Command::Get { ack } => cmd_get(&queue, ack).await,
        Command::Ack { id } => {
            let removed = queue.ack(&MessageId::from(id)).await?;
            println!("{}", if removed { "acked" } else { "not found" });
            Ok(())
        }
        Command::Rollback { id } => {
            match queue.rollback(&MessageId::from(id)).await? {
                Some(decision) => println!("{}", decision.target_state()),
                None => println!("not in flight"),
            }
            Ok(())
        }
        Command::Repair => {
            let restored = queue.repair().await?;
            println!("restored {restored} blocked message(s)");
            Ok(())
        }
        Command::Status => {
            let status = queue.status().await?;
            println!("pending: {}", status.pending);
            println!("blocked: {}", status.blocked);
            Ok(())
        }
        Command::Work { workers } => cmd_work(queue, workers).await,
    }
}

async fn cmd_add(queue: &WorkQueue<RedisStore>, payload: &str) -> anyhow::Result<()> {
    let payload: serde_json::Value = serde_json::from_str(payload)?;
    let id = queue.add(&payload).await?;
    println!("{id}");
    Ok(())
}

async fn cmd_get(queue: &WorkQueue<RedisStore>, ack: bool) -> anyhow::Result<()> {
    let Some(message) = queue.get().await? else {
        println!("queue is empty");
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&message)?);
    if ack {
        queue.ack(message.id()).await?;
    }
    Ok(())
}

async fn cmd_work(queue: WorkQueue<RedisStore>, workers: usize) -> anyhow::Result<()> {
    anyhow::ensure!(workers > 0, "--workers must be at least 1");

    let group = WorkerGroup::spawn(workers, Arc::new(queue), Arc::new(PrintHandler));
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down workers");
    group.shutdown_and_join().await;
    Ok(())
}
