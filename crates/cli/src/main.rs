//! Sentiq CLI - enqueue jobs, drain results and inspect queues

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};

use sentiq_core::codec;
use sentiq_core::domain::{Job, JobResult, QueueRoutes};
use sentiq_core::port::id_provider::UuidProvider;
use sentiq_core::port::time_provider::SystemTimeProvider;
use sentiq_core::port::{IdProvider, QueueClient};
use sentiq_infra_sqlite::{
    create_pool, database_file, resolve_database_url, run_migrations, SqliteQueueClient,
};

const DEFAULT_DATABASE_URL: &str = "~/.sentiq/queue.db";

/// Lease held on a result while it is printed and acknowledged
const RESULT_LEASE: Duration = Duration::from_secs(30);

/// Longest source text shown in the results table
const TEXT_PREVIEW_CHARS: usize = 60;

#[derive(Parser)]
#[command(name = "sentiq")]
#[command(about = "Sentiq queue operator CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite URL or file path of the queue database
    #[arg(long, env = "SENTIQ__DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Queue the workers read jobs from
    #[arg(long, env = "SENTIQ__INPUT_QUEUE", default_value = "manager_workers_queue")]
    input_queue: String,

    /// Queue the workers publish results to
    #[arg(long, env = "SENTIQ__OUTPUT_QUEUE", default_value = "workers_manager_queue")]
    output_queue: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Enqueue a job for each source URL
    Enqueue {
        /// Source URLs (http or https)
        #[arg(required = true)]
        locators: Vec<String>,

        /// Job id (only with a single URL; generated otherwise)
        #[arg(long)]
        job_id: Option<String>,
    },

    /// Receive and acknowledge published results
    Results {
        /// Stop after this many results
        #[arg(short = 'n', long, default_value = "100")]
        limit: usize,

        /// Print one JSON object per line instead of a table
        #[arg(long)]
        json: bool,

        /// Leave results on the queue (they reappear after the lease)
        #[arg(long)]
        keep: bool,
    },

    /// Show message counts per queue
    Stats,

    /// Delete every message in a queue
    Purge {
        /// Queue name
        queue: String,
    },
}

#[derive(Tabled)]
struct EnqueuedRow {
    job_id: String,
    locator: String,
    queue: String,
}

#[derive(Tabled)]
struct ResultRow {
    job_id: String,
    sentiment: u8,
    entities: String,
    text: String,
}

impl From<&JobResult> for ResultRow {
    fn from(result: &JobResult) -> Self {
        let mut text: String = result.source_text.chars().take(TEXT_PREVIEW_CHARS).collect();
        if result.source_text.chars().count() > TEXT_PREVIEW_CHARS {
            text.push('…');
        }
        Self {
            job_id: result.job_id.clone(),
            sentiment: result.sentiment.value(),
            entities: codec::render_entities(&result.entities),
            text,
        }
    }
}

#[derive(Tabled)]
struct QueueRow {
    queue: String,
    visible: i64,
    in_flight: i64,
}

async fn open_queue(database_url: &str) -> Result<SqliteQueueClient> {
    let url = resolve_database_url(database_url);
    if let Some(parent) = database_file(&url).and_then(|f| f.parent().map(|p| p.to_path_buf())) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&parent)
                .await
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
    }

    let pool = create_pool(&url)
        .await
        .with_context(|| format!("Failed to open {}", url))?;
    run_migrations(&pool).await.context("Migration failed")?;

    Ok(SqliteQueueClient::new(
        pool,
        Arc::new(SystemTimeProvider),
        Arc::new(UuidProvider),
    ))
}

async fn enqueue(
    queue: &SqliteQueueClient,
    routes: &QueueRoutes,
    locators: Vec<String>,
    job_id: Option<String>,
) -> Result<()> {
    if job_id.is_some() && locators.len() > 1 {
        anyhow::bail!("--job-id can only be used with a single URL");
    }

    queue.ensure_queue(&routes.input).await?;

    let ids = UuidProvider;
    let mut rows = Vec::with_capacity(locators.len());
    for locator in locators {
        let id = job_id.clone().unwrap_or_else(|| ids.generate_id());
        let job = Job::new(id, locator).context("Invalid job")?;
        queue.publish(&routes.input, &codec::encode_job(&job)).await?;
        rows.push(EnqueuedRow {
            job_id: job.id,
            locator: job.source_locator,
            queue: routes.input.clone(),
        });
    }

    println!(
        "{}",
        format!("✓ {} job(s) enqueued", rows.len()).green().bold()
    );
    println!();
    println!("{}", Table::new(rows));
    Ok(())
}

async fn drain_results(
    queue: &SqliteQueueClient,
    routes: &QueueRoutes,
    limit: usize,
    json: bool,
    keep: bool,
) -> Result<()> {
    queue.ensure_queue(&routes.output).await?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    while rows.len() < limit {
        let Some(delivery) = queue.receive(&routes.output, RESULT_LEASE).await? else {
            break;
        };

        match codec::decode_result(&delivery.body) {
            Ok(result) => {
                if json {
                    println!("{}", serde_json::to_string(&result)?);
                }
                rows.push(ResultRow::from(&result));
            }
            Err(e) => {
                skipped += 1;
                eprintln!(
                    "{} undecodable result {}: {}",
                    "⚠".yellow(),
                    delivery.lease.message_id,
                    e
                );
            }
        }

        if !keep {
            queue.acknowledge(&routes.output, &delivery.lease).await?;
        }
    }

    if json {
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", "No results available".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
    if skipped > 0 {
        println!("{}", format!("{} undecodable result(s) dropped", skipped).yellow());
    }
    Ok(())
}

async fn show_stats(queue: &SqliteQueueClient) -> Result<()> {
    let mut rows = Vec::new();
    for name in queue.list_queues().await? {
        let depth = queue.depth(&name).await?;
        rows.push(QueueRow {
            queue: name,
            visible: depth.visible,
            in_flight: depth.in_flight,
        });
    }

    println!("{}", "Queue Status".cyan().bold());
    println!();
    if rows.is_empty() {
        println!("{}", "No queues yet".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let routes = QueueRoutes::new(cli.input_queue, cli.output_queue);
    let queue = open_queue(&cli.database_url).await?;

    match cli.command {
        Commands::Enqueue { locators, job_id } => {
            enqueue(&queue, &routes, locators, job_id).await?;
        }

        Commands::Results { limit, json, keep } => {
            drain_results(&queue, &routes, limit, json, keep).await?;
        }

        Commands::Stats => {
            show_stats(&queue).await?;
        }

        Commands::Purge { queue: name } => {
            let removed = queue.purge(&name).await?;
            println!(
                "{}",
                format!("✓ {} message(s) removed from {}", removed, name)
                    .green()
                    .bold()
            );
        }
    }

    Ok(())
}
