//! Sentiq Worker - Main Entry Point
//! Leases jobs from the input queue, publishes analysis results to the output queue

mod logging;
mod settings;

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

// Import workspace crates
use sentiq_core::application::worker::constants::SHUTDOWN_GRACE_PERIOD;
use sentiq_core::application::{shutdown_channel, AnalysisPipeline, Worker};
use sentiq_core::domain::EntityLabel;
use sentiq_core::port::id_provider::UuidProvider;
use sentiq_core::port::time_provider::SystemTimeProvider;
use sentiq_core::port::{Analyzer, ContentFetcher, QueueClient, TimeProvider};
use sentiq_infra_http::HttpContentFetcher;
use sentiq_infra_nlp::{Gazetteer, LexiconBackend, SentimentLexicon};
use sentiq_infra_sqlite::{
    create_pool, database_file, resolve_database_url, run_migrations, SqliteQueueClient,
};
use settings::Settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let _log_guard = logging::init()?;
    info!("Sentiq worker v{} starting...", VERSION);

    // 2. Load configuration
    let settings = Settings::load().context("Invalid configuration")?;
    let database_url = resolve_database_url(&settings.database_url);

    if let Some(parent) = database_file(&database_url).and_then(|f| f.parent().map(|p| p.to_path_buf())) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&parent)
                .await
                .with_context(|| format!("Cannot create database directory {}", parent.display()))?;
        }
    }

    info!(database_url = %database_url, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&database_url)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. Setup dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let sqlite_queue = SqliteQueueClient::new(pool, time_provider.clone(), Arc::new(UuidProvider))
        .with_max_receive_count(settings.max_receive_count);

    let routes = settings.routes();
    sqlite_queue
        .ensure_queue(&routes.input)
        .await
        .context("Input queue setup failed")?;
    sqlite_queue
        .ensure_queue(&routes.output)
        .await
        .context("Output queue setup failed")?;
    let queue: Arc<dyn QueueClient> = Arc::new(sqlite_queue);

    let fetcher: Arc<dyn ContentFetcher> = Arc::new(
        HttpContentFetcher::new(settings.fetch_timeout())
            .context("HTTP client setup failed")?
            .with_max_body_bytes(settings.fetch_max_body_bytes),
    );

    let mut gazetteer = Gazetteer::default();
    gazetteer.extend(EntityLabel::Person, &settings.gazetteer.persons);
    gazetteer.extend(EntityLabel::Location, &settings.gazetteer.locations);
    gazetteer.extend(EntityLabel::Organization, &settings.gazetteer.organizations);
    let backend = Arc::new(LexiconBackend::new(SentimentLexicon::default(), gazetteer));
    let analyzer: Arc<dyn Analyzer> = Arc::new(AnalysisPipeline::new(backend));

    // 5. Start workers
    info!(
        worker_count = settings.worker_count,
        input_queue = %routes.input,
        output_queue = %routes.output,
        lease_secs = settings.lease_duration_secs,
        "Starting workers..."
    );
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let handles: Vec<_> = (1..=settings.worker_count)
        .map(|n| {
            let worker = Worker::new(
                format!("worker-{}", n),
                routes.clone(),
                settings.worker_config(),
                queue.clone(),
                fetcher.clone(),
                analyzer.clone(),
                time_provider.clone(),
            );
            let shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                if let Err(e) = worker.run(shutdown).await {
                    error!(worker_id = %worker.worker_id(), error = ?e, "Worker failed");
                }
            })
        })
        .collect();

    info!("System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    wait_for_signal().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    match tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, join_all(handles)).await {
        Ok(results) => {
            for result in results.into_iter().filter_map(|r| r.err()) {
                error!(error = ?result, "Worker task ended abnormally");
            }
        }
        Err(_) => warn!(
            grace_secs = SHUTDOWN_GRACE_PERIOD.as_secs(),
            "Workers still busy after grace period; in-flight jobs will be redelivered"
        ),
    }

    info!("Shutdown complete.");
    Ok(())
}

/// Ctrl-C, or SIGTERM on unix
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate()).context("SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Ctrl-C handler")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.context("Ctrl-C handler")?;

    Ok(())
}
