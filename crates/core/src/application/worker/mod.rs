// Worker - lease, fetch, analyze, publish, acknowledge loop

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::codec::{self, CodecError};
use crate::domain::{JobId, JobResult, QueueRoutes};
use crate::error::Result;
use crate::port::{Analyzer, ContentFetcher, Delivery, QueueClient, TimeProvider};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where a job is in its processing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Leased,
    Fetching,
    Analyzing,
    Publishing,
    Acknowledging,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Idle => "IDLE",
            WorkerState::Leased => "LEASED",
            WorkerState::Fetching => "FETCHING",
            WorkerState::Analyzing => "ANALYZING",
            WorkerState::Publishing => "PUBLISHING",
            WorkerState::Acknowledging => "ACKNOWLEDGING",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single loop iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Input queue had nothing visible
    Idle,
    /// Result published, then the job acknowledged
    Completed { job_id: JobId },
    /// Payload could not be decoded; acknowledged and dropped
    Poisoned { message_id: String, reason: String },
    /// Processing failed at `stage`; left unacknowledged for redelivery
    Abandoned {
        job_id: JobId,
        stage: WorkerState,
        reason: String,
    },
}

/// Worker loop timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub lease_duration: Duration,
    pub idle_poll_interval: Duration,
    pub error_recovery_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            lease_duration: DEFAULT_LEASE_DURATION,
            idle_poll_interval: IDLE_POLL_INTERVAL,
            error_recovery_interval: ERROR_RECOVERY_SLEEP_DURATION,
        }
    }
}

/// Worker processes jobs from the input queue, one at a time
///
/// Invariant: a job is acknowledged only after its result has been
/// published. Any failure before that leaves the lease to expire so the
/// queue redelivers the job.
pub struct Worker {
    worker_id: String,
    routes: QueueRoutes,
    config: WorkerConfig,
    queue: Arc<dyn QueueClient>,
    fetcher: Arc<dyn ContentFetcher>,
    analyzer: Arc<dyn Analyzer>,
    time_provider: Arc<dyn TimeProvider>, // For deterministic testing
}

impl Worker {
    pub fn new(
        worker_id: impl Into<String>,
        routes: QueueRoutes,
        config: WorkerConfig,
        queue: Arc<dyn QueueClient>,
        fetcher: Arc<dyn ContentFetcher>,
        analyzer: Arc<dyn Analyzer>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            routes,
            config,
            queue,
            fetcher,
            analyzer,
            time_provider,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Run worker loop with graceful shutdown support
    ///
    /// Shutdown is only observed between iterations; an in-flight job runs
    /// to completion (or failure) first.
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(
            worker_id = %self.worker_id,
            input_queue = %self.routes.input,
            output_queue = %self.routes.output,
            "Worker started"
        );

        loop {
            if shutdown.is_shutdown() {
                info!(worker_id = %self.worker_id, "Worker shutting down");
                break;
            }

            match self.process_next_job().await {
                Ok(IterationOutcome::Idle) => {
                    if shutdown.sleep(self.config.idle_poll_interval).await {
                        info!(worker_id = %self.worker_id, "Worker interrupted during idle");
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!(worker_id = %self.worker_id, error = %e, "Worker iteration failed");
                    if shutdown.sleep(self.config.error_recovery_interval).await {
                        info!(worker_id = %self.worker_id, "Worker interrupted during error recovery");
                        break;
                    }
                }
            }
        }

        info!(worker_id = %self.worker_id, "Worker stopped");
        Ok(())
    }

    /// Run one iteration of the loop
    ///
    /// Collaborator failures (fetch, analysis, publish) are reported as
    /// `Abandoned`. Only queue transport errors on receive/acknowledge
    /// come back as `Err`.
    pub async fn process_next_job(&self) -> Result<IterationOutcome> {
        let delivery = match self
            .queue
            .receive(&self.routes.input, self.config.lease_duration)
            .await?
        {
            Some(d) => d,
            None => return Ok(IterationOutcome::Idle),
        };

        let message_id = delivery.lease.message_id.clone();
        debug!(
            worker_id = %self.worker_id,
            message_id = %message_id,
            state = %WorkerState::Leased,
            "Message leased"
        );
        if delivery.is_redelivery() {
            warn!(
                message_id = %message_id,
                receive_count = delivery.receive_count,
                "Processing redelivered message"
            );
        }

        let job = match codec::decode_job(&delivery.body) {
            Ok(job) => job,
            Err(e) => return self.drop_poison_message(&delivery, e).await,
        };

        info!(job_id = %job.id, locator = %job.source_locator, "Processing job");

        let text = match self.fetcher.fetch(&job.source_locator).await {
            Ok(text) => text,
            Err(e) => return Ok(self.abandon(&job.id, WorkerState::Fetching, e.to_string())),
        };

        let analysis = match self.analyze_isolated(&text).await {
            Ok(analysis) => analysis,
            Err(reason) => return Ok(self.abandon(&job.id, WorkerState::Analyzing, reason)),
        };

        let result = JobResult::new(job.id.clone(), analysis, text);
        let payload = codec::encode_result(&result);

        if delivery.lease.is_expired(self.time_provider.now_millis()) {
            // Still publish: the duplicate is preferable to a lost result
            warn!(
                job_id = %job.id,
                message_id = %message_id,
                "Lease expired before publish, job may be processed twice"
            );
        }

        if let Err(e) = self.queue.publish(&self.routes.output, &payload).await {
            return Ok(self.abandon(&job.id, WorkerState::Publishing, e.to_string()));
        }

        debug!(job_id = %job.id, state = %WorkerState::Acknowledging, "Result published");
        self.queue
            .acknowledge(&self.routes.input, &delivery.lease)
            .await?;

        info!(
            job_id = %job.id,
            sentiment = %result.sentiment,
            entities = result.entities.len(),
            "Job completed"
        );
        Ok(IterationOutcome::Completed { job_id: job.id })
    }

    /// Analyze on a separate task so a panicking backend fails the job,
    /// not the worker
    async fn analyze_isolated(
        &self,
        text: &str,
    ) -> std::result::Result<crate::domain::AnalysisResult, String> {
        let analyzer = Arc::clone(&self.analyzer);
        let text = text.to_string();

        match tokio::task::spawn(async move { analyzer.analyze(&text).await }).await {
            Ok(Ok(analysis)) => Ok(analysis),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_err) if join_err.is_panic() => {
                error!(error = ?join_err, "Analyzer panicked");
                Err("analyzer panicked".to_string())
            }
            Err(join_err) => Err(format!("analysis task cancelled: {}", join_err)),
        }
    }

    async fn drop_poison_message(
        &self,
        delivery: &Delivery,
        error: CodecError,
    ) -> Result<IterationOutcome> {
        let message_id = delivery.lease.message_id.clone();
        warn!(
            message_id = %message_id,
            error = %error,
            "Undecodable job payload, acknowledging and dropping"
        );

        self.queue
            .acknowledge(&self.routes.input, &delivery.lease)
            .await?;

        Ok(IterationOutcome::Poisoned {
            message_id,
            reason: error.to_string(),
        })
    }

    fn abandon(&self, job_id: &str, stage: WorkerState, reason: String) -> IterationOutcome {
        warn!(
            job_id = %job_id,
            stage = %stage,
            error = %reason,
            "Job abandoned, lease left to expire for redelivery"
        );
        IterationOutcome::Abandoned {
            job_id: job_id.to_string(),
            stage,
            reason,
        }
    }
}
