//! Delivery Guarantee Integration Tests
//!
//! Worker loop against the SQLite queue: at-least-once delivery across a
//! crash, acknowledge-after-publish ordering, poison messages.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sentiq_core::application::worker::constants::DEFAULT_LEASE_DURATION;
use sentiq_core::application::{AnalysisPipeline, IterationOutcome, Worker, WorkerConfig};
use sentiq_core::codec;
use sentiq_core::domain::{AnalysisResult, EntityLabel, Job, Lease, QueueRoutes, SentimentScore};
use sentiq_core::port::analyzer::mocks::MockAnalyzer;
use sentiq_core::port::content_fetcher::mocks::{MockBehavior, MockContentFetcher};
use sentiq_core::port::id_provider::mocks::SequentialIdProvider;
use sentiq_core::port::time_provider::mocks::MockTimeProvider;
use sentiq_core::port::{Analyzer, Delivery, QueueClient, QueueError};
use sentiq_infra_nlp::LexiconBackend;
use sentiq_infra_sqlite::{create_pool, run_migrations, SqliteQueueClient};

const INPUT: &str = "manager_workers_queue";
const OUTPUT: &str = "workers_manager_queue";

/// Forwards to the SQLite queue, records the call order and can drop
/// acknowledgements on the floor
struct RecordingQueue {
    inner: Arc<SqliteQueueClient>,
    log: Mutex<Vec<String>>,
    failing_acknowledges: Mutex<usize>,
}

impl RecordingQueue {
    fn new(inner: Arc<SqliteQueueClient>) -> Self {
        Self {
            inner,
            log: Mutex::new(Vec::new()),
            failing_acknowledges: Mutex::new(0),
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn fail_next_acknowledges(&self, count: usize) {
        *self.failing_acknowledges.lock().unwrap() = count;
    }
}

#[async_trait]
impl QueueClient for RecordingQueue {
    async fn receive(
        &self,
        queue: &str,
        lease_duration: Duration,
    ) -> Result<Option<Delivery>, QueueError> {
        let delivery = self.inner.receive(queue, lease_duration).await?;
        if delivery.is_some() {
            self.log.lock().unwrap().push(format!("receive:{}", queue));
        }
        Ok(delivery)
    }

    async fn acknowledge(&self, queue: &str, lease: &Lease) -> Result<(), QueueError> {
        {
            let mut failing = self.failing_acknowledges.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(QueueError::Transport("connection lost".to_string()));
            }
        }
        self.inner.acknowledge(queue, lease).await?;
        self.log.lock().unwrap().push(format!("acknowledge:{}", queue));
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: &str) -> Result<(), QueueError> {
        self.inner.publish(queue, payload).await?;
        self.log.lock().unwrap().push(format!("publish:{}", queue));
        Ok(())
    }
}

struct Setup {
    time: Arc<MockTimeProvider>,
    sqlite: Arc<SqliteQueueClient>,
}

async fn setup() -> Setup {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let time = Arc::new(MockTimeProvider::new(1_700_000_000_000));
    let sqlite = Arc::new(SqliteQueueClient::new(
        pool,
        time.clone(),
        Arc::new(SequentialIdProvider::new("id")),
    ));
    sqlite.ensure_queue(INPUT).await.unwrap();
    sqlite.ensure_queue(OUTPUT).await.unwrap();

    Setup { time, sqlite }
}

fn worker(
    setup: &Setup,
    queue: Arc<dyn QueueClient>,
    fetcher: Arc<MockContentFetcher>,
    analyzer: Arc<dyn Analyzer>,
) -> Worker {
    Worker::new(
        "worker-it",
        QueueRoutes::new(INPUT, OUTPUT),
        WorkerConfig::default(),
        queue,
        fetcher,
        analyzer,
        setup.time.clone(),
    )
}

fn fixed_analysis(score: u8) -> Arc<dyn Analyzer> {
    Arc::new(MockAnalyzer::new(AnalysisResult {
        sentiment: SentimentScore::new(score).unwrap(),
        entities: Vec::new(),
    }))
}

async fn drain(queue: &SqliteQueueClient, name: &str) -> Vec<String> {
    let mut bodies = Vec::new();
    while let Some(delivery) = queue.receive(name, Duration::from_secs(30)).await.unwrap() {
        queue.acknowledge(name, &delivery.lease).await.unwrap();
        bodies.push(delivery.body);
    }
    bodies
}

/// End-to-end: job in, result out, input retired only after publish
#[tokio::test]
async fn test_end_to_end_over_sqlite() {
    let setup = setup().await;
    let recording = Arc::new(RecordingQueue::new(setup.sqlite.clone()));
    let worker = worker(
        &setup,
        recording.clone(),
        Arc::new(MockContentFetcher::new_text("Good news everyone.")),
        fixed_analysis(3),
    );

    setup
        .sqlite
        .publish(INPUT, "job-42|http://example.test/page")
        .await
        .unwrap();

    let outcome = worker.process_next_job().await.unwrap();
    assert_eq!(
        outcome,
        IterationOutcome::Completed {
            job_id: "job-42".to_string()
        }
    );
    assert_eq!(
        recording.log(),
        vec![
            format!("receive:{}", INPUT),
            format!("publish:{}", OUTPUT),
            format!("acknowledge:{}", INPUT),
        ]
    );
    assert_eq!(setup.sqlite.depth(INPUT).await.unwrap().total(), 0);
    assert_eq!(
        drain(&setup.sqlite, OUTPUT).await,
        vec!["job-42|3|[]|Good news everyone."]
    );
}

/// At-least-once: a worker that dies after receive loses nothing
#[tokio::test]
async fn test_job_survives_worker_crash() {
    let setup = setup().await;
    let job = Job::new("job-7", "https://example.test/story").unwrap();
    setup
        .sqlite
        .publish(INPUT, &codec::encode_job(&job))
        .await
        .unwrap();

    // "Crashed" worker: leases the job and never comes back
    let crashed = setup
        .sqlite
        .receive(INPUT, DEFAULT_LEASE_DURATION)
        .await
        .unwrap()
        .unwrap();
    drop(crashed);

    let fetcher = Arc::new(MockContentFetcher::new_text("Recovered story."));
    let survivor = worker(&setup, setup.sqlite.clone(), fetcher.clone(), fixed_analysis(2));

    // Still leased by the dead worker
    assert_eq!(
        survivor.process_next_job().await.unwrap(),
        IterationOutcome::Idle
    );

    setup.time.advance(DEFAULT_LEASE_DURATION);
    let outcome = survivor.process_next_job().await.unwrap();
    assert_eq!(
        outcome,
        IterationOutcome::Completed {
            job_id: "job-7".to_string()
        }
    );
    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(
        drain(&setup.sqlite, OUTPUT).await,
        vec!["job-7|2|[]|Recovered story."]
    );
}

/// A crash between publish and acknowledge yields a duplicate, never a loss
#[tokio::test]
async fn test_lost_acknowledge_redelivers_and_duplicates_result() {
    let setup = setup().await;
    setup
        .sqlite
        .publish(INPUT, "job-1|http://example.test/a")
        .await
        .unwrap();

    let recording = Arc::new(RecordingQueue::new(setup.sqlite.clone()));
    recording.fail_next_acknowledges(1);
    let fetcher = Arc::new(MockContentFetcher::new_text("Same text."));
    let worker = worker(&setup, recording.clone(), fetcher.clone(), fixed_analysis(2));

    // Result is out, input still leased
    assert!(worker.process_next_job().await.is_err());
    assert_eq!(setup.sqlite.depth(OUTPUT).await.unwrap().total(), 1);
    assert_eq!(setup.sqlite.depth(INPUT).await.unwrap().in_flight, 1);

    // Same message comes back once the lease lapses
    setup.time.advance(DEFAULT_LEASE_DURATION);
    assert_eq!(
        worker.process_next_job().await.unwrap(),
        IterationOutcome::Completed {
            job_id: "job-1".to_string()
        }
    );
    assert_eq!(fetcher.call_count(), 2);
    assert_eq!(setup.sqlite.depth(INPUT).await.unwrap().total(), 0);
    assert_eq!(
        recording.log(),
        vec![
            format!("receive:{}", INPUT),
            format!("publish:{}", OUTPUT),
            format!("receive:{}", INPUT),
            format!("publish:{}", OUTPUT),
            format!("acknowledge:{}", INPUT),
        ]
    );

    let results = drain(&setup.sqlite, OUTPUT).await;
    assert_eq!(results, vec!["job-1|2|[]|Same text."; 2]);
}

/// Failed fetch leaves the job for redelivery; nothing is published
#[tokio::test]
async fn test_fetch_failure_redelivers_after_lease() {
    let setup = setup().await;
    setup
        .sqlite
        .publish(INPUT, "job-3|http://flaky.test/")
        .await
        .unwrap();

    let fetcher = Arc::new(MockContentFetcher::new(MockBehavior::Network(
        "connection reset".to_string(),
    )));
    let worker = worker(&setup, setup.sqlite.clone(), fetcher.clone(), fixed_analysis(1));

    assert!(matches!(
        worker.process_next_job().await.unwrap(),
        IterationOutcome::Abandoned { .. }
    ));
    assert_eq!(setup.sqlite.depth(OUTPUT).await.unwrap().total(), 0);
    assert_eq!(setup.sqlite.depth(INPUT).await.unwrap().in_flight, 1);

    setup.time.advance(DEFAULT_LEASE_DURATION);
    fetcher.set_behavior(MockBehavior::Text("Back.".to_string()));
    assert!(matches!(
        worker.process_next_job().await.unwrap(),
        IterationOutcome::Completed { .. }
    ));
    assert_eq!(drain(&setup.sqlite, OUTPUT).await, vec!["job-3|1|[]|Back."]);
}

/// Poison message: acknowledged once, never seen again
#[tokio::test]
async fn test_poison_message_is_dropped() {
    let setup = setup().await;
    setup.sqlite.publish(INPUT, "|missing-id").await.unwrap();
    setup
        .sqlite
        .publish(INPUT, "job-ok|http://example.test/ok")
        .await
        .unwrap();

    let fetcher = Arc::new(MockContentFetcher::new_text("Fine."));
    let worker = worker(&setup, setup.sqlite.clone(), fetcher, fixed_analysis(2));

    assert!(matches!(
        worker.process_next_job().await.unwrap(),
        IterationOutcome::Poisoned { .. }
    ));
    assert!(matches!(
        worker.process_next_job().await.unwrap(),
        IterationOutcome::Completed { .. }
    ));

    setup.time.advance(DEFAULT_LEASE_DURATION * 2);
    assert_eq!(
        worker.process_next_job().await.unwrap(),
        IterationOutcome::Idle
    );
    assert_eq!(drain(&setup.sqlite, OUTPUT).await, vec!["job-ok|2|[]|Fine."]);
}

/// Real analysis pipeline: longest sentence and entity filter reach the wire
#[tokio::test]
async fn test_lexicon_pipeline_result_on_the_wire() {
    let setup = setup().await;
    setup
        .sqlite
        .publish(INPUT, "job-9|http://example.test/news")
        .await
        .unwrap();

    let analyzer: Arc<dyn Analyzer> =
        Arc::new(AnalysisPipeline::new(Arc::new(LexiconBackend::default())));
    let fetcher = Arc::new(MockContentFetcher::new_text(
        "Bad day. Obama praised the wonderful and great progress in Paris on Monday.",
    ));
    let worker = worker(&setup, setup.sqlite.clone(), fetcher, analyzer);
    worker.process_next_job().await.unwrap();

    let results = drain(&setup.sqlite, OUTPUT).await;
    assert_eq!(results.len(), 1);

    let decoded = codec::decode_result(&results[0]).unwrap();
    assert_eq!(decoded.job_id, "job-9");
    assert_eq!(decoded.sentiment.value(), 4);
    let labels: Vec<(String, EntityLabel)> = decoded
        .entities
        .into_iter()
        .map(|e| (e.word, e.label))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("Obama".to_string(), EntityLabel::Person),
            ("Paris".to_string(), EntityLabel::Location),
        ]
    );
}
