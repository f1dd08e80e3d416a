// Port Layer - Interfaces for external dependencies

pub mod analyzer;
pub mod content_fetcher;
pub mod id_provider; // For deterministic testing
pub mod nlp_backend;
pub mod queue_client;
pub mod time_provider;

// Re-exports
pub use analyzer::{AnalysisError, Analyzer};
pub use content_fetcher::{ContentFetcher, FetchError};
pub use id_provider::IdProvider;
pub use nlp_backend::{NlpBackend, SentenceAnalysis, TaggedToken};
pub use queue_client::{Delivery, QueueClient, QueueError};
pub use time_provider::TimeProvider;
