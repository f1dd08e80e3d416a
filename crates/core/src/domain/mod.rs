// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;
pub mod lease;
pub mod queue;
pub mod result;

// Re-exports
pub use error::DomainError;
pub use job::{Job, JobId};
pub use lease::{Lease, ReceiptToken};
pub use queue::{QueueId, QueueRoutes};
pub use result::{AnalysisResult, Entity, EntityLabel, JobResult, SentimentScore};
