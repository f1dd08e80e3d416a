// Application Layer - Use Cases and Business Logic

pub mod analysis;
pub mod worker;

// Re-exports
pub use analysis::AnalysisPipeline;
pub use worker::{
    shutdown_channel, IterationOutcome, ShutdownSender, ShutdownToken, Worker, WorkerConfig,
    WorkerState,
};
