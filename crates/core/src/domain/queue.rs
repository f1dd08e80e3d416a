// Queue Domain Model

/// Queue identifier (a name; the transport decides what it maps to)
pub type QueueId = String;

/// The two logical queues a worker talks to
///
/// Direction naming follows `x_y`: messages flow from x to y.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRoutes {
    /// manager -> workers (jobs)
    pub input: QueueId,
    /// workers -> manager (results)
    pub output: QueueId,
}

impl QueueRoutes {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

impl Default for QueueRoutes {
    fn default() -> Self {
        Self::new("manager_workers_queue", "workers_manager_queue")
    }
}
