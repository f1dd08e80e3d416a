// Content Fetcher Port
// Resolves a source locator to plain text

use async_trait::async_trait;
use thiserror::Error;

/// Fetch errors
///
/// Every variant is treated as transient by the worker: the job is left
/// unacknowledged and retried after its lease expires.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Could not extract content: {0}")]
    Parse(String),
}

/// Content fetcher trait
///
/// Implementations must return within the lease window and report every
/// non-success outcome as a `FetchError`.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock fetcher behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always return this text
        Text(String),
        /// Always fail with an HTTP status
        Status(u16),
        /// Always fail with a network error
        Network(String),
    }

    /// Mock Content Fetcher for testing
    pub struct MockContentFetcher {
        default: Arc<Mutex<MockBehavior>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockContentFetcher {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                default: Arc::new(Mutex::new(behavior)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_text(text: impl Into<String>) -> Self {
            Self::new(MockBehavior::Text(text.into()))
        }

        pub fn new_status(status: u16) -> Self {
            Self::new(MockBehavior::Status(status))
        }

        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.default.lock().unwrap() = behavior;
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ContentFetcher for MockContentFetcher {
        async fn fetch(&self, locator: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(locator.to_string());

            let behavior = self.default.lock().unwrap().clone();
            match behavior {
                MockBehavior::Text(text) => Ok(text),
                MockBehavior::Status(code) => Err(FetchError::Status(code)),
                MockBehavior::Network(msg) => Err(FetchError::Network(msg)),
            }
        }
    }
}
