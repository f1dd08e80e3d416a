// Analyzer Port
// Sentiment score + named entities for a piece of text

use crate::domain::AnalysisResult;
use async_trait::async_trait;
use thiserror::Error;

/// Analysis errors (treated as transient by the worker)
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("NLP backend failed: {0}")]
    Backend(String),
}

/// Analyzer trait
///
/// Implementations:
/// - AnalysisPipeline: applies sentence selection and entity filtering on
///   top of an `NlpBackend`
/// - mocks::MockAnalyzer: canned results
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Score sentiment and extract PERSON / LOCATION / ORGANIZATION entities
    ///
    /// Empty input yields the default score, not an error.
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock Analyzer returning a fixed result (or failing)
    pub struct MockAnalyzer {
        result: Arc<Mutex<Option<AnalysisResult>>>,
        inputs: Arc<Mutex<Vec<String>>>,
    }

    impl MockAnalyzer {
        pub fn new(result: AnalysisResult) -> Self {
            Self {
                result: Arc::new(Mutex::new(Some(result))),
                inputs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_failing() -> Self {
            Self {
                result: Arc::new(Mutex::new(None)),
                inputs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn inputs(&self) -> Vec<String> {
            self.inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Analyzer for MockAnalyzer {
        async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
            self.inputs.lock().unwrap().push(text.to_string());
            self.result
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| AnalysisError::Backend("mock analyzer failure".to_string()))
        }
    }
}
