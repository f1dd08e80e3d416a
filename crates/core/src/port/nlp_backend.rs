// NLP Backend Port
// Raw per-sentence annotations; selection policy lives in the application layer

use super::analyzer::AnalysisError;
use crate::domain::SentimentScore;
use async_trait::async_trait;

/// A token with whatever tag the backend's tagger produced ("PERSON", "DATE", "O", ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }
}

/// Annotation of one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceAnalysis {
    /// Sentence text as the backend split it
    pub text: String,
    pub sentiment: SentimentScore,
    pub tokens: Vec<TaggedToken>,
}

/// NLP backend trait
///
/// Splits text into sentences, classifies each sentence's sentiment and
/// tags each token. Implementations return every tag they produce; callers
/// decide which categories to keep.
#[async_trait]
pub trait NlpBackend: Send + Sync {
    async fn annotate(&self, text: &str) -> Result<Vec<SentenceAnalysis>, AnalysisError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock backend returning canned sentences
    pub struct MockNlpBackend {
        sentences: Arc<Mutex<Vec<SentenceAnalysis>>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockNlpBackend {
        pub fn new(sentences: Vec<SentenceAnalysis>) -> Self {
            Self {
                sentences: Arc::new(Mutex::new(sentences)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl NlpBackend for MockNlpBackend {
        async fn annotate(&self, _text: &str) -> Result<Vec<SentenceAnalysis>, AnalysisError> {
            *self.call_count.lock().unwrap() += 1;
            Ok(self.sentences.lock().unwrap().clone())
        }
    }
}
