// Analysis Pipeline - sentence selection and entity filtering over an NlpBackend
use crate::domain::{AnalysisResult, Entity, EntityLabel, SentimentScore};
use crate::port::{AnalysisError, Analyzer, NlpBackend, SentenceAnalysis};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Analysis pipeline
///
/// Turns raw per-sentence annotations into a single result:
/// - sentiment: the score of the longest sentence by character length,
///   ties going to the first such sentence
/// - entities: PERSON / LOCATION / ORGANIZATION tokens in text order;
///   every other tag is dropped
pub struct AnalysisPipeline {
    backend: Arc<dyn NlpBackend>,
}

impl AnalysisPipeline {
    pub fn new(backend: Arc<dyn NlpBackend>) -> Self {
        Self { backend }
    }

    /// Pick the sentiment of the longest sentence
    ///
    /// Zero-length sentences never win, so an empty list (or a list of
    /// empty sentences) yields `SentimentScore::UNSCORED`.
    pub fn select_sentiment(sentences: &[SentenceAnalysis]) -> SentimentScore {
        let mut longest = 0;
        let mut selected = SentimentScore::UNSCORED;

        for sentence in sentences {
            let length = sentence.text.chars().count();
            if length > longest {
                longest = length;
                selected = sentence.sentiment;
            }
        }

        selected
    }

    /// Keep only tokens tagged with one of the published entity labels
    pub fn collect_entities(sentences: &[SentenceAnalysis]) -> Vec<Entity> {
        sentences
            .iter()
            .flat_map(|sentence| sentence.tokens.iter())
            .filter(|token| !token.word.is_empty())
            .filter_map(|token| {
                EntityLabel::from_tag(&token.tag).map(|label| Entity::new(token.word.clone(), label))
            })
            .collect()
    }
}

#[async_trait]
impl Analyzer for AnalysisPipeline {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        if text.trim().is_empty() {
            debug!("Empty text, returning default analysis");
            return Ok(AnalysisResult::default());
        }

        let sentences = self.backend.annotate(text).await?;
        let result = AnalysisResult {
            sentiment: Self::select_sentiment(&sentences),
            entities: Self::collect_entities(&sentences),
        };

        debug!(
            sentences = sentences.len(),
            sentiment = %result.sentiment,
            entities = result.entities.len(),
            "Text analyzed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::nlp_backend::mocks::MockNlpBackend;
    use crate::port::TaggedToken;

    fn sentence(text: &str, score: u8, tokens: Vec<TaggedToken>) -> SentenceAnalysis {
        SentenceAnalysis {
            text: text.to_string(),
            sentiment: SentimentScore::new(score).unwrap(),
            tokens,
        }
    }

    #[tokio::test]
    async fn test_longest_sentence_wins() {
        let backend = Arc::new(MockNlpBackend::new(vec![
            sentence("A good day.", 3, Vec::new()),
            sentence("Wonderful things happened today in the city.", 4, Vec::new()),
        ]));
        let pipeline = AnalysisPipeline::new(backend);

        let result = pipeline
            .analyze("A good day. Wonderful things happened today in the city.")
            .await
            .unwrap();
        assert_eq!(result.sentiment.value(), 4);
    }

    #[test]
    fn test_tie_goes_to_first_sentence() {
        let sentences = vec![
            sentence("abcd.", 1, Vec::new()),
            sentence("wxyz.", 3, Vec::new()),
        ];
        assert_eq!(AnalysisPipeline::select_sentiment(&sentences).value(), 1);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 6 chars / 12 bytes vs 8 chars / 8 bytes
        let sentences = vec![
            sentence("ééééé.", 0, Vec::new()),
            sentence("abcdefg.", 4, Vec::new()),
        ];
        assert_eq!(AnalysisPipeline::select_sentiment(&sentences).value(), 4);
    }

    #[test]
    fn test_entity_filter_keeps_only_published_labels() {
        let sentences = vec![sentence(
            "Obama visited Paris on Monday with friends.",
            2,
            vec![
                TaggedToken::new("Obama", "PERSON"),
                TaggedToken::new("Monday", "DATE"),
                TaggedToken::new("Paris", "LOCATION"),
                TaggedToken::new("Eurovision", "MISC"),
                TaggedToken::new("friends", "O"),
            ],
        )];

        let entities = AnalysisPipeline::collect_entities(&sentences);
        assert_eq!(
            entities,
            vec![
                Entity::new("Obama", EntityLabel::Person),
                Entity::new("Paris", EntityLabel::Location),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_text_skips_backend() {
        let backend = Arc::new(MockNlpBackend::new(vec![sentence("ignored", 4, Vec::new())]));
        let pipeline = AnalysisPipeline::new(backend.clone());

        let result = pipeline.analyze("   ").await.unwrap();
        assert_eq!(result, AnalysisResult::default());
        assert_eq!(backend.call_count(), 0);
    }
}
