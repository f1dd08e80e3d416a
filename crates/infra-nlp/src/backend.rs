// Lexicon NlpBackend Implementation

use crate::gazetteer::Gazetteer;
use crate::lexicon::SentimentLexicon;
use crate::text::{split_sentences, tokenize};
use async_trait::async_trait;
use sentiq_core::port::{AnalysisError, NlpBackend, SentenceAnalysis, TaggedToken};
use tracing::debug;

/// Tag for tokens outside any known category
pub const OUTSIDE_TAG: &str = "O";

const DATE_WORDS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "january",
    "february", "march", "april", "june", "july", "august", "september", "october", "november",
    "december", "today", "yesterday", "tomorrow",
];

/// Rule-based backend: sentence split, lexicon sentiment, gazetteer tags
///
/// Besides PERSON / LOCATION / ORGANIZATION it also emits DATE and NUMBER
/// tags; filtering those out is the analysis pipeline's job.
#[derive(Default)]
pub struct LexiconBackend {
    lexicon: SentimentLexicon,
    gazetteer: Gazetteer,
}

impl LexiconBackend {
    pub fn new(lexicon: SentimentLexicon, gazetteer: Gazetteer) -> Self {
        Self { lexicon, gazetteer }
    }

    fn annotate_sentence(&self, sentence: &str) -> SentenceAnalysis {
        let words = tokenize(sentence);
        let labels = self.gazetteer.tag(&words);

        let tokens = words
            .iter()
            .zip(labels)
            .map(|(word, label)| {
                let tag = match label {
                    Some(label) => label.as_str(),
                    None => fallback_tag(word),
                };
                TaggedToken::new(*word, tag)
            })
            .collect();

        SentenceAnalysis {
            text: sentence.to_string(),
            sentiment: self.lexicon.classify(&words),
            tokens,
        }
    }
}

fn fallback_tag(word: &str) -> &'static str {
    if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        && word.chars().any(|c| c.is_ascii_digit())
    {
        "NUMBER"
    } else if DATE_WORDS.contains(&word.to_lowercase().as_str()) {
        "DATE"
    } else {
        OUTSIDE_TAG
    }
}

#[async_trait]
impl NlpBackend for LexiconBackend {
    async fn annotate(&self, text: &str) -> Result<Vec<SentenceAnalysis>, AnalysisError> {
        let sentences: Vec<SentenceAnalysis> = split_sentences(text)
            .into_iter()
            .map(|sentence| self.annotate_sentence(sentence))
            .collect();

        debug!(sentences = sentences.len(), "Text annotated");
        Ok(sentences)
    }
}
