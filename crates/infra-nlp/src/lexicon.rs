// Sentiment lexicon

use sentiq_core::domain::SentimentScore;
use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "wonderful", "amazing", "awesome", "fantastic", "happy",
    "love", "loved", "like", "best", "better", "win", "wins", "won", "success", "successful",
    "positive", "beautiful", "brilliant", "delight", "delighted", "glad", "hope", "nice",
    "perfect", "pleased", "progress", "rally", "record", "strong", "growth", "gain", "gains",
    "celebrate", "celebrates", "breakthrough", "improve", "improved", "safe", "peace",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "worst", "worse", "sad", "hate", "hated", "poor",
    "fail", "fails", "failed", "failure", "loss", "losses", "lose", "lost", "crisis", "crash",
    "negative", "angry", "fear", "fears", "war", "attack", "attacks", "killed", "death", "dead",
    "disaster", "decline", "drop", "drops", "weak", "scandal", "fraud", "collapse", "threat",
    "violence", "protest", "protests", "injured", "down",
];

const NEGATORS: &[&str] = &["not", "no", "never", "none", "nobody", "nothing", "neither", "nor"];

/// Word-polarity lexicon producing a five-class sentiment
/// (0 very negative, 2 neutral, 4 very positive)
pub struct SentimentLexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        let mut lexicon = Self::empty();
        lexicon.extend_positive(POSITIVE_WORDS.iter().copied());
        lexicon.extend_negative(NEGATIVE_WORDS.iter().copied());
        lexicon
    }
}

impl SentimentLexicon {
    pub fn empty() -> Self {
        Self {
            positive: HashSet::new(),
            negative: HashSet::new(),
        }
    }

    pub fn extend_positive<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.positive
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
    }

    pub fn extend_negative<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.negative
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
    }

    /// Net polarity of a token sequence
    ///
    /// A negator ("not", "never", "...n't") flips the next polar word.
    pub fn polarity(&self, tokens: &[&str]) -> i32 {
        let mut total = 0;
        let mut negate = false;

        for token in tokens {
            let word = token.to_lowercase();
            if NEGATORS.contains(&word.as_str()) || word.ends_with("n't") {
                negate = true;
                continue;
            }

            let value = if self.positive.contains(&word) {
                1
            } else if self.negative.contains(&word) {
                -1
            } else {
                continue;
            };

            total += if negate { -value } else { value };
            negate = false;
        }

        total
    }

    /// Classify a sentence into 0..=4
    pub fn classify(&self, tokens: &[&str]) -> SentimentScore {
        let class = match self.polarity(tokens) {
            p if p <= -2 => 0,
            -1 => 1,
            0 => 2,
            1 => 3,
            _ => 4,
        };
        SentimentScore::new(class).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(tokens: &[&str]) -> u8 {
        SentimentLexicon::default().classify(tokens).value()
    }

    #[test]
    fn test_neutral_without_polar_words() {
        assert_eq!(classify(&["The", "meeting", "is", "on", "Tuesday"]), 2);
    }

    #[test]
    fn test_polarity_classes() {
        assert_eq!(classify(&["A", "good", "day"]), 3);
        assert_eq!(classify(&["Great", "and", "wonderful", "success"]), 4);
        assert_eq!(classify(&["A", "bad", "day"]), 1);
        assert_eq!(classify(&["Terrible", "crash", "and", "awful", "losses"]), 0);
    }

    #[test]
    fn test_negation_flips_next_polar_word() {
        assert_eq!(classify(&["This", "is", "not", "good"]), 1);
        assert_eq!(classify(&["It", "wasn't", "a", "disaster"]), 3);
    }

    #[test]
    fn test_custom_words() {
        let mut lexicon = SentimentLexicon::empty();
        lexicon.extend_positive(["Stellar"]);
        assert_eq!(lexicon.classify(&["stellar", "good"]).value(), 3);
    }
}
