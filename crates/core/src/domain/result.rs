// Result Domain Model

use super::error::{DomainError, Result};
use super::job::JobId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentiment class on the five-point scale (0 = very negative, 4 = very positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SentimentScore(u8);

impl SentimentScore {
    pub const MAX: u8 = 4;

    /// Score reported when there is nothing to analyze
    pub const UNSCORED: SentimentScore = SentimentScore(0);

    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(DomainError::InvalidSentiment(i64::from(value)));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for SentimentScore {
    fn default() -> Self {
        Self::UNSCORED
    }
}

impl TryFrom<u8> for SentimentScore {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SentimentScore> for u8 {
    fn from(score: SentimentScore) -> Self {
        score.0
    }
}

impl fmt::Display for SentimentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity categories kept in a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Location,
    Organization,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Location => "LOCATION",
            EntityLabel::Organization => "ORGANIZATION",
        }
    }

    /// Map a raw tagger label; anything outside the three kept categories is `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "PERSON" => Some(EntityLabel::Person),
            "LOCATION" => Some(EntityLabel::Location),
            "ORGANIZATION" => Some(EntityLabel::Organization),
            _ => None,
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityLabel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s).ok_or_else(|| DomainError::UnknownEntityLabel(s.to_string()))
    }
}

/// A single named entity: the token text and its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub word: String,
    pub label: EntityLabel,
}

impl Entity {
    pub fn new(word: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            word: word.into(),
            label,
        }
    }
}

/// Output of the analysis pipeline for one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: SentimentScore,
    pub entities: Vec<Entity>,
}

/// JobResult - the outcome published for a job
///
/// Only ever built after the job's content was fetched and analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub sentiment: SentimentScore,
    pub entities: Vec<Entity>,
    pub source_text: String,
}

impl JobResult {
    pub fn new(job_id: impl Into<JobId>, analysis: AnalysisResult, source_text: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            sentiment: analysis.sentiment,
            entities: analysis.entities,
            source_text: source_text.into(),
        }
    }
}
