// Message Codec - flat, pipe-delimited wire format for jobs and results
//
// Job:    jobId|sourceLocator
// Result: jobId|sentimentScore|[word:LABEL, word:LABEL]|sourceText
//
// Every field is escaped with a backslash before joining, so a value that
// contains the separator still round-trips. Entity words additionally
// escape the characters the bracketed list uses for its own structure.

mod escape;

use crate::domain::{DomainError, Entity, EntityLabel, Job, JobResult, SentimentScore};
use escape::{escape_into, split_unescaped, Segment};
use thiserror::Error;

/// Separator between top-level fields
pub const FIELD_SEPARATOR: char = '|';

/// Characters in source text that are replaced by a single space before encoding
const SOURCE_TEXT_CONFLICTS: [char; 4] = ['|', '\n', '\t', '\r'];

/// Characters escaped inside an entity word
const ENTITY_WORD_SPECIALS: [char; 4] = [',', ':', '[', ']'];

const JOB_FIELD_COUNT: usize = 2;
const RESULT_FIELD_COUNT: usize = 4;

/// Decode failures
///
/// Every variant means the payload can never become decodable by being
/// redelivered, so callers treat all of them as poison messages.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("Job id is empty")]
    EmptyJobId,

    #[error("Invalid job: {0}")]
    InvalidJob(DomainError),

    #[error("Unparsable sentiment score: {0:?}")]
    InvalidSentiment(String),

    #[error("Malformed entity list: {0}")]
    MalformedEntities(String),

    #[error("Dangling escape character at end of payload")]
    DanglingEscape,
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Encode a job as `jobId|sourceLocator`
pub fn encode_job(job: &Job) -> String {
    let mut out = String::with_capacity(job.id.len() + job.source_locator.len() + 1);
    escape_into(&mut out, &job.id, &[FIELD_SEPARATOR]);
    out.push(FIELD_SEPARATOR);
    escape_into(&mut out, &job.source_locator, &[FIELD_SEPARATOR]);
    out
}

/// Decode a `jobId|sourceLocator` payload into a validated job
pub fn decode_job(payload: &str) -> Result<Job> {
    let fields = split_fields(payload, JOB_FIELD_COUNT)?;
    let [id, source_locator]: [String; JOB_FIELD_COUNT] = fields
        .try_into()
        .map_err(|v: Vec<String>| CodecError::FieldCount {
            expected: JOB_FIELD_COUNT,
            found: v.len(),
        })?;

    if id.trim().is_empty() {
        return Err(CodecError::EmptyJobId);
    }

    Job::new(id, source_locator).map_err(CodecError::InvalidJob)
}

/// Encode a result as `jobId|sentimentScore|entities|sourceText`
///
/// `source_text` is normalized first: pipe, newline, tab and carriage
/// return each become a single space.
pub fn encode_result(result: &JobResult) -> String {
    let mut out = String::new();
    escape_into(&mut out, &result.job_id, &[FIELD_SEPARATOR]);
    out.push(FIELD_SEPARATOR);
    out.push_str(&result.sentiment.to_string());
    out.push(FIELD_SEPARATOR);
    escape_into(&mut out, &render_entities(&result.entities), &[FIELD_SEPARATOR]);
    out.push(FIELD_SEPARATOR);
    escape_into(
        &mut out,
        &normalize_source_text(&result.source_text),
        &[FIELD_SEPARATOR],
    );
    out
}

/// Decode a result payload
pub fn decode_result(payload: &str) -> Result<JobResult> {
    let fields = split_fields(payload, RESULT_FIELD_COUNT)?;
    let [job_id, sentiment, entities, source_text]: [String; RESULT_FIELD_COUNT] = fields
        .try_into()
        .map_err(|v: Vec<String>| CodecError::FieldCount {
            expected: RESULT_FIELD_COUNT,
            found: v.len(),
        })?;

    if job_id.trim().is_empty() {
        return Err(CodecError::EmptyJobId);
    }

    let sentiment = sentiment
        .parse::<u8>()
        .ok()
        .and_then(|value| SentimentScore::new(value).ok())
        .ok_or(CodecError::InvalidSentiment(sentiment))?;

    Ok(JobResult {
        job_id,
        sentiment,
        entities: parse_entities(&entities)?,
        source_text,
    })
}

/// Replace characters that conflict with the record layout by a single space
pub fn normalize_source_text(text: &str) -> String {
    text.chars()
        .map(|c| if SOURCE_TEXT_CONFLICTS.contains(&c) { ' ' } else { c })
        .collect()
}

/// Render entities as `[word1:LABEL1, word2:LABEL2]`
pub fn render_entities(entities: &[Entity]) -> String {
    let mut out = String::from("[");
    for (i, entity) in entities.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        escape_into(&mut out, &entity.word, &ENTITY_WORD_SPECIALS);
        out.push(':');
        out.push_str(entity.label.as_str());
    }
    out.push(']');
    out
}

fn split_fields(payload: &str, expected: usize) -> Result<Vec<String>> {
    let fields = split_unescaped(payload, FIELD_SEPARATOR, Segment::Resolve)
        .ok_or(CodecError::DanglingEscape)?;
    if fields.len() != expected {
        return Err(CodecError::FieldCount {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn parse_entities(field: &str) -> Result<Vec<Entity>> {
    let inner = field
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| CodecError::MalformedEntities(format!("not bracketed: {field:?}")))?;

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let items = split_unescaped(inner, ',', Segment::Keep)
        .ok_or_else(|| CodecError::MalformedEntities(format!("dangling escape: {field:?}")))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            // Items after the first carry the ", " separator's space
            let item = if i == 0 {
                item.as_str()
            } else {
                item.strip_prefix(' ').ok_or_else(|| {
                    CodecError::MalformedEntities(format!("missing space after comma: {field:?}"))
                })?
            };
            parse_entity(item)
        })
        .collect()
}

fn parse_entity(item: &str) -> Result<Entity> {
    let parts = split_unescaped(item, ':', Segment::Resolve)
        .ok_or_else(|| CodecError::MalformedEntities(format!("dangling escape: {item:?}")))?;

    match parts.as_slice() {
        [word, label] if !word.is_empty() => {
            let label = label
                .parse::<EntityLabel>()
                .map_err(|e| CodecError::MalformedEntities(e.to_string()))?;
            Ok(Entity::new(word.clone(), label))
        }
        _ => Err(CodecError::MalformedEntities(format!(
            "expected word:LABEL, got {item:?}"
        ))),
    }
}
