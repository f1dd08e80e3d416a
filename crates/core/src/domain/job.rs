// Job Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Job ID (assigned by the producer, stable across redeliveries)
pub type JobId = String;

/// URL schemes a worker is willing to fetch
const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Job - one unit of work dequeued from the input queue
///
/// Both fields are guaranteed non-empty once constructed through `Job::new`,
/// so a malformed payload is rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub source_locator: String,
}

impl Job {
    /// Create a validated job
    pub fn new(id: impl Into<JobId>, source_locator: impl Into<String>) -> Result<Self> {
        let job = Self {
            id: id.into(),
            source_locator: source_locator.into(),
        };
        job.validate()?;
        Ok(job)
    }

    /// Check the job invariants
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DomainError::ValidationError("job id is empty".to_string()));
        }
        if self.source_locator.trim().is_empty() {
            return Err(DomainError::ValidationError(format!(
                "job {} has an empty source locator",
                self.id
            )));
        }

        let url = Url::parse(self.source_locator.trim()).map_err(|e| {
            DomainError::ValidationError(format!(
                "job {} has an unparsable source locator {}: {}",
                self.id, self.source_locator, e
            ))
        })?;
        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return Err(DomainError::ValidationError(format!(
                "job {} has a non-http source locator: {}",
                self.id, self.source_locator
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(DomainError::ValidationError(format!(
                "job {} has a source locator without a host: {}",
                self.id, self.source_locator
            )));
        }
        Ok(())
    }
}
