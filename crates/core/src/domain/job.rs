// Job Record Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Job posting identifier as scraped from the page
pub type JobId = String;

/// Normalized job posting summary.
///
/// Rebuilt from the page on every poll tick and dropped at the end of it;
/// never persisted. Identity is `job_id` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub company: String,
    pub title: String,
    /// Platform-native apply flow: there is no external URL to resolve
    pub is_simple_apply: bool,
    /// Raw status text under the posting ("Promoted", "Applied 2 days ago", ...)
    pub footer_text: String,
}

impl JobRecord {
    /// Build a record from raw field reads.
    ///
    /// Required fields are `job_id`, `company` and `title`; a missing or blank
    /// one yields `ExtractionSkip` instead of a zero value. The footer is
    /// optional and defaults to the empty string.
    pub fn from_parts(
        job_id: Option<String>,
        company: Option<String>,
        title: Option<String>,
        is_simple_apply: bool,
        footer_text: Option<String>,
    ) -> Result<Self> {
        let job_id = required(job_id, "job_id")?;
        if !job_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(DomainError::InvalidJobId(job_id));
        }

        Ok(Self {
            job_id,
            company: required(company, "company")?,
            title: required(title, "title")?,
            is_simple_apply,
            footer_text: footer_text.map(|s| s.trim().to_string()).unwrap_or_default(),
        })
    }

    /// Whether this posting needs an external apply URL resolved
    pub fn needs_resolution(&self) -> bool {
        !self.is_simple_apply
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(DomainError::ExtractionSkip { field })
}
