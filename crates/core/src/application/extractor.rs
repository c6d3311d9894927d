//! JobRecordExtractor - turns the live job list into normalized records
//!
//! Read-only. A posting that fails to parse (missing field, bad id, or a
//! panicking selector) is skipped on its own; the rest are still extracted.

use std::sync::Arc;

use tracing::debug;

use crate::application::panic_guard::{execute_guarded, PanicGuardResult};
use crate::domain::{DomainError, JobRecord};
use crate::port::{DomJobSource, PostingElement};

pub struct JobRecordExtractor {
    source: Arc<dyn DomJobSource>,
}

impl JobRecordExtractor {
    pub fn new(source: Arc<dyn DomJobSource>) -> Self {
        Self { source }
    }

    /// Extract every well-formed posting in DOM order (no dedup)
    pub fn extract(&self) -> Vec<JobRecord> {
        let postings = self.source.postings();
        let total = postings.len();

        let records: Vec<JobRecord> = postings
            .iter()
            .enumerate()
            .filter_map(|(index, posting)| match execute_guarded(|| read_posting(posting.as_ref())) {
                PanicGuardResult::Success(Ok(record)) => Some(record),
                PanicGuardResult::Success(Err(skip)) => {
                    debug!(index = index, reason = %skip, "Posting skipped");
                    None
                }
                PanicGuardResult::Panicked(_) => {
                    debug!(index = index, "Posting skipped after panic");
                    None
                }
            })
            .collect();

        debug!(total = total, extracted = records.len(), "Job list extracted");
        records
    }
}

fn read_posting(posting: &dyn PostingElement) -> Result<JobRecord, DomainError> {
    JobRecord::from_parts(
        posting.job_id(),
        posting.company(),
        posting.title(),
        posting.is_simple_apply(),
        posting.footer_text(),
    )
}
