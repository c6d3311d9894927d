//! JobFilterEngine - decides which postings to remove from view
//!
//! Rules (OR-ed, each independently enabled):
//! - blacklisted company: case-insensitive substring of `company`
//! - blacklisted domain: substring of the resolved URL's host; unresolved jobs never match
//! - applied: footer contains an "already applied" marker
//! - promoted: footer contains a "promoted" marker

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::domain::filter::normalized;
use crate::domain::{FilterRuleSet, JobRecord, UrlSnapshot};
use crate::port::DomJobSource;

/// Which rule removed a posting (first match in evaluation order)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Company,
    Domain,
    Applied,
    Promoted,
}

pub struct JobFilterEngine;

impl JobFilterEngine {
    /// Pure: the postings to remove, in input order, each at most once
    pub fn filter(jobs: &[JobRecord], rules: &FilterRuleSet, urls: &UrlSnapshot) -> Vec<JobRecord> {
        if rules.is_empty() {
            return Vec::new();
        }

        let matcher = RuleMatcher::new(rules);
        let mut seen = HashSet::new();
        jobs.iter()
            .filter(|job| matcher.reason(job, urls).is_some())
            .filter(|job| seen.insert(job.job_id.as_str()))
            .cloned()
            .collect()
    }

    /// Detach every posting in `removals`. Returns how many nodes were actually detached.
    pub fn apply(source: &Arc<dyn DomJobSource>, removals: &[JobRecord]) -> usize {
        removals
            .iter()
            .filter(|job| {
                let detached = source.remove_posting(&job.job_id);
                if !detached {
                    debug!(job_id = %job.job_id, "Posting already detached");
                }
                detached
            })
            .count()
    }

    /// First matching rule for a single posting
    pub fn reason(job: &JobRecord, rules: &FilterRuleSet, urls: &UrlSnapshot) -> Option<RemovalReason> {
        RuleMatcher::new(rules).reason(job, urls)
    }
}

/// Rules with patterns lowercased once per filter call
struct RuleMatcher {
    companies: Vec<String>,
    domains: Vec<String>,
    applied: Option<Vec<String>>,
    promoted: Option<Vec<String>>,
}

impl RuleMatcher {
    fn new(rules: &FilterRuleSet) -> Self {
        Self {
            companies: normalized(&rules.blacklisted_companies).collect(),
            domains: normalized(&rules.blacklisted_domains).collect(),
            applied: rules
                .remove_applied
                .then(|| normalized(&rules.applied_markers).collect()),
            promoted: rules
                .remove_promoted
                .then(|| normalized(&rules.promoted_markers).collect()),
        }
    }

    fn reason(&self, job: &JobRecord, urls: &UrlSnapshot) -> Option<RemovalReason> {
        let company = job.company.to_lowercase();
        if self.companies.iter().any(|c| company.contains(c.as_str())) {
            return Some(RemovalReason::Company);
        }

        if !self.domains.is_empty() {
            if let Some(host) = urls.host_for(&job.job_id) {
                if self.domains.iter().any(|d| host.contains(d.as_str())) {
                    return Some(RemovalReason::Domain);
                }
            }
        }

        let footer = job.footer_text.trim().to_lowercase();
        if contains_any(&footer, self.applied.as_deref()) {
            return Some(RemovalReason::Applied);
        }
        if contains_any(&footer, self.promoted.as_deref()) {
            return Some(RemovalReason::Promoted);
        }

        None
    }
}

fn contains_any(haystack: &str, markers: Option<&[String]>) -> bool {
    !haystack.is_empty()
        && markers.is_some_and(|markers| markers.iter().any(|m| haystack.contains(m.as_str())))
}
