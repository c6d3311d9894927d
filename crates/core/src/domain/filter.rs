// Filter Rules Domain Model

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::cached_url::url_host;
use crate::domain::{CachedJobUrl, JobId};

/// Footer markers for postings the user already applied to
pub const DEFAULT_APPLIED_MARKERS: &[&str] = &["applied", "candidatou-se", "candidatura enviada"];

/// Footer markers for paid/sponsored postings
pub const DEFAULT_PROMOTED_MARKERS: &[&str] = &["promoted", "promovida", "promovido", "patrocinado"];

/// Exclusion rules for job postings. Enabled rules are OR-ed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterRuleSet {
    pub blacklisted_companies: Vec<String>,
    pub blacklisted_domains: Vec<String>,
    pub remove_applied: bool,
    pub remove_promoted: bool,
    pub applied_markers: Vec<String>,
    pub promoted_markers: Vec<String>,
}

impl Default for FilterRuleSet {
    fn default() -> Self {
        Self {
            blacklisted_companies: Vec::new(),
            blacklisted_domains: Vec::new(),
            remove_applied: false,
            remove_promoted: false,
            applied_markers: DEFAULT_APPLIED_MARKERS.iter().map(|s| s.to_string()).collect(),
            promoted_markers: DEFAULT_PROMOTED_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FilterRuleSet {
    /// True when no rule can ever match
    pub fn is_empty(&self) -> bool {
        normalized(&self.blacklisted_companies).next().is_none()
            && normalized(&self.blacklisted_domains).next().is_none()
            && !self.remove_applied
            && !self.remove_promoted
    }
}

/// Lowercased, trimmed, non-empty entries of a pattern list
pub(crate) fn normalized(patterns: &[String]) -> impl Iterator<Item = String> + '_ {
    patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
}

/// Resolved URLs known at filtering time, keyed by job id.
///
/// Jobs absent from the snapshot have no cache entry yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlSnapshot {
    urls: HashMap<JobId, Option<String>>,
}

impl UrlSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: &CachedJobUrl) {
        self.urls.insert(entry.job_id.clone(), entry.job_url.clone());
    }

    /// Whether the job has a cache entry (resolved or not)
    pub fn contains(&self, job_id: &str) -> bool {
        self.urls.contains_key(job_id)
    }

    /// Resolved URL for a job (`None` when unknown or resolved to "no URL")
    pub fn url_for(&self, job_id: &str) -> Option<&str> {
        self.urls.get(job_id).and_then(|u| u.as_deref())
    }

    /// Lowercased host of the resolved URL
    pub fn host_for(&self, job_id: &str) -> Option<String> {
        self.url_for(job_id).and_then(url_host)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl FromIterator<CachedJobUrl> for UrlSnapshot {
    fn from_iter<T: IntoIterator<Item = CachedJobUrl>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for entry in iter {
            snapshot.insert(&entry);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_empty() {
        let rules = FilterRuleSet::default();
        assert!(rules.is_empty());
        assert!(rules.promoted_markers.contains(&"promovida".to_string()));
    }

    #[test]
    fn test_blank_blacklist_entries_do_not_count() {
        let rules = FilterRuleSet {
            blacklisted_companies: vec!["  ".to_string(), String::new()],
            ..Default::default()
        };
        assert!(rules.is_empty());
    }

    #[test]
    fn test_snapshot_distinguishes_null_url() {
        let snapshot: UrlSnapshot = vec![
            CachedJobUrl::new("1", Some("https://www.Example.com/jobs/1".into()), 0),
            CachedJobUrl::new("2", None, 0),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.host_for("1").as_deref(), Some("www.example.com"));
        assert_eq!(snapshot.url_for("2"), None);
        assert!(snapshot.contains("2"));
        assert!(!snapshot.contains("3"));
    }

    #[test]
    fn test_rules_deserialize_with_partial_fields() {
        let rules: FilterRuleSet =
            serde_json::from_value(serde_json::json!({ "removePromoted": true })).unwrap();
        assert!(rules.remove_promoted);
        assert!(!rules.applied_markers.is_empty());
    }
}
