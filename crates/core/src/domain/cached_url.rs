// Cached Job URL Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::JobId;

/// One hour in epoch milliseconds
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// `last_seen_at` is only rewritten when the previous value is older than this
pub const LAST_SEEN_COALESCE_MS: i64 = HOUR_MS;

/// Storage key prefix for cached URLs (`job_<jobId>`)
pub const CACHE_KEY_PREFIX: &str = "job_";

/// Resolved external application URL for a job posting.
///
/// `job_url == None` is a real cached result ("no external URL"), not a miss:
/// once stored it is never fetched again until evicted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedJobUrl {
    pub job_id: JobId,
    pub job_url: Option<String>,
    pub first_seen_at: i64, // epoch ms
    pub last_seen_at: i64,  // epoch ms
}

impl CachedJobUrl {
    /// Create a freshly resolved entry with `first_seen_at == last_seen_at == now`
    pub fn new(job_id: impl Into<String>, job_url: Option<String>, now_millis: i64) -> Self {
        Self {
            job_id: job_id.into(),
            job_url,
            first_seen_at: now_millis,
            last_seen_at: now_millis,
        }
    }

    /// Storage key for a job id
    pub fn key_for(job_id: &str) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, job_id)
    }

    /// Job id encoded in a storage key, if the key belongs to the cache
    pub fn job_id_from_key(key: &str) -> Option<&str> {
        key.strip_prefix(CACHE_KEY_PREFIX).filter(|id| !id.is_empty())
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.job_id)
    }

    /// Record that the posting was seen again.
    ///
    /// Returns true if `last_seen_at` changed (and the entry must be written back).
    pub fn touch(&mut self, now_millis: i64) -> bool {
        if now_millis.saturating_sub(self.last_seen_at) > LAST_SEEN_COALESCE_MS {
            self.last_seen_at = now_millis;
            true
        } else {
            false
        }
    }

    /// Whether the entry has gone unseen for longer than the retention window.
    ///
    /// A window too large to express in milliseconds never expires anything.
    pub fn is_stale(&self, now_millis: i64, retention_hours: i64) -> bool {
        match retention_hours.checked_mul(HOUR_MS) {
            Some(window) => now_millis.saturating_sub(self.last_seen_at) > window,
            None => false,
        }
    }

    /// Host of the resolved URL, lowercased (`None` when unresolved or unparseable)
    pub fn host(&self) -> Option<String> {
        self.job_url.as_deref().and_then(url_host)
    }
}

/// Lowercased host of an absolute URL
pub fn url_host(raw: &str) -> Option<String> {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_timestamps_equal() {
        let entry = CachedJobUrl::new("42", Some("https://x.com/y".to_string()), 5_000);
        assert_eq!(entry.first_seen_at, 5_000);
        assert_eq!(entry.last_seen_at, 5_000);
        assert_eq!(entry.key(), "job_42");
    }

    #[test]
    fn test_touch_coalesces_within_an_hour() {
        let mut entry = CachedJobUrl::new("1", None, 0);

        assert!(!entry.touch(30 * 60 * 1000));
        assert!(!entry.touch(HOUR_MS)); // exactly one hour is not "more than"
        assert_eq!(entry.last_seen_at, 0);

        assert!(entry.touch(HOUR_MS + 1));
        assert_eq!(entry.last_seen_at, HOUR_MS + 1);
        assert_eq!(entry.first_seen_at, 0);
    }

    #[test]
    fn test_is_stale_boundary() {
        let entry = CachedJobUrl::new("1", None, 0);
        assert!(!entry.is_stale(24 * HOUR_MS, 24));
        assert!(entry.is_stale(24 * HOUR_MS + 1, 24));
    }

    #[test]
    fn test_is_stale_huge_retention_never_expires() {
        let entry = CachedJobUrl::new("1", None, 1_700_000_000_000);
        assert!(!entry.is_stale(1_700_000_000_000, 3_000_000_000_000));
        assert!(!entry.is_stale(1_700_000_000_000, i64::MAX));
        assert!(!entry.is_stale(i64::MAX, i64::MAX / HOUR_MS));
    }

    #[test]
    fn test_key_round_trip_and_foreign_keys() {
        assert_eq!(CachedJobUrl::job_id_from_key("job_77"), Some("77"));
        assert_eq!(CachedJobUrl::job_id_from_key("job_"), None);
        assert_eq!(CachedJobUrl::job_id_from_key("enabled"), None);
    }

    #[test]
    fn test_serialized_field_names() {
        let entry = CachedJobUrl::new("9", None, 1);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["jobId"], "9");
        assert!(value["jobUrl"].is_null());
        assert_eq!(value["firstSeenAt"], 1);
        assert_eq!(value["lastSeenAt"], 1);
    }

    #[test]
    fn test_host_lowercased() {
        let entry = CachedJobUrl::new("1", Some("https://Careers.Example.COM/apply".into()), 0);
        assert_eq!(entry.host().as_deref(), Some("careers.example.com"));
        assert_eq!(CachedJobUrl::new("2", None, 0).host(), None);
    }
}
