//! JobUrlCache - resolve-once cache of external apply URLs
//!
//! - A job id is resolved at most once; a stored `None` URL is a hit, not a miss.
//! - `last_seen_at` is rewritten only when the previous value is over an hour old.
//! - Eviction is an explicit sweep over `job_<id>` keys, never automatic expiry.
//!
//! The `has` check and the final write are not atomic: two overlapping calls
//! for the same id may both resolve. Callers that cannot tolerate that must
//! serialize resolutions.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{CachedJobUrl, UrlSnapshot};
use crate::error::{AppError, Result};
use crate::port::{KeyValueStore, TimeProvider, UrlResolver};

/// Summary of the cache contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub resolved: usize,
    pub without_url: usize,
    pub oldest_last_seen_at: Option<i64>,
}

pub struct JobUrlCache {
    store: Arc<dyn KeyValueStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl JobUrlCache {
    pub fn new(store: Arc<dyn KeyValueStore>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            store,
            time_provider,
        }
    }

    /// Whether an entry exists. Storage failures read as "absent".
    pub async fn has(&self, job_id: &str) -> bool {
        self.get(job_id).await.is_some()
    }

    /// Read an entry without touching it. Storage failures and undecodable
    /// values read as "absent".
    pub async fn get(&self, job_id: &str) -> Option<CachedJobUrl> {
        let key = CachedJobUrl::key_for(job_id);
        match self.store.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value::<CachedJobUrl>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Undecodable cache entry, treating as absent");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Cache read failed, treating as absent");
                None
            }
        }
    }

    /// Read an entry and mark it as seen (subject to write coalescing)
    pub async fn observe(&self, job_id: &str) -> Option<CachedJobUrl> {
        let mut entry = self.get(job_id).await?;
        self.touch(&mut entry).await;
        Some(entry)
    }

    /// Return the cached entry, or resolve and store a new one.
    ///
    /// On a hit the resolver is not called. On a resolver failure nothing is
    /// written, so the next tick retries. A failed write after a successful
    /// resolution is dropped and the fresh entry is still returned.
    pub async fn resolve_and_store(
        &self,
        job_id: &str,
        resolver: &dyn UrlResolver,
    ) -> Result<CachedJobUrl> {
        if let Some(entry) = self.observe(job_id).await {
            debug!(job_id = %job_id, "Job URL already cached");
            return Ok(entry);
        }

        let job_url = resolver.resolve(job_id).await.map_err(|e| {
            warn!(job_id = %job_id, error = %e, "Job URL resolution failed");
            AppError::Resolution(e)
        })?;

        let entry = CachedJobUrl::new(job_id, job_url, self.time_provider.now_millis());
        self.write(&entry).await;

        info!(
            job_id = %job_id,
            has_url = entry.job_url.is_some(),
            "Job URL resolved and cached"
        );
        Ok(entry)
    }

    /// Observe every id and collect the hits into a snapshot for filtering
    pub async fn snapshot<'a, I>(&self, job_ids: I) -> UrlSnapshot
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut snapshot = UrlSnapshot::new();
        for job_id in job_ids {
            if let Some(entry) = self.observe(job_id).await {
                snapshot.insert(&entry);
            }
        }
        snapshot
    }

    /// Delete entries unseen for more than `retention_hours`.
    ///
    /// Undecodable entries are deleted as well. Returns the number deleted.
    pub async fn evict_stale(&self, retention_hours: i64) -> Result<usize> {
        let now = self.time_provider.now_millis();
        let all = self.store.get_all().await?;

        let stale: Vec<String> = all
            .into_iter()
            .filter(|(key, _)| CachedJobUrl::job_id_from_key(key).is_some())
            .filter(|(_, value)| match serde_json::from_value::<CachedJobUrl>(value.clone()) {
                Ok(entry) => entry.is_stale(now, retention_hours),
                Err(_) => true,
            })
            .map(|(key, _)| key)
            .collect();

        if !stale.is_empty() {
            self.store.remove_many(&stale).await?;
        }

        info!(
            retention_hours = retention_hours,
            evicted = stale.len(),
            "Stale job URL sweep completed"
        );
        Ok(stale.len())
    }

    /// Delete every cache entry. Returns the number deleted.
    pub async fn clear_all(&self) -> Result<usize> {
        let keys: Vec<String> = self
            .store
            .get_all()
            .await?
            .into_keys()
            .filter(|key| CachedJobUrl::job_id_from_key(key).is_some())
            .collect();

        if !keys.is_empty() {
            self.store.remove_many(&keys).await?;
        }

        info!(cleared = keys.len(), "Job URL cache cleared");
        Ok(keys.len())
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let entries: Vec<CachedJobUrl> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|(key, _)| CachedJobUrl::job_id_from_key(key).is_some())
            .filter_map(|(_, value)| serde_json::from_value(value).ok())
            .collect();

        let resolved = entries.iter().filter(|e| e.job_url.is_some()).count();
        Ok(CacheStats {
            entries: entries.len(),
            resolved,
            without_url: entries.len() - resolved,
            oldest_last_seen_at: entries.iter().map(|e| e.last_seen_at).min(),
        })
    }

    async fn touch(&self, entry: &mut CachedJobUrl) {
        if entry.touch(self.time_provider.now_millis()) {
            debug!(job_id = %entry.job_id, last_seen_at = entry.last_seen_at, "Job URL touched");
            self.write(entry).await;
        }
    }

    /// At-most-effort persistence: failures are logged and dropped
    async fn write(&self, entry: &CachedJobUrl) {
        let value = match serde_json::to_value(entry) {
            Ok(value) => value,
            Err(e) => {
                warn!(job_id = %entry.job_id, error = %e, "Cache entry not serializable");
                return;
            }
        };

        if let Err(e) = self.store.set(&entry.key(), value).await {
            warn!(job_id = %entry.job_id, error = %e, "Cache write dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HOUR_MS;
    use crate::port::key_value_store::mocks::MemoryKeyValueStore;
    use crate::port::time_provider::mocks::MockTimeProvider;
    use crate::port::url_resolver::mocks::MockUrlResolver;
    use serde_json::json;

    const T0: i64 = 1_700_000_000_000;

    fn setup() -> (Arc<MemoryKeyValueStore>, Arc<MockTimeProvider>, JobUrlCache) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let clock = Arc::new(MockTimeProvider::new(T0));
        let cache = JobUrlCache::new(store.clone(), clock.clone());
        (store, clock, cache)
    }

    #[tokio::test]
    async fn test_resolve_and_store_new_entry() {
        let (store, _clock, cache) = setup();
        let resolver = MockUrlResolver::returning(Some("https://x.com/y"));

        let entry = cache.resolve_and_store("42", &resolver).await.unwrap();

        assert_eq!(entry.job_id, "42");
        assert_eq!(entry.job_url.as_deref(), Some("https://x.com/y"));
        assert_eq!(entry.first_seen_at, T0);
        assert_eq!(entry.last_seen_at, T0);
        assert_eq!(store.peek("job_42").unwrap()["jobUrl"], "https://x.com/y");
    }

    #[tokio::test]
    async fn test_resolver_called_once() {
        let (_store, _clock, cache) = setup();
        let resolver = MockUrlResolver::returning(Some("https://x.com/y"));

        let first = cache.resolve_and_store("1", &resolver).await.unwrap();
        let second = cache.resolve_and_store("1", &resolver).await.unwrap();

        assert_eq!(resolver.call_count(), 1);
        assert_eq!(first.job_url, second.job_url);
    }

    #[tokio::test]
    async fn test_null_url_is_cached_and_not_refetched() {
        let (_store, _clock, cache) = setup();
        let resolver = MockUrlResolver::returning(None);

        let entry = cache.resolve_and_store("9", &resolver).await.unwrap();
        assert!(entry.job_url.is_none());
        assert!(cache.has("9").await);

        cache.resolve_and_store("9", &resolver).await.unwrap();
        assert_eq!(resolver.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolver_failure_writes_nothing() {
        let (store, _clock, cache) = setup();
        let resolver = MockUrlResolver::failing("HTTP 429");

        let err = cache.resolve_and_store("7", &resolver).await.unwrap_err();
        assert!(matches!(err, AppError::Resolution(_)));
        assert!(!cache.has("7").await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_last_seen_coalesced_within_hour() {
        let (store, clock, cache) = setup();
        let resolver = MockUrlResolver::returning(Some("https://x.com/y"));
        cache.resolve_and_store("1", &resolver).await.unwrap();
        assert_eq!(store.write_count(), 1);

        clock.advance(20 * 60 * 1000);
        cache.resolve_and_store("1", &resolver).await.unwrap();
        clock.advance(20 * 60 * 1000);
        let entry = cache.resolve_and_store("1", &resolver).await.unwrap();

        assert_eq!(entry.last_seen_at, T0);
        assert_eq!(store.write_count(), 1);

        clock.advance(HOUR_MS);
        let entry = cache.resolve_and_store("1", &resolver).await.unwrap();
        assert_eq!(entry.last_seen_at, T0 + 40 * 60 * 1000 + HOUR_MS);
        assert_eq!(entry.first_seen_at, T0);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_evict_stale_boundary() {
        let (store, _clock, cache) = setup();
        let just_under = CachedJobUrl::new("under", None, T0 - 24 * HOUR_MS);
        let just_over = CachedJobUrl::new("over", None, T0 - 24 * HOUR_MS - 1);
        let fresh = CachedJobUrl::new("fresh", Some("https://a.io".into()), T0);
        for entry in [&just_under, &just_over, &fresh] {
            store.seed(&entry.key(), serde_json::to_value(entry).unwrap());
        }
        store.seed("enabled", json!(true));

        let evicted = cache.evict_stale(24).await.unwrap();

        assert_eq!(evicted, 1);
        assert!(store.peek("job_over").is_none());
        assert!(store.peek("job_under").is_some());
        assert!(store.peek("job_fresh").is_some());
        assert!(store.peek("enabled").is_some());
    }

    #[tokio::test]
    async fn test_evict_with_huge_retention_keeps_fresh_entries() {
        let (store, _clock, cache) = setup();
        let fresh = CachedJobUrl::new("fresh", Some("https://a.io".into()), T0);
        store.seed(&fresh.key(), serde_json::to_value(&fresh).unwrap());

        assert_eq!(cache.evict_stale(3_000_000_000_000).await.unwrap(), 0);
        assert_eq!(cache.evict_stale(i64::MAX).await.unwrap(), 0);
        assert!(store.peek("job_fresh").is_some());
    }

    #[tokio::test]
    async fn test_evict_removes_corrupt_entries() {
        let (store, _clock, cache) = setup();
        store.seed("job_bad", json!("not an entry"));

        assert!(!cache.has("bad").await);
        assert_eq!(cache.evict_stale(72).await.unwrap(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_only_touches_cache_keys() {
        let (store, _clock, cache) = setup();
        let resolver = MockUrlResolver::returning(None);
        for id in ["1", "2", "3"] {
            cache.resolve_and_store(id, &resolver).await.unwrap();
        }
        store.seed("jobs_show_icons", json!(true));

        assert_eq!(cache.clear_all().await.unwrap(), 3);
        assert_eq!(store.len(), 1);
        assert_eq!(cache.clear_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_reads_as_absent() {
        let (store, _clock, cache) = setup();
        let resolver = MockUrlResolver::returning(Some("https://x.com/y"));
        cache.resolve_and_store("1", &resolver).await.unwrap();

        store.set_failing(true);
        assert!(!cache.has("1").await);
        assert!(cache.evict_stale(1).await.is_err());

        // Write is dropped but the resolved entry is still returned
        let entry = cache.resolve_and_store("2", &resolver).await.unwrap();
        assert_eq!(entry.job_url.as_deref(), Some("https://x.com/y"));

        store.set_failing(false);
        assert!(!cache.has("2").await);
    }

    #[tokio::test]
    async fn test_snapshot_and_stats() {
        let (_store, _clock, cache) = setup();
        let resolver = MockUrlResolver::returning(Some("https://jobs.acme.io/1"));
        resolver.set_behavior(
            "2",
            crate::port::url_resolver::mocks::MockBehavior::Url(None),
        );
        cache.resolve_and_store("1", &resolver).await.unwrap();
        cache.resolve_and_store("2", &resolver).await.unwrap();

        let snapshot = cache.snapshot(["1", "2", "3"]).await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.host_for("1").as_deref(), Some("jobs.acme.io"));

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.without_url, 1);
        assert_eq!(stats.oldest_last_seen_at, Some(T0));
    }
}
