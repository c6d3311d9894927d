//! PollLoop - fixed-interval driver over the live page
//!
//! One state, RUNNING, re-entered every interval until the hosting context is
//! torn down. Each tick:
//! 1. reads settings (a failed read means defaults); a disabled tick is a no-op
//! 2. sweeps stale cache entries, at most once per sweep interval
//! 3. dispatches on the page mode: feed, jobs listing or network growth
//!
//! In jobs-listing mode, uncached non-simple-apply postings get their URL
//! resolved. With `ResolutionMode::FireAndForget` the resolutions are spawned
//! and not awaited, so the next tick may start while they are in flight and
//! a job can be fetched twice before its first result lands. `Serialized`
//! awaits each one inside the tick instead.
//!
//! No error or panic escapes a tick; it only aborts that tick's remaining work.

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::application::panic_guard::{execute_guarded_async, PanicGuardResult};
use crate::application::{JobFilterEngine, JobRecordExtractor, JobUrlCache, SettingsReader};
use crate::domain::{FeedSession, JobRecord, PageMode, PageState, PostingAnnotation, Settings};
use crate::error::Result;
use crate::port::{
    DomJobSource, FeedSurface, KeyValueStore, NetworkSurface, PageContext, TimeProvider,
    UrlResolver,
};
use constants::{DEFAULT_POLL_INTERVAL, DEFAULT_SWEEP_INTERVAL};

/// How URL resolutions are run within a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Spawn and move on; the tick never waits on the network
    #[default]
    FireAndForget,
    /// Await each resolution in turn; no duplicate fetches across ticks
    Serialized,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub sweep_interval: Duration,
    pub resolution_mode: ResolutionMode,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            resolution_mode: ResolutionMode::default(),
        }
    }
}

/// Page-side capabilities the loop drives
#[derive(Clone)]
pub struct PagePorts {
    pub page: Arc<dyn PageContext>,
    pub jobs: Arc<dyn DomJobSource>,
    pub feed: Arc<dyn FeedSurface>,
    pub network: Arc<dyn NetworkSurface>,
}

/// Per-session state owned by the loop
#[derive(Debug, Default)]
struct Session {
    feed: FeedSession,
    last_mode: Option<PageMode>,
    last_sweep_at: Option<i64>,
}

pub struct PollLoop {
    config: PollConfig,
    ports: PagePorts,
    extractor: JobRecordExtractor,
    settings: SettingsReader,
    cache: Arc<JobUrlCache>,
    resolver: Arc<dyn UrlResolver>,
    time_provider: Arc<dyn TimeProvider>,
    session: Mutex<Session>,
    in_flight: Arc<AtomicUsize>,
    state_tx: watch::Sender<PageState>,
}

impl PollLoop {
    pub fn new(
        config: PollConfig,
        ports: PagePorts,
        settings_store: Arc<dyn KeyValueStore>,
        cache: Arc<JobUrlCache>,
        resolver: Arc<dyn UrlResolver>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let (state_tx, _) = watch::channel(PageState::default());
        Self {
            config,
            extractor: JobRecordExtractor::new(ports.jobs.clone()),
            ports,
            settings: SettingsReader::new(settings_store),
            cache,
            resolver,
            time_provider,
            session: Mutex::new(Session::default()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            state_tx,
        }
    }

    /// Receiver for the page state published after every tick
    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state_tx.subscribe()
    }

    /// Spawned resolutions that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run until the shutdown token fires
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            resolution_mode = ?self.config.resolution_mode,
            "Poll loop started"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                _ = shutdown.wait() => break,
            }
            if shutdown.is_shutdown() {
                break;
            }

            match execute_guarded_async(self.tick()).await {
                PanicGuardResult::Success(Ok(state)) => {
                    debug!(mode = %state.mode, visible = state.visible_jobs, "Tick completed");
                }
                PanicGuardResult::Success(Err(e)) => {
                    warn!(error = %e, "Tick aborted");
                }
                PanicGuardResult::Panicked(msg) => {
                    error!(panic_msg = %msg, "Tick panicked");
                }
            }
        }

        info!("Poll loop stopped");
    }

    /// Run one tick and publish the resulting page state
    pub async fn tick(&self) -> Result<PageState> {
        let now = self.time_provider.now_millis();
        let settings = self.settings.load().await;
        let url = self.ports.page.current_url();
        let mode = url.as_deref().map(PageMode::from_url).unwrap_or(PageMode::Other);

        let mut state = PageState {
            url,
            mode,
            enabled: settings.enabled,
            last_tick_at: Some(now),
            ..Default::default()
        };

        if !settings.enabled {
            self.release_feed();
            state.feed_placeholder_shown = false;
            self.state_tx.send_replace(state.clone());
            return Ok(state);
        }

        self.sweep_if_due(now, settings.cache_retention_hours).await;
        self.track_mode(mode);

        match mode {
            PageMode::Feed => self.handle_feed(&settings),
            PageMode::JobsListing => self.handle_jobs(&settings, &mut state).await?,
            PageMode::NetworkGrowth => {
                state.accepted_invitations = self.handle_network(&settings);
            }
            PageMode::Other => {}
        }

        state.feed_placeholder_shown = self.session().feed.placeholder_shown;
        self.state_tx.send_replace(state.clone());
        Ok(state)
    }

    async fn handle_jobs(&self, settings: &Settings, state: &mut PageState) -> Result<()> {
        let records = self.extractor.extract();
        let job_ids: Vec<&str> = records.iter().map(|r| r.job_id.as_str()).collect();
        let mut snapshot = self.cache.snapshot(job_ids).await;

        // one resolution per id per tick, even if the page repeats a posting
        let mut queued: HashSet<&str> = HashSet::new();
        let unresolved: Vec<&JobRecord> = records
            .iter()
            .filter(|r| r.needs_resolution() && !snapshot.contains(&r.job_id))
            .filter(|r| queued.insert(r.job_id.as_str()))
            .collect();

        for record in &unresolved {
            match self.config.resolution_mode {
                ResolutionMode::FireAndForget => self.dispatch_resolution(&record.job_id),
                ResolutionMode::Serialized => {
                    // failure already logged by the cache; retried next tick
                    if let Ok(entry) = self
                        .cache
                        .resolve_and_store(&record.job_id, self.resolver.as_ref())
                        .await
                    {
                        snapshot.insert(&entry);
                    }
                }
            }
        }
        state.dispatched_resolutions = unresolved.len();

        let removals = JobFilterEngine::filter(&records, &settings.rules, &snapshot);
        let detached = JobFilterEngine::apply(&self.ports.jobs, &removals);

        if settings.show_icons {
            let removed: HashSet<&str> = removals.iter().map(|r| r.job_id.as_str()).collect();
            state.annotated_jobs = records
                .iter()
                .filter(|r| r.needs_resolution() && !removed.contains(r.job_id.as_str()))
                .filter_map(|r| {
                    let annotation = PostingAnnotation::for_url(snapshot.url_for(&r.job_id)?)?;
                    self.ports
                        .jobs
                        .annotate_posting(&r.job_id, &annotation)
                        .then_some(())
                })
                .count();
        }

        state.visible_jobs = records.len() - removals.len();
        state.removed_jobs = removals.len();

        debug!(
            extracted = records.len(),
            removed = removals.len(),
            detached = detached,
            dispatched = unresolved.len(),
            annotated = state.annotated_jobs,
            "Job list filtered"
        );
        Ok(())
    }

    /// Spawn one resolution without awaiting it
    fn dispatch_resolution(&self, job_id: &str) {
        let cache = Arc::clone(&self.cache);
        let resolver = Arc::clone(&self.resolver);
        let in_flight = Arc::clone(&self.in_flight);
        let job_id = job_id.to_string();

        in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            // errors are logged by the cache and retried on a later tick; a
            // panicking resolver is logged by the guard and must still release
            // its in-flight slot
            let resolution = cache.resolve_and_store(&job_id, resolver.as_ref());
            if let PanicGuardResult::Panicked(_) = execute_guarded_async(resolution).await {
                debug!(job_id = %job_id, "Resolution aborted by panic");
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    fn handle_feed(&self, settings: &Settings) {
        let mut session = self.session();
        if settings.feed_hide {
            if !session.feed.placeholder_shown && self.ports.feed.show_focus_placeholder() {
                session.feed.placeholder_shown = true;
                info!("Feed replaced with focus placeholder");
            }
        } else if session.feed.placeholder_shown {
            self.ports.feed.restore_feed();
            session.feed.reset();
            info!("Feed restored");
        }
    }

    fn handle_network(&self, settings: &Settings) -> usize {
        if !settings.network_auto_accept {
            return 0;
        }

        let accepted = self
            .ports
            .network
            .pending_invitations()
            .iter()
            .filter(|id| self.ports.network.accept_invitation(id))
            .count();

        if accepted > 0 {
            info!(accepted = accepted, "Connection invitations accepted");
        }
        accepted
    }

    async fn sweep_if_due(&self, now: i64, retention_hours: i64) {
        let due = {
            let mut session = self.session();
            let due = session.last_sweep_at.map_or(true, |last| {
                now - last >= self.config.sweep_interval.as_millis() as i64
            });
            if due {
                session.last_sweep_at = Some(now);
            }
            due
        };

        if due {
            if let Err(e) = self.cache.evict_stale(retention_hours).await {
                warn!(error = %e, "Stale job URL sweep failed");
            }
        }
    }

    /// Leaving the feed forgets the placeholder: the page re-renders it on return
    fn track_mode(&self, mode: PageMode) {
        let mut session = self.session();
        if session.last_mode == Some(PageMode::Feed) && mode != PageMode::Feed {
            session.feed.reset();
        }
        session.last_mode = Some(mode);
    }

    fn release_feed(&self) {
        let mut session = self.session();
        if session.feed.placeholder_shown {
            self.ports.feed.restore_feed();
            session.feed.reset();
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // A panicking tick must not wedge later ticks
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{
        KEY_COMPANY_BLACKLIST, KEY_DOMAIN_BLACKLIST, KEY_ENABLED, KEY_FEED_HIDE,
        KEY_NETWORK_AUTO_ACCEPT, KEY_REMOVE_PROMOTED, KEY_SHOW_ICONS,
    };
    use crate::domain::{CachedJobUrl, HOUR_MS};
    use crate::port::dom_job_source::mocks::{MockDomJobSource, ScriptedPosting};
    use crate::port::key_value_store::mocks::MemoryKeyValueStore;
    use crate::port::page_context::mocks::{MockFeedSurface, MockNetworkSurface, MockPageContext};
    use crate::port::time_provider::mocks::MockTimeProvider;
    use crate::port::url_resolver::mocks::{MockBehavior, MockUrlResolver};
    use serde_json::json;

    const JOBS_URL: &str = "https://www.linkedin.com/jobs/search/?keywords=rust";
    const FEED_URL: &str = "https://www.linkedin.com/feed/";
    const T0: i64 = 1_700_000_000_000;

    struct Harness {
        poll: PollLoop,
        page: Arc<MockPageContext>,
        jobs: Arc<MockDomJobSource>,
        feed: Arc<MockFeedSurface>,
        network: Arc<MockNetworkSurface>,
        settings: Arc<MemoryKeyValueStore>,
        cache_store: Arc<MemoryKeyValueStore>,
        resolver: Arc<MockUrlResolver>,
        clock: Arc<MockTimeProvider>,
    }

    fn harness(mode: ResolutionMode, resolver: MockUrlResolver) -> Harness {
        let page = Arc::new(MockPageContext::at(JOBS_URL));
        let jobs = Arc::new(MockDomJobSource::new(vec![
            ScriptedPosting::new("1", "Acme Corp", "Backend").with_footer("Promovida"),
            ScriptedPosting::new("2", "Foo Inc", "Frontend"),
            ScriptedPosting::new("3", "Globex", "SRE").simple_apply(),
        ]));
        let feed = Arc::new(MockFeedSurface::new());
        let network = Arc::new(MockNetworkSurface::new(&["inv-1", "inv-2"]));
        let settings = Arc::new(MemoryKeyValueStore::new());
        let cache_store = Arc::new(MemoryKeyValueStore::new());
        let resolver = Arc::new(resolver);
        let clock = Arc::new(MockTimeProvider::new(T0));
        let cache = Arc::new(JobUrlCache::new(cache_store.clone(), clock.clone()));

        let poll = PollLoop::new(
            PollConfig {
                interval: Duration::from_millis(10),
                sweep_interval: Duration::from_secs(3600),
                resolution_mode: mode,
            },
            PagePorts {
                page: page.clone(),
                jobs: jobs.clone(),
                feed: feed.clone(),
                network: network.clone(),
            },
            settings.clone(),
            cache,
            resolver.clone(),
            clock.clone(),
        );

        Harness {
            poll,
            page,
            jobs,
            feed,
            network,
            settings,
            cache_store,
            resolver,
            clock,
        }
    }

    async fn settle(poll: &PollLoop) {
        for _ in 0..100 {
            if poll.in_flight() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("resolutions did not settle");
    }

    #[tokio::test]
    async fn test_disabled_tick_is_noop() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(None));
        h.settings.seed(KEY_ENABLED, json!(false));
        h.settings.seed(KEY_REMOVE_PROMOTED, json!(true));

        let state = h.poll.tick().await.unwrap();

        assert!(!state.enabled);
        assert_eq!(h.resolver.call_count(), 0);
        assert!(h.jobs.removed().is_empty());
        assert!(h.cache_store.is_empty());
    }

    #[tokio::test]
    async fn test_jobs_tick_removes_promoted_and_resolves_external() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(None));
        h.settings.seed(KEY_REMOVE_PROMOTED, json!(true));

        let state = h.poll.tick().await.unwrap();

        assert_eq!(state.mode, PageMode::JobsListing);
        assert_eq!(h.jobs.removed(), vec!["1"]);
        assert_eq!(state.removed_jobs, 1);
        assert_eq!(state.visible_jobs, 2);
        // simple-apply posting "3" is never resolved
        assert_eq!(h.resolver.calls_for("3"), 0);
        assert_eq!(h.resolver.call_count(), 2);
        assert_eq!(state.dispatched_resolutions, 2);
    }

    #[tokio::test]
    async fn test_resolved_jobs_not_refetched_on_later_ticks() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(Some("https://a.io/x")));

        h.poll.tick().await.unwrap();
        h.clock.advance(2_000);
        let state = h.poll.tick().await.unwrap();

        assert_eq!(h.resolver.call_count(), 2);
        assert_eq!(state.dispatched_resolutions, 0);
    }

    #[tokio::test]
    async fn test_failed_resolution_retried_next_tick() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::failing("HTTP 500"));

        h.poll.tick().await.unwrap();
        h.poll.tick().await.unwrap();

        assert_eq!(h.resolver.calls_for("1"), 2);
        assert!(h.cache_store.is_empty());
    }

    #[tokio::test]
    async fn test_domain_blacklist_applies_once_resolved() {
        let resolver = MockUrlResolver::returning(Some("https://boards.greenhouse.io/foo/2"));
        let h = harness(ResolutionMode::FireAndForget, resolver);
        h.settings.seed(KEY_DOMAIN_BLACKLIST, json!(["greenhouse.io"]));

        // first tick only dispatches; unresolved jobs stay visible
        let state = h.poll.tick().await.unwrap();
        assert_eq!(state.removed_jobs, 0);
        assert_eq!(state.dispatched_resolutions, 2);

        settle(&h.poll).await;
        let state = h.poll.tick().await.unwrap();
        assert_eq!(state.removed_jobs, 2);
        assert_eq!(h.jobs.removed(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_fire_and_forget_overlap_may_fetch_twice() {
        let resolver = MockUrlResolver::returning(Some("https://a.io/x"))
            .with_delay(Duration::from_millis(50));
        let h = harness(ResolutionMode::FireAndForget, resolver);

        h.poll.tick().await.unwrap();
        tokio::task::yield_now().await;
        h.poll.tick().await.unwrap();
        settle(&h.poll).await;

        // documented race: a second tick before the first result lands re-dispatches
        assert_eq!(h.resolver.calls_for("2"), 2);
        assert!(h.cache_store.peek("job_2").is_some());
    }

    #[tokio::test]
    async fn test_repeated_posting_resolved_once_per_tick() {
        let resolver = MockUrlResolver::returning(Some("https://a.io/x"))
            .with_delay(Duration::from_millis(20));
        let h = harness(ResolutionMode::FireAndForget, resolver);
        h.jobs.set_postings(vec![
            ScriptedPosting::new("2", "Foo Inc", "Frontend"),
            ScriptedPosting::new("2", "Foo Inc", "Frontend"),
            ScriptedPosting::new("4", "Initech", "Ops"),
        ]);

        let state = h.poll.tick().await.unwrap();
        settle(&h.poll).await;

        assert_eq!(state.dispatched_resolutions, 2);
        assert_eq!(h.resolver.calls_for("2"), 1);
        assert_eq!(h.resolver.calls_for("4"), 1);
    }

    #[tokio::test]
    async fn test_panicking_resolution_releases_in_flight_slot() {
        let resolver = MockUrlResolver::returning(Some("https://a.io/x"));
        resolver.set_behavior("2", MockBehavior::Panic("resolver blew up".to_string()));
        let h = harness(ResolutionMode::FireAndForget, resolver);

        let state = h.poll.tick().await.unwrap();
        assert_eq!(state.dispatched_resolutions, 2);
        settle(&h.poll).await;

        assert_eq!(h.poll.in_flight(), 0);
        assert!(h.cache_store.peek("job_1").is_some());
        assert!(h.cache_store.peek("job_2").is_none());

        // the next tick retries the id that panicked
        h.poll.tick().await.unwrap();
        settle(&h.poll).await;
        assert_eq!(h.resolver.calls_for("2"), 2);
    }

    #[tokio::test]
    async fn test_show_icons_annotates_visible_resolved_jobs() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(Some("https://www.acme.io/apply")));
        h.settings.seed(KEY_SHOW_ICONS, json!(true));
        h.settings.seed(KEY_COMPANY_BLACKLIST, json!(["foo"]));

        let state = h.poll.tick().await.unwrap();

        assert_eq!(state.annotated_jobs, 1);
        assert_eq!(h.jobs.annotation("1").unwrap().domain, "acme.io");
        assert!(h.jobs.annotation("2").is_none()); // removed
        assert!(h.jobs.annotation("3").is_none()); // simple apply

        let state = h.poll.tick().await.unwrap();
        assert_eq!(state.annotated_jobs, 0);
        assert_eq!(h.jobs.annotation_count(), 1);
    }

    #[tokio::test]
    async fn test_feed_placeholder_rendered_once_per_session() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(None));
        h.page.navigate(FEED_URL);
        h.settings.seed(KEY_FEED_HIDE, json!(true));

        let state = h.poll.tick().await.unwrap();
        assert!(state.feed_placeholder_shown);
        h.poll.tick().await.unwrap();
        h.poll.tick().await.unwrap();
        assert_eq!(h.feed.render_count(), 1);

        // leaving and coming back renders it again
        h.page.navigate(JOBS_URL);
        let state = h.poll.tick().await.unwrap();
        assert!(!state.feed_placeholder_shown);
        h.page.navigate(FEED_URL);
        h.poll.tick().await.unwrap();
        assert_eq!(h.feed.render_count(), 2);

        // toggling off restores the feed
        h.settings.seed(KEY_FEED_HIDE, json!(false));
        let state = h.poll.tick().await.unwrap();
        assert!(!state.feed_placeholder_shown);
        assert!(!h.feed.is_hidden());
    }

    #[tokio::test]
    async fn test_network_mode_accepts_invitations() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(None));
        h.page.navigate("https://www.linkedin.com/mynetwork/");

        let state = h.poll.tick().await.unwrap();
        assert_eq!(state.accepted_invitations, 0);

        h.settings.seed(KEY_NETWORK_AUTO_ACCEPT, json!(true));
        let state = h.poll.tick().await.unwrap();
        assert_eq!(state.accepted_invitations, 2);
        assert_eq!(h.network.accepted(), vec!["inv-1", "inv-2"]);
        // jobs handler did not run in network mode
        assert_eq!(h.resolver.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_runs_at_most_once_per_interval() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(None));
        h.page.navigate("https://www.linkedin.com/messaging/");
        let old = CachedJobUrl::new("old", None, T0 - 100 * HOUR_MS);
        h.cache_store.seed(&old.key(), serde_json::to_value(&old).unwrap());

        h.poll.tick().await.unwrap();
        assert!(h.cache_store.is_empty());

        let late = CachedJobUrl::new("late", None, T0 - 100 * HOUR_MS);
        h.cache_store.seed(&late.key(), serde_json::to_value(&late).unwrap());
        h.clock.advance(10 * 60 * 1000);
        h.poll.tick().await.unwrap();
        assert!(h.cache_store.peek("job_late").is_some());

        h.clock.advance(HOUR_MS);
        h.poll.tick().await.unwrap();
        assert!(h.cache_store.peek("job_late").is_none());
    }

    #[tokio::test]
    async fn test_settings_storage_failure_uses_defaults() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(None));
        h.settings.seed(KEY_ENABLED, json!(false));
        h.settings.set_failing(true);

        let state = h.poll.tick().await.unwrap();
        assert!(state.enabled);
        assert_eq!(h.resolver.call_count(), 2);
    }

    #[tokio::test]
    async fn test_state_published_to_subscribers() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(None));
        let mut rx = h.poll.subscribe();

        h.poll.tick().await.unwrap();

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.mode, PageMode::JobsListing);
        assert_eq!(state.last_tick_at, Some(T0));
    }

    #[tokio::test]
    async fn test_run_survives_panicking_postings_and_stops_on_shutdown() {
        let h = harness(ResolutionMode::Serialized, MockUrlResolver::returning(None));
        h.jobs.set_postings(vec![
            ScriptedPosting::panicking(),
            ScriptedPosting::new("5", "Initech", "Dev"),
        ]);
        let mut rx = h.poll.subscribe();
        let (tx, token) = shutdown_channel();

        let run = h.poll.run(token);
        let stop = async {
            rx.changed().await.unwrap();
            rx.changed().await.unwrap();
            tx.shutdown();
        };
        tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(run, stop) })
            .await
            .expect("poll loop did not stop");

        assert_eq!(rx.borrow().visible_jobs, 1);
    }
}
