// Page Domain Model - mode dispatch, session state, published page state

use serde::{Deserialize, Serialize};

use crate::domain::cached_url::url_host;

/// Page mode derived from the current URL. At most one handler runs per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageMode {
    Feed,
    JobsListing,
    NetworkGrowth,
    Other,
}

impl PageMode {
    /// Classify a page by URL path. Unparseable URLs are `Other`.
    pub fn from_url(raw: &str) -> Self {
        let Ok(parsed) = url::Url::parse(raw) else {
            return PageMode::Other;
        };

        let path = parsed.path();
        if path_has_prefix(path, "/feed") {
            PageMode::Feed
        } else if path_has_prefix(path, "/jobs") {
            PageMode::JobsListing
        } else if path_has_prefix(path, "/mynetwork") {
            PageMode::NetworkGrowth
        } else {
            PageMode::Other
        }
    }
}

/// `/jobs` matches `/jobs` and `/jobs/search/` but not `/jobseekers`
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl std::fmt::Display for PageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageMode::Feed => write!(f, "FEED"),
            PageMode::JobsListing => write!(f, "JOBS_LISTING"),
            PageMode::NetworkGrowth => write!(f, "NETWORK_GROWTH"),
            PageMode::Other => write!(f, "OTHER"),
        }
    }
}

/// Per-session feed state owned by the poll loop.
///
/// Keeps the focus placeholder from being rendered again on every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSession {
    pub placeholder_shown: bool,
}

impl FeedSession {
    pub fn reset(&mut self) {
        self.placeholder_shown = false;
    }
}

/// Favicon + domain label attached to a visible posting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingAnnotation {
    pub domain: String,
    pub favicon_url: String,
}

impl PostingAnnotation {
    /// Build from a resolved apply URL; `None` if the URL has no host
    pub fn for_url(job_url: &str) -> Option<Self> {
        let host = url_host(job_url)?;
        let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();
        Some(Self {
            favicon_url: format!("https://{}/favicon.ico", host),
            domain,
        })
    }
}

/// Snapshot of what the last tick did, published to other contexts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub url: Option<String>,
    pub mode: PageMode,
    pub enabled: bool,
    pub visible_jobs: usize,
    pub removed_jobs: usize,
    pub annotated_jobs: usize,
    pub dispatched_resolutions: usize,
    pub feed_placeholder_shown: bool,
    pub accepted_invitations: usize,
    pub last_tick_at: Option<i64>, // epoch ms
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            url: None,
            mode: PageMode::Other,
            enabled: true,
            visible_jobs: 0,
            removed_jobs: 0,
            annotated_jobs: 0,
            dispatched_resolutions: 0,
            feed_placeholder_shown: false,
            accepted_invitations: 0,
            last_tick_at: None,
        }
    }
}
