// URL Resolver Port
// Resolves a job id to its external application URL via the platform's API.
// The call is rate limited upstream (HTTP 429), hence the resolve-once cache.

use async_trait::async_trait;
use thiserror::Error;

/// Resolution errors. None of them is ever written to the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Malformed response body: {0}")]
    Malformed(String),

    #[error("Resolution failed: {0}")]
    Failed(String),
}

/// External URL resolution
///
/// Implementations:
/// - HttpUrlResolver: authenticated request to the platform API (infra-html)
#[async_trait]
pub trait UrlResolver: Send + Sync {
    /// Resolve a job id to its external apply URL.
    ///
    /// `Ok(None)` means the posting genuinely has no external URL.
    /// No timeout is enforced here; a hung call only stalls this job.
    async fn resolve(&self, job_id: &str) -> Result<Option<String>, ResolutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock resolver behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return this URL (or "no URL") for every job
        Url(Option<String>),
        /// Fail every call
        Fail(String),
        /// Panic inside the call
        Panic(String),
    }

    /// Mock URL resolver with per-job overrides and call accounting
    pub struct MockUrlResolver {
        default: MockBehavior,
        overrides: Mutex<HashMap<String, MockBehavior>>,
        calls: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl MockUrlResolver {
        pub fn new(default: MockBehavior) -> Self {
            Self {
                default,
                overrides: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn returning(url: Option<&str>) -> Self {
            Self::new(MockBehavior::Url(url.map(str::to_string)))
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        /// Sleep before answering (simulates network latency)
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn set_behavior(&self, job_id: &str, behavior: MockBehavior) {
            self.overrides
                .lock()
                .unwrap()
                .insert(job_id.to_string(), behavior);
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_for(&self, job_id: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|id| id.as_str() == job_id)
                .count()
        }
    }

    #[async_trait]
    impl UrlResolver for MockUrlResolver {
        async fn resolve(&self, job_id: &str) -> Result<Option<String>, ResolutionError> {
            self.calls.lock().unwrap().push(job_id.to_string());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let behavior = self
                .overrides
                .lock()
                .unwrap()
                .get(job_id)
                .cloned()
                .unwrap_or_else(|| self.default.clone());

            match behavior {
                MockBehavior::Url(url) => Ok(url),
                MockBehavior::Fail(msg) => Err(ResolutionError::Failed(msg)),
                MockBehavior::Panic(msg) => panic!("{}", msg),
            }
        }
    }
}
