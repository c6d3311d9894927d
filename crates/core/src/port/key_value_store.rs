// Key-Value Store Port (Interface)
//
// Shared across poll ticks and across contexts with no transactional
// isolation; readers must tolerate values written concurrently elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// Async string-keyed store holding JSON values, scoped to one area
/// (`sync` for settings, `local` for the URL cache).
///
/// Every failure surfaces as `AppError::Storage`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read one key (`None` when absent)
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Insert or overwrite one key
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Delete one key (absent keys are ignored)
    async fn remove(&self, key: &str) -> Result<()>;

    /// Delete several keys
    async fn remove_many(&self, keys: &[String]) -> Result<()>;

    /// Read every key in the area
    async fn get_all(&self) -> Result<HashMap<String, serde_json::Value>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store with failure injection and write counting
    #[derive(Default)]
    pub struct MemoryKeyValueStore {
        entries: Mutex<HashMap<String, serde_json::Value>>,
        failing: AtomicBool,
        writes: AtomicUsize,
    }

    impl MemoryKeyValueStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent operation fail with `AppError::Storage`
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Number of successful `set` calls
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Direct read, bypassing failure injection
        pub fn peek(&self, key: &str) -> Option<serde_json::Value> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        /// Direct write, bypassing failure injection and write counting
        pub fn seed(&self, key: &str, value: serde_json::Value) {
            self.entries.lock().unwrap().insert(key.to_string(), value);
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn check(&self) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(AppError::Storage("mock store unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for MemoryKeyValueStore {
        async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
            self.check()?;
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
            self.check()?;
            self.entries.lock().unwrap().insert(key.to_string(), value);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.check()?;
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn remove_many(&self, keys: &[String]) -> Result<()> {
            self.check()?;
            let mut entries = self.entries.lock().unwrap();
            for key in keys {
                entries.remove(key);
            }
            Ok(())
        }

        async fn get_all(&self) -> Result<HashMap<String, serde_json::Value>> {
            self.check()?;
            Ok(self.entries.lock().unwrap().clone())
        }
    }
}
