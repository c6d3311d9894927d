//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};

pub use jobsweep_core::application::url_cache::CacheStats;
pub use jobsweep_core::domain::PageState;
use jobsweep_core::domain::{PageMode, Settings};

/// page.state.v1 - Last published page state
#[derive(Debug, Default, Deserialize)]
pub struct PageStateRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageStateResponse {
    #[serde(flatten)]
    pub state: PageState,
    pub in_flight_resolutions: usize,
}

/// page.load.v1 - Replace the hosted document
#[derive(Debug, Deserialize)]
pub struct LoadPageRequest {
    pub url: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadPageResponse {
    pub url: String,
    pub mode: PageMode,
}

/// settings.get.v1 - Stored values plus the effective settings
#[derive(Debug, Default, Deserialize)]
pub struct GetSettingsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSettingsResponse {
    pub stored: serde_json::Map<String, serde_json::Value>,
    pub effective: Settings,
}

/// settings.set.v1 - Write one setting; a null value resets it
#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    pub key: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSettingResponse {
    pub key: String,
    pub reset: bool,
}

/// cache.stats.v1
#[derive(Debug, Default, Deserialize)]
pub struct CacheStatsRequest {
    // No parameters needed
}

/// cache.evict.v1 - Sweep stale entries now
#[derive(Debug, Default, Deserialize)]
pub struct EvictCacheRequest {
    /// Overrides the configured retention window
    #[serde(default)]
    pub retention_hours: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictCacheResponse {
    pub retention_hours: i64,
    pub evicted: usize,
}

/// cache.clear.v1
#[derive(Debug, Default, Deserialize)]
pub struct ClearCacheRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
}
