//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{
    CacheStats, CacheStatsRequest, ClearCacheRequest, ClearCacheResponse, EvictCacheRequest,
    EvictCacheResponse, GetSettingsRequest, GetSettingsResponse, LoadPageRequest,
    LoadPageResponse, PageStateRequest, PageStateResponse, SetSettingRequest, SetSettingResponse,
};
use jobsweep_core::application::{JobUrlCache, PollLoop, SettingsReader};
use jobsweep_core::domain::settings::{is_valid_retention, MAX_CACHE_RETENTION_HOURS};
use jobsweep_core::domain::{PageMode, PageState};
use jobsweep_core::error::AppError;
use jobsweep_core::port::{KeyValueStore, PageContext};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    poll: Arc<PollLoop>,
    page: Arc<dyn PageContext>,
    settings: SettingsReader,
    cache: Arc<JobUrlCache>,
    state_rx: watch::Receiver<PageState>,
}

impl RpcHandler {
    pub fn new(
        poll: Arc<PollLoop>,
        page: Arc<dyn PageContext>,
        settings_store: Arc<dyn KeyValueStore>,
        cache: Arc<JobUrlCache>,
    ) -> Self {
        Self {
            state_rx: poll.subscribe(),
            poll,
            page,
            settings: SettingsReader::new(settings_store),
            cache,
        }
    }

    /// page.state.v1
    pub async fn page_state(
        &self,
        _params: PageStateRequest,
    ) -> Result<PageStateResponse, ErrorObjectOwned> {
        Ok(PageStateResponse {
            state: self.state_rx.borrow().clone(),
            in_flight_resolutions: self.poll.in_flight(),
        })
    }

    /// page.load.v1
    pub async fn load_page(
        &self,
        params: LoadPageRequest,
    ) -> Result<LoadPageResponse, ErrorObjectOwned> {
        self.page
            .load(&params.url, params.html)
            .map_err(to_rpc_error)?;

        Ok(LoadPageResponse {
            mode: PageMode::from_url(&params.url),
            url: params.url,
        })
    }

    /// settings.get.v1
    pub async fn get_settings(
        &self,
        _params: GetSettingsRequest,
    ) -> Result<GetSettingsResponse, ErrorObjectOwned> {
        let stored = self.settings.raw().await.map_err(to_rpc_error)?;
        let effective = self.settings.load().await;
        Ok(GetSettingsResponse { stored, effective })
    }

    /// settings.set.v1
    pub async fn set_setting(
        &self,
        params: SetSettingRequest,
    ) -> Result<SetSettingResponse, ErrorObjectOwned> {
        let reset = match params.value {
            None | Some(serde_json::Value::Null) => {
                self.settings.reset(&params.key).await.map_err(to_rpc_error)?;
                true
            }
            Some(value) => {
                self.settings
                    .set(&params.key, value)
                    .await
                    .map_err(to_rpc_error)?;
                false
            }
        };

        info!(key = %params.key, reset = reset, "Setting updated");
        Ok(SetSettingResponse {
            key: params.key,
            reset,
        })
    }

    /// cache.stats.v1
    pub async fn cache_stats(
        &self,
        _params: CacheStatsRequest,
    ) -> Result<CacheStats, ErrorObjectOwned> {
        self.cache.stats().await.map_err(to_rpc_error)
    }

    /// cache.evict.v1
    pub async fn evict_cache(
        &self,
        params: EvictCacheRequest,
    ) -> Result<EvictCacheResponse, ErrorObjectOwned> {
        let retention_hours = match params.retention_hours {
            Some(hours) if !is_valid_retention(hours) => {
                return Err(to_rpc_error(AppError::Validation(format!(
                    "retention_hours must be between 1 and {}, got {}",
                    MAX_CACHE_RETENTION_HOURS, hours
                ))));
            }
            Some(hours) => hours,
            None => self.settings.load().await.cache_retention_hours,
        };

        let evicted = self
            .cache
            .evict_stale(retention_hours)
            .await
            .map_err(to_rpc_error)?;

        Ok(EvictCacheResponse {
            retention_hours,
            evicted,
        })
    }

    /// cache.clear.v1
    pub async fn clear_cache(
        &self,
        _params: ClearCacheRequest,
    ) -> Result<ClearCacheResponse, ErrorObjectOwned> {
        let cleared = self.cache.clear_all().await.map_err(to_rpc_error)?;
        Ok(ClearCacheResponse { cleared })
    }
}
