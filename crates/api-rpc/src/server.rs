//! JSON-RPC Server
//!
//! Serves the messaging channel on localhost TCP.

use crate::handler::RpcHandler;
use crate::types::{
    CacheStatsRequest, ClearCacheRequest, EvictCacheRequest, GetSettingsRequest,
    LoadPageRequest, PageStateRequest, SetSettingRequest,
};
use jobsweep_core::error::{AppError, Result};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9631;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// Register `$name` as `handler.$method(params)`.
///
/// The `optional` form accepts absent or null params as `Default::default()`.
macro_rules! register {
    (optional $module:expr, $handler:expr, $name:literal, $req:ty, $method:ident) => {{
        let handler = $handler.clone();
        $module
            .register_async_method($name, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: $req = params.parse::<Option<$req>>()?.unwrap_or_default();
                    handler.$method(req).await
                }
            })
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }};
    ($module:expr, $handler:expr, $name:literal, $req:ty, $method:ident) => {{
        let handler = $handler.clone();
        $module
            .register_async_method($name, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: $req = params.parse()?;
                    handler.$method(req).await
                }
            })
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }};
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Build the method table
    pub fn module(&self) -> Result<RpcModule<()>> {
        let mut module = RpcModule::new(());

        register!(optional module, self.handler, "page.state.v1", PageStateRequest, page_state);
        register!(module, self.handler, "page.load.v1", LoadPageRequest, load_page);
        register!(optional module, self.handler, "settings.get.v1", GetSettingsRequest, get_settings);
        register!(module, self.handler, "settings.set.v1", SetSettingRequest, set_setting);
        register!(optional module, self.handler, "cache.stats.v1", CacheStatsRequest, cache_stats);
        register!(optional module, self.handler, "cache.evict.v1", EvictCacheRequest, evict_cache);
        register!(optional module, self.handler, "cache.clear.v1", ClearCacheRequest, clear_cache);

        Ok(module)
    }

    /// Start the JSON-RPC server. Binds only to the configured host.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind RPC server on {}: {}", addr, e)))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let module = self.module()?;
        let handle = server.start(module);

        info!(addr = %local_addr, "JSON-RPC server started");
        Ok((local_addr, handle))
    }
}
