//! Jobsweep daemon - composition root
//!
//! Wires the SQLite store, the hosted HTML page, the HTTP resolver, the poll
//! loop and the JSON-RPC server, then runs until Ctrl-C.

mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use jobsweep_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use jobsweep_core::application::{shutdown_channel, JobUrlCache, PagePorts, PollLoop};
use jobsweep_core::port::time_provider::SystemTimeProvider;
use jobsweep_core::port::{KeyValueStore, PageContext, TimeProvider};
use jobsweep_infra_html::{HtmlPage, HttpUrlResolver};
use jobsweep_infra_sqlite::{create_pool, run_migrations, SqliteKeyValueStore, AREA_LOCAL, AREA_SYNC};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "jobsweep")]
#[command(about = "Job listing filter daemon", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (TOML). Defaults to <config dir>/jobsweep/config.toml when present.
    #[arg(long, env = "JOBSWEEP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Configuration + logging
    let config = config::load(args.config.as_deref())?;
    let _log_guard = logging::init(&config.logging)?;

    info!("Jobsweep v{} starting...", VERSION);

    // 2. Storage (two areas over one database)
    let database_url = config.storage.database_url()?;
    info!(database_url = %database_url, "Initializing database...");
    let pool = create_pool(&database_url)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let settings_store: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(
        pool.clone(),
        AREA_SYNC,
        time_provider.clone(),
    ));
    let cache_store: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(
        pool.clone(),
        AREA_LOCAL,
        time_provider.clone(),
    ));
    let cache = Arc::new(JobUrlCache::new(cache_store, time_provider.clone()));

    // 3. Hosted page
    let page = Arc::new(HtmlPage::new());
    if let Some(url) = &config.page.url {
        let document = match &config.page.snapshot_path {
            Some(path) => {
                let path = shellexpand::tilde(path).into_owned();
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read page snapshot {}", path))?
            }
            None => String::new(),
        };
        page.load(url, document).context("Initial page load failed")?;
    }

    // 4. Resolver
    let resolver = Arc::new(
        HttpUrlResolver::new(config.resolver.to_settings()).context("Resolver setup failed")?,
    );
    if config.resolver.cookie.is_none() {
        warn!("No resolver cookie configured; job URL lookups will likely be rejected");
    }

    // 5. Poll loop
    let poll = Arc::new(PollLoop::new(
        config.poll.to_poll_config(),
        PagePorts {
            page: page.clone(),
            jobs: page.clone(),
            feed: page.clone(),
            network: page.clone(),
        },
        settings_store.clone(),
        cache.clone(),
        resolver,
        time_provider.clone(),
    ));

    // 6. JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_server = RpcServer::new(
        RpcServerConfig {
            host: config.rpc.host.clone(),
            port: config.rpc.port,
        },
        RpcHandler::new(poll.clone(), page.clone(), settings_store, cache),
    );
    let (rpc_addr, rpc_handle) = rpc_server.start().await.context("RPC server start failed")?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let poll_handle = {
        let poll = poll.clone();
        tokio::spawn(async move { poll.run(shutdown_rx).await })
    };

    info!(rpc_addr = %rpc_addr, "System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(Duration::from_secs(5), poll_handle).await;
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
