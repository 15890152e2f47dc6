//! EDGESCAN — strategy-driven options edge scanner.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the provider → engine → job manager chain, and serves the
//! scan API until shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use edgescan::config::AppConfig;
use edgescan::data::cached::CachedProvider;
use edgescan::data::yahoo::YahooProvider;
use edgescan::engine::cache::ResultCache;
use edgescan::engine::evaluator::StrategyEngine;
use edgescan::engine::job::JobManager;
use edgescan::server;
use edgescan::server::routes::ApiContext;
use edgescan::strategies::StrategyRegistry;

const BANNER: &str = r#"
  _____ ____   ____ _____ ____   ____    _    _   _
 | ____|  _ \ / ___| ____/ ___| / ___|  / \  | \ | |
 |  _| | | | | |  _|  _| \___ \| |     / _ \ |  \| |
 | |___| |_| | |_| | |___ ___) | |___ / ___ \| |\  |
 |_____|____/ \____|_____|____/ \____/_/   \_\_| \_|

  Options Edge Scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        quick_universe = cfg.universe.quick.len(),
        full_universe = cfg.universe.full.len(),
        scan_timeout_secs = cfg.scan_timeout().as_secs(),
        "EDGESCAN starting up"
    );

    // -- Wire components -------------------------------------------------

    let yahoo = YahooProvider::new()?;
    let provider = Arc::new(CachedProvider::new(
        Arc::new(yahoo),
        cfg.snapshot_cache_ttl(),
    ));

    let registry = Arc::new(StrategyRegistry::with_builtins());
    info!(strategies = registry.len(), "Strategy registry initialised");

    let engine = Arc::new(StrategyEngine::new(provider));
    let cache = Arc::new(ResultCache::new(cfg.result_cache_ttl()));

    let jobs = Arc::new(JobManager::new(
        engine,
        Arc::clone(&registry),
        cache,
        cfg.universe.clone(),
        cfg.scan_timeout(),
    ));

    // -- Serve -----------------------------------------------------------

    if cfg.server.enabled {
        let state = Arc::new(ApiContext {
            jobs,
            registry,
        });
        server::spawn_server(state, cfg.server.port);
    }

    info!("Ready. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("edgescan=info"));

    let json_logging = std::env::var("EDGESCAN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
