//! Configuration loading from TOML with environment variable overrides.
//!
//! Every field has a built-in default so the scanner runs with no config
//! file at all; a `config.toml` can override any section. `SCAN_TIMEOUT`
//! (seconds) is resolved from the environment last, taking precedence
//! over both.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Env var overriding the scan timeout, in seconds.
const SCAN_TIMEOUT_ENV: &str = "SCAN_TIMEOUT";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub server: ServerConfig,
    pub universe: UniverseConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    /// Wall-clock budget for one scan, in seconds.
    pub scan_timeout_secs: u64,
    /// TTL for cached scan results, in seconds.
    pub result_cache_ttl_secs: u64,
    /// TTL for cached per-ticker snapshots, in seconds.
    pub snapshot_cache_ttl_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_timeout_secs: 300,
            result_cache_ttl_secs: 5 * 60,
            snapshot_cache_ttl_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 5000,
        }
    }
}

/// Ticker universes per scan type. The quick list trades coverage for
/// turnaround; the full list is the S&P 100.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UniverseConfig {
    pub quick: Vec<String>,
    pub full: Vec<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            quick: to_strings(QUICK_TICKERS),
            full: to_strings(SP100_TICKERS),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults
    /// when the file doesn't exist.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Effective scan timeout: `SCAN_TIMEOUT` env var wins over config.
    pub fn scan_timeout(&self) -> Duration {
        let secs = std::env::var(SCAN_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(self.scanner.scan_timeout_secs);
        Duration::from_secs(secs)
    }

    pub fn result_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.scanner.result_cache_ttl_secs as i64)
    }

    pub fn snapshot_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.scanner.snapshot_cache_ttl_secs as i64)
    }
}

fn to_strings(tickers: &[&str]) -> Vec<String> {
    tickers.iter().map(|t| t.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Default universes
// ---------------------------------------------------------------------------

/// Liquid large-caps for fast scans.
const QUICK_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA", "AMD", "NFLX", "CRM",
    "JPM", "BAC", "GS", "V", "MA", "XOM", "CVX", "JNJ", "UNH", "PFE",
    "WMT", "HD", "MCD", "NKE", "SBUX", "KO", "PEP", "COST", "DIS", "PYPL",
];

/// S&P 100 (OEX) constituents.
const SP100_TICKERS: &[&str] = &[
    "AAPL", "ABBV", "ABT", "ACN", "ADBE", "AIG", "AMD", "AMGN", "AMT", "AMZN",
    "AVGO", "AXP", "BA", "BAC", "BK", "BKNG", "BLK", "BMY", "BRK-B", "C",
    "CAT", "CHTR", "CL", "CMCSA", "COF", "COP", "COST", "CRM", "CSCO", "CVS",
    "CVX", "DE", "DHR", "DIS", "DOW", "DUK", "EMR", "EXC", "F", "FDX",
    "GD", "GE", "GILD", "GM", "GOOG", "GOOGL", "GS", "HD", "HON", "IBM",
    "INTC", "JNJ", "JPM", "KHC", "KO", "LIN", "LLY", "LMT", "LOW", "MA",
    "MCD", "MDLZ", "MDT", "MET", "META", "MMM", "MO", "MRK", "MS", "MSFT",
    "NEE", "NFLX", "NKE", "NVDA", "ORCL", "PEP", "PFE", "PG", "PM", "PYPL",
    "QCOM", "RTX", "SBUX", "SCHW", "SO", "SPG", "T", "TGT", "TMO", "TMUS",
    "TXN", "UNH", "UNP", "UPS", "USB", "V", "VZ", "WBA", "WFC", "WMT", "XOM",
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
