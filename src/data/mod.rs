//! Market-data providers.
//!
//! Defines the `SnapshotProvider` trait the scan engine consumes, a
//! concrete chart-API implementation, a TTL caching wrapper, and the
//! indicator math shared between them.

pub mod cached;
pub mod indicators;
pub mod yahoo;

use async_trait::async_trait;

use crate::types::{DataError, MarketSnapshot};

/// Abstraction over the market-data source.
///
/// The scan engine only ever sees this trait: one snapshot per ticker
/// per call, or a `DataError` the job loop treats as non-fatal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch a point-in-time snapshot for one ticker.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DataError>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}
