//! TTL caching wrapper around any snapshot provider.
//!
//! Scans within the TTL window reuse each ticker's snapshot instead of
//! re-hitting the upstream feed. Staleness is checked lazily on read;
//! expired entries are overwritten in place on the next fetch.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::SnapshotProvider;
use crate::types::{DataError, MarketSnapshot};

struct CacheEntry {
    snapshot: MarketSnapshot,
    inserted_at: DateTime<Utc>,
}

/// Snapshot provider that memoises an inner provider per ticker.
pub struct CachedProvider {
    inner: Arc<dyn SnapshotProvider>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn SnapshotProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|e| now - e.inserted_at < self.ttl)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SnapshotProvider for CachedProvider {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DataError> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(ticker) {
                if Utc::now() - entry.inserted_at < self.ttl {
                    debug!(ticker, "Snapshot cache hit");
                    return Ok(entry.snapshot.clone());
                }
            }
        }

        // Miss or expired — fetch upstream. Failures are not cached, so
        // a flaky ticker is retried on the next scan.
        let snapshot = self.inner.fetch_snapshot(ticker).await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            ticker.to_string(),
            CacheEntry {
                snapshot: snapshot.clone(),
                inserted_at: Utc::now(),
            },
        );

        Ok(snapshot)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
