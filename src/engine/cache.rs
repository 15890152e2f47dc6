//! Result cache — TTL-guarded scan results keyed by strategy and
//! scan type.
//!
//! Staleness is checked lazily on read; there is no background sweep.
//! The lock is held only for map access, never across await points, so
//! status polling and a running scan never contend on it for long.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::{ScanResult, ScanType};

/// Cache key: one slot per (strategy, universe) pair.
pub type CacheKey = (String, ScanType);

struct CacheEntry {
    result: ScanResult,
    inserted_at: DateTime<Utc>,
}

/// Thread-safe TTL store for scan results.
pub struct ResultCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached result if present and fresh, `None` otherwise.
    pub fn get(&self, key: &CacheKey) -> Option<ScanResult> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(key).and_then(|entry| {
            if Utc::now() - entry.inserted_at < self.ttl {
                Some(entry.result.clone())
            } else {
                None
            }
        })
    }

    /// Unconditional overwrite, stamping the insertion time.
    pub fn put(&self, key: CacheKey, result: ScanResult) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Utc::now(),
            },
        );
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .values()
            .filter(|e| now - e.inserted_at < self.ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
