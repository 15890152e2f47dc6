//! Scan job orchestration — the single global scan state machine.
//!
//! At most one scan runs process-wide. A start request checks the
//! result cache, then flips the shared state to `Running` and spawns
//! the scan loop on its own task so status polling never blocks on
//! scan work. The loop walks the ticker universe in order, skipping
//! tickers whose data fetch fails and checking the wall-clock budget
//! before each one. Terminal state stays visible until the next start
//! request overwrites it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::UniverseConfig;
use crate::engine::cache::{CacheKey, ResultCache};
use crate::engine::evaluator::StrategyEngine;
use crate::strategies::{Strategy, StrategyRegistry};
use crate::types::{Candidate, ScanError, ScanResult, ScanType};

// ---------------------------------------------------------------------------
// Job state
// ---------------------------------------------------------------------------

/// Lifecycle of the global scan slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn is_running(self) -> bool {
        matches!(self, JobStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::TimedOut
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Idle => write!(f, "idle"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// The one mutable scan-state object, owned by the manager's lock.
#[derive(Debug, Clone)]
struct ScanJob {
    id: Option<Uuid>,
    strategy_key: Option<String>,
    scan_type: Option<ScanType>,
    status: JobStatus,
    progress: usize,
    total: usize,
    current_ticker: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl ScanJob {
    fn idle() -> Self {
        Self {
            id: None,
            strategy_key: None,
            scan_type: None,
            status: JobStatus::Idle,
            progress: 0,
            total: 0,
            current_ticker: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }
}

/// Non-blocking view of the job state for polling clients.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub status: JobStatus,
    pub progress: usize,
    pub total: usize,
    pub current_ticker: Option<String>,
    pub has_results: bool,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Owns the global scan slot and the scan loop.
pub struct JobManager {
    state: Arc<RwLock<ScanJob>>,
    cache: Arc<ResultCache>,
    engine: Arc<StrategyEngine>,
    registry: Arc<StrategyRegistry>,
    universe: UniverseConfig,
    scan_timeout: Duration,
}

impl JobManager {
    pub fn new(
        engine: Arc<StrategyEngine>,
        registry: Arc<StrategyRegistry>,
        cache: Arc<ResultCache>,
        universe: UniverseConfig,
        scan_timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(ScanJob::idle())),
            cache,
            engine,
            registry,
            universe,
            scan_timeout,
        }
    }

    fn universe_for(&self, scan_type: ScanType) -> Vec<String> {
        match scan_type {
            ScanType::Quick => self.universe.quick.clone(),
            ScanType::Full => self.universe.full.clone(),
        }
    }

    /// Start a scan, returning immediately with the job id.
    ///
    /// Rejected with `AlreadyRunning` while a scan is in flight (the
    /// existing job is untouched) and `UnknownStrategy` for an
    /// unregistered key. A fresh cached result short-circuits straight
    /// to `Completed` without spawning the loop.
    pub async fn start_scan(
        &self,
        strategy_key: &str,
        scan_type: ScanType,
    ) -> Result<Uuid, ScanError> {
        let mut state = self.state.write().await;
        if state.status.is_running() {
            return Err(ScanError::AlreadyRunning);
        }

        let strategy = self
            .registry
            .get(strategy_key)
            .ok_or_else(|| ScanError::UnknownStrategy(strategy_key.to_string()))?;

        let tickers = self.universe_for(scan_type);
        let job_id = Uuid::new_v4();
        let key: CacheKey = (strategy_key.to_string(), scan_type);
        let now = Utc::now();

        if let Some(cached) = self.cache.get(&key) {
            info!(
                job_id = %job_id,
                strategy = strategy_key,
                scan_type = %scan_type,
                age_secs = (now - cached.timestamp).num_seconds(),
                "Serving scan from cache"
            );
            *state = ScanJob {
                id: Some(job_id),
                strategy_key: Some(key.0),
                scan_type: Some(scan_type),
                status: JobStatus::Completed,
                progress: tickers.len(),
                total: tickers.len(),
                current_ticker: None,
                started_at: Some(now),
                finished_at: Some(now),
                error: None,
            };
            return Ok(job_id);
        }

        info!(
            job_id = %job_id,
            strategy = strategy_key,
            scan_type = %scan_type,
            universe = tickers.len(),
            timeout_secs = self.scan_timeout.as_secs(),
            "Starting scan"
        );

        *state = ScanJob {
            id: Some(job_id),
            strategy_key: Some(strategy_key.to_string()),
            scan_type: Some(scan_type),
            status: JobStatus::Running,
            progress: 0,
            total: tickers.len(),
            current_ticker: None,
            started_at: Some(now),
            finished_at: None,
            error: None,
        };
        drop(state);

        tokio::spawn(run_scan(
            Arc::clone(&self.state),
            Arc::clone(&self.cache),
            Arc::clone(&self.engine),
            strategy,
            key,
            tickers,
            self.scan_timeout,
        ));

        Ok(job_id)
    }

    /// Snapshot of the current job state; safe to call concurrently
    /// with a running scan.
    pub async fn status(&self) -> StatusSnapshot {
        let state = self.state.read().await;
        let has_results = self.cached_key(&state).is_some();
        StatusSnapshot {
            running: state.status.is_running(),
            status: state.status,
            progress: state.progress,
            total: state.total,
            current_ticker: state.current_ticker.clone(),
            has_results,
            error: state.error.clone(),
        }
    }

    /// Cached result for the most recent job, if still fresh.
    pub async fn results(&self) -> Result<ScanResult, ScanError> {
        let state = self.state.read().await;
        self.cached_key(&state)
            .and_then(|key| self.cache.get(&key))
            .ok_or(ScanError::NoResults)
    }

    fn cached_key(&self, state: &ScanJob) -> Option<CacheKey> {
        let key = state.strategy_key.clone()?;
        let scan_type = state.scan_type?;
        let cache_key = (key, scan_type);
        self.cache.get(&cache_key).map(|_| cache_key)
    }
}

// ---------------------------------------------------------------------------
// Scan loop
// ---------------------------------------------------------------------------

async fn run_scan(
    state: Arc<RwLock<ScanJob>>,
    cache: Arc<ResultCache>,
    engine: Arc<StrategyEngine>,
    strategy: Arc<dyn Strategy>,
    key: CacheKey,
    tickers: Vec<String>,
    timeout: Duration,
) {
    let started = Instant::now();
    let total = tickers.len();
    let mut candidates: Vec<Candidate> = Vec::with_capacity(total);
    let mut skipped = 0usize;
    let mut timed_out = false;

    for (i, ticker) in tickers.iter().enumerate() {
        // Budget check happens before each unit of work, so a slow
        // fetch can overrun the budget by at most one ticker.
        if started.elapsed() >= timeout {
            warn!(
                progress = i,
                total,
                elapsed_secs = started.elapsed().as_secs(),
                "Scan timed out"
            );
            timed_out = true;
            break;
        }

        {
            let mut s = state.write().await;
            s.current_ticker = Some(ticker.clone());
        }

        match engine.evaluate(ticker, strategy.as_ref()).await {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "Ticker skipped");
                skipped += 1;
            }
        }

        {
            let mut s = state.write().await;
            s.progress = i + 1;
        }
    }

    let finished_at = Utc::now();
    let evaluated = candidates.len();
    let passed = candidates.iter().filter(|c| c.passed).count();

    let (status, error) = if timed_out {
        if candidates.is_empty() {
            (
                JobStatus::TimedOut,
                Some(format!(
                    "scan timed out after {}s with no tickers evaluated",
                    timeout.as_secs()
                )),
            )
        } else {
            // Partial results below are worth keeping.
            (JobStatus::TimedOut, None)
        }
    } else if total > 0 && skipped == total {
        (
            JobStatus::Failed,
            Some(format!("market data unavailable for all {total} tickers")),
        )
    } else {
        (JobStatus::Completed, None)
    };

    if evaluated > 0 || status == JobStatus::Completed {
        let result = ScanResult {
            strategy: strategy.descriptor().clone(),
            scan_type: key.1,
            candidates,
            passed_count: passed,
            total_count: total,
            skipped_count: skipped,
            structure: strategy.option_structure(),
            exits: strategy.exit_rules(),
            timestamp: finished_at,
        };
        cache.put(key.clone(), result);
    }

    let mut s = state.write().await;
    s.status = status;
    s.finished_at = Some(finished_at);
    s.current_ticker = None;
    s.error = error;

    info!(
        job_id = ?s.id,
        strategy = %key.0,
        scan_type = %key.1,
        status = %status,
        evaluated,
        passed,
        skipped,
        total,
        elapsed_secs = s
            .started_at
            .map(|t| (finished_at - t).num_seconds())
            .unwrap_or_default(),
        "Scan finished"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SnapshotProvider;
    use crate::types::{DataError, MarketSnapshot};
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Provider test double: configurable failures and per-fetch delay.
    struct StubProvider {
        fail: HashSet<String>,
        delay: Duration,
        snapshot: MarketSnapshot,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                fail: HashSet::new(),
                delay: Duration::ZERO,
                // Confirmed uptrend: passes the trend_following screen.
                snapshot: MarketSnapshot {
                    price: 110.0,
                    return_5d: Some(2.0),
                    return_20d: Some(6.0),
                    iv_rank: Some(35.0),
                    rsi: Some(60.0),
                    ma20: Some(105.0),
                    ma50: Some(100.0),
                    realized_vol: Some(25.0),
                    days_to_earnings: None,
                },
            }
        }

        fn failing_for(mut self, tickers: &[&str]) -> Self {
            self.fail = tickers.iter().map(|t| t.to_string()).collect();
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl SnapshotProvider for StubProvider {
        async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DataError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.contains(ticker) {
                return Err(DataError::unavailable(ticker, "stubbed outage"));
            }
            Ok(self.snapshot.clone())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn universe(tickers: &[&str]) -> UniverseConfig {
        UniverseConfig {
            quick: tickers.iter().map(|t| t.to_string()).collect(),
            full: tickers.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn make_manager(provider: StubProvider, tickers: &[&str], timeout: Duration) -> JobManager {
        JobManager::new(
            Arc::new(StrategyEngine::new(Arc::new(provider))),
            Arc::new(StrategyRegistry::with_builtins()),
            Arc::new(ResultCache::new(chrono::Duration::minutes(5))),
            universe(tickers),
            timeout,
        )
    }

    async fn wait_terminal(manager: &JobManager) -> StatusSnapshot {
        for _ in 0..500 {
            let status = manager.status().await;
            if !status.running {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("scan did not reach a terminal state");
    }

    #[tokio::test]
    async fn test_full_scan_completes_with_results() {
        let tickers = ["AAPL", "MSFT", "NVDA"];
        let manager = make_manager(StubProvider::new(), &tickers, Duration::from_secs(60));

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        let status = wait_terminal(&manager).await;

        assert_eq!(status.status, JobStatus::Completed);
        assert_eq!(status.progress, 3);
        assert_eq!(status.total, 3);
        assert!(status.has_results);
        assert!(status.error.is_none());

        let result = manager.results().await.unwrap();
        assert_eq!(result.total_count, 3);
        assert_eq!(result.candidates.len(), 3);
        // Universe order, one entry per ticker.
        let names: Vec<&str> = result.candidates.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(names, tickers.to_vec());
        assert_eq!(
            result.passed_count,
            result.candidates.iter().filter(|c| c.passed).count()
        );

        // Lifecycle timestamps are recorded.
        let state = manager.state.read().await;
        let started = state.started_at.unwrap();
        let finished = state.finished_at.unwrap();
        assert!(finished >= started);
    }

    #[tokio::test]
    async fn test_fetch_failures_skip_but_keep_totals() {
        let tickers = ["AAPL", "DOWN", "NVDA", "ALSO_DOWN"];
        let provider = StubProvider::new().failing_for(&["DOWN", "ALSO_DOWN"]);
        let manager = make_manager(provider, &tickers, Duration::from_secs(60));

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        let status = wait_terminal(&manager).await;
        assert_eq!(status.status, JobStatus::Completed);
        assert_eq!(status.progress, 4);

        let result = manager.results().await.unwrap();
        assert_eq!(result.total_count, 4);
        assert_eq!(result.skipped_count, 2);
        assert_eq!(result.candidates.len(), 2);
        assert!(result.candidates.iter().all(|c| c.ticker != "DOWN"));
    }

    #[tokio::test]
    async fn test_start_while_running_rejected_and_state_untouched() {
        let tickers = ["AAPL", "MSFT", "NVDA", "AMD"];
        let provider = StubProvider::new().with_delay(Duration::from_millis(30));
        let manager = make_manager(provider, &tickers, Duration::from_secs(60));

        let first = manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();

        let err = manager
            .start_scan("iv_crush", ScanType::Quick)
            .await
            .unwrap_err();
        assert_eq!(err, ScanError::AlreadyRunning);

        // The running job still belongs to the first request.
        let state = manager.state.read().await;
        assert_eq!(state.id, Some(first));
        assert_eq!(state.strategy_key.as_deref(), Some("trend_following"));
        assert!(state.status.is_running());
        drop(state);

        wait_terminal(&manager).await;
    }

    #[tokio::test]
    async fn test_unknown_strategy_rejected() {
        let manager = make_manager(StubProvider::new(), &["AAPL"], Duration::from_secs(60));
        let err = manager
            .start_scan("momentum_chaser", ScanType::Quick)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ScanError::UnknownStrategy("momentum_chaser".to_string())
        );
        // No job was created.
        assert_eq!(manager.status().await.status, JobStatus::Idle);
    }

    #[tokio::test]
    async fn test_timeout_preserves_partial_results() {
        let tickers = ["AAPL", "MSFT", "NVDA", "AMD", "META"];
        let provider = StubProvider::new().with_delay(Duration::from_millis(25));
        // Budget covers roughly one fetch; the pre-ticker check trips
        // on the second iteration.
        let manager = make_manager(provider, &tickers, Duration::from_millis(10));

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        let status = wait_terminal(&manager).await;

        assert_eq!(status.status, JobStatus::TimedOut);
        assert!(status.progress < status.total);
        assert!(status.has_results, "partial results should be kept");

        let result = manager.results().await.unwrap();
        assert!(result.candidates.len() < tickers.len());
        assert_eq!(result.total_count, tickers.len());
    }

    #[tokio::test]
    async fn test_zero_budget_timeout_records_error() {
        let tickers = ["AAPL", "MSFT"];
        let manager = make_manager(StubProvider::new(), &tickers, Duration::ZERO);

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        let status = wait_terminal(&manager).await;

        assert_eq!(status.status, JobStatus::TimedOut);
        assert_eq!(status.progress, 0);
        assert!(!status.has_results);
        assert!(status.error.unwrap().contains("timed out"));
        assert_eq!(manager.results().await.unwrap_err(), ScanError::NoResults);
    }

    #[tokio::test]
    async fn test_total_feed_outage_fails_job() {
        let tickers = ["AAPL", "MSFT"];
        let provider = StubProvider::new().failing_for(&["AAPL", "MSFT"]);
        let manager = make_manager(provider, &tickers, Duration::from_secs(60));

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        let status = wait_terminal(&manager).await;

        assert_eq!(status.status, JobStatus::Failed);
        assert!(status.error.unwrap().contains("unavailable for all 2"));
        assert_eq!(manager.results().await.unwrap_err(), ScanError::NoResults);
    }

    #[tokio::test]
    async fn test_results_before_any_scan_is_no_results() {
        let manager = make_manager(StubProvider::new(), &["AAPL"], Duration::from_secs(60));
        assert_eq!(manager.results().await.unwrap_err(), ScanError::NoResults);
        let status = manager.status().await;
        assert_eq!(status.status, JobStatus::Idle);
        assert!(!status.has_results);
    }

    #[tokio::test]
    async fn test_cache_hit_short_circuits_second_scan() {
        let tickers = ["AAPL", "MSFT"];
        let provider = StubProvider::new();
        let manager = make_manager(provider, &tickers, Duration::from_secs(60));

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        wait_terminal(&manager).await;
        let first = manager.results().await.unwrap();

        // Second request is served from cache: Completed immediately,
        // no Running phase to poll through.
        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        let status = manager.status().await;
        assert_eq!(status.status, JobStatus::Completed);
        assert!(status.has_results);

        let second = manager.results().await.unwrap();
        assert_eq!(second.timestamp, first.timestamp);
    }

    #[tokio::test]
    async fn test_different_scan_types_cached_separately() {
        let tickers = ["AAPL"];
        let manager = make_manager(StubProvider::new(), &tickers, Duration::from_secs(60));

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        wait_terminal(&manager).await;

        // Full universe has no cached entry, so this spawns a real run.
        manager
            .start_scan("trend_following", ScanType::Full)
            .await
            .unwrap();
        let status = wait_terminal(&manager).await;
        assert_eq!(status.status, JobStatus::Completed);

        let result = manager.results().await.unwrap();
        assert_eq!(result.scan_type, ScanType::Full);
    }

    #[tokio::test]
    async fn test_terminal_state_visible_until_next_start() {
        let manager = make_manager(
            StubProvider::new().failing_for(&["AAPL"]),
            &["AAPL"],
            Duration::from_secs(60),
        );

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();
        wait_terminal(&manager).await;

        // Failed state persists across repeated polls.
        for _ in 0..3 {
            assert_eq!(manager.status().await.status, JobStatus::Failed);
        }
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_during_scan() {
        let tickers = ["AAPL", "MSFT", "NVDA", "AMD", "META", "GOOGL"];
        let provider = StubProvider::new().with_delay(Duration::from_millis(10));
        let manager = make_manager(provider, &tickers, Duration::from_secs(60));

        manager
            .start_scan("trend_following", ScanType::Quick)
            .await
            .unwrap();

        let mut last = 0usize;
        loop {
            let status = manager.status().await;
            assert!(status.progress >= last, "progress went backwards");
            last = status.progress;
            if !status.running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(3)).await;
        }
        assert_eq!(last, tickers.len());
    }
}
