//! Shared types for the EDGESCAN scanner.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that data, strategy, and engine
//! modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::spreads::TradeStructure;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Directional bias of a trade candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "BULLISH"),
            Direction::Bearish => write!(f, "BEARISH"),
            Direction::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Option structure recommended for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    CallLong,
    PutLong,
    CallDebit,
    PutDebit,
    CallCredit,
    PutCredit,
    IronCondor,
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::CallLong => write!(f, "CALL_LONG"),
            TradeType::PutLong => write!(f, "PUT_LONG"),
            TradeType::CallDebit => write!(f, "CALL_DEBIT"),
            TradeType::PutDebit => write!(f, "PUT_DEBIT"),
            TradeType::CallCredit => write!(f, "CALL_CREDIT"),
            TradeType::PutCredit => write!(f, "PUT_CREDIT"),
            TradeType::IronCondor => write!(f, "IRON_CONDOR"),
        }
    }
}

/// The kind of market inefficiency a strategy exploits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Trend,
    Volatility,
    MeanReversion,
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeType::Trend => write!(f, "trend"),
            EdgeType::Volatility => write!(f, "volatility"),
            EdgeType::MeanReversion => write!(f, "mean_reversion"),
        }
    }
}

/// Qualitative risk bucket for a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Which ticker universe a scan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Quick,
    Full,
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanType::Quick => write!(f, "quick"),
            ScanType::Full => write!(f, "full"),
        }
    }
}

impl std::str::FromStr for ScanType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(ScanType::Quick),
            "full" => Ok(ScanType::Full),
            _ => Err(anyhow::anyhow!("Unknown scan type: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy metadata and contract types
// ---------------------------------------------------------------------------

/// Immutable metadata describing a registered strategy.
/// Created once at registry initialization, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    pub key: String,
    pub name: String,
    pub description: String,
    pub edge_type: EdgeType,
    pub risk_level: RiskLevel,
    /// Historical win-rate expectation in [0, 1].
    pub expected_win_rate: f64,
    pub typical_hold_days: u32,
}

impl fmt::Display for StrategyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({}, {} risk, ~{:.0}% win rate)",
            self.name,
            self.key,
            self.edge_type,
            self.risk_level,
            self.expected_win_rate * 100.0,
        )
    }
}

/// Option structure parameters a strategy recommends.
/// DTE window and delta targets are per-strategy; strike offsets are
/// fixed constants of the spread builder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptionStructure {
    pub dte_min: u32,
    pub dte_max: u32,
    /// Target delta for the long leg.
    pub long_delta: f64,
    /// Target delta for the short leg (spreads only).
    pub short_delta: Option<f64>,
}

/// Exit rules a strategy recommends for positions it opens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExitRules {
    /// Close at this fraction of max gain.
    pub take_profit_pct: f64,
    /// Cut at this fraction of entry cost (or credit received).
    pub stop_loss_pct: f64,
    /// Close when fewer than this many days to expiration remain.
    pub time_stop_dte: u32,
}

/// Outcome of running a strategy's entry checks against one snapshot.
#[derive(Debug, Clone)]
pub struct Signal {
    pub passed: bool,
    pub direction: Option<Direction>,
    pub trade_type: Option<TradeType>,
    /// Aggregate score in [0, 100].
    pub signal_strength: f64,
    /// Human-readable reasons, in check order.
    pub reasons: Vec<String>,
}

impl Signal {
    /// A failing signal with the given reasons and partial score.
    pub fn fail(reasons: Vec<String>, strength: f64) -> Self {
        Signal {
            passed: false,
            direction: None,
            trade_type: None,
            signal_strength: strength,
            reasons,
        }
    }

    /// A failing signal that still has a directional read.
    pub fn fail_with_direction(
        direction: Direction,
        reasons: Vec<String>,
        strength: f64,
    ) -> Self {
        Signal {
            passed: false,
            direction: Some(direction),
            trade_type: None,
            signal_strength: strength,
            reasons,
        }
    }
}

// ---------------------------------------------------------------------------
// Market snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of one ticker, as produced by the data provider.
///
/// Optional fields are `None` when the feed lacks enough history to
/// compute them; strategies decide how to treat missing inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Last traded price.
    pub price: f64,
    /// 5-trading-day return, percent.
    pub return_5d: Option<f64>,
    /// 20-trading-day return, percent.
    pub return_20d: Option<f64>,
    /// Current 20d volatility ranked against its 1-year range, 0–100.
    pub iv_rank: Option<f64>,
    /// 14-period RSI.
    pub rsi: Option<f64>,
    /// 20-day simple moving average.
    pub ma20: Option<f64>,
    /// 50-day simple moving average.
    pub ma50: Option<f64>,
    /// Annualised 20-day realized volatility, percent.
    pub realized_vol: Option<f64>,
    /// Days until the next earnings report, when the feed knows it.
    /// Negative values mean the report was that many days ago.
    pub days_to_earnings: Option<i64>,
}

impl MarketSnapshot {
    /// Helper to build a test snapshot with sensible defaults.
    #[cfg(test)]
    pub fn sample() -> Self {
        MarketSnapshot {
            price: 100.0,
            return_5d: Some(1.2),
            return_20d: Some(4.5),
            iv_rank: Some(35.0),
            rsi: Some(55.0),
            ma20: Some(97.0),
            ma50: Some(94.0),
            realized_vol: Some(22.0),
            days_to_earnings: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate & scan result
// ---------------------------------------------------------------------------

/// One ticker's outcome of strategy evaluation: pass/fail plus the
/// recommended structure. Created once per ticker per scan; immutable
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub ticker: String,
    pub passed: bool,
    pub direction: Option<Direction>,
    pub trade_type: Option<TradeType>,
    /// Aggregate signal score in [0, 100].
    pub signal_strength: f64,
    pub price: f64,
    pub return_5d: Option<f64>,
    pub return_20d: Option<f64>,
    pub iv_rank: Option<f64>,
    pub rsi: Option<f64>,
    /// Human-readable filter outcomes, in check order.
    pub reasons: Vec<String>,
    /// Concrete spread structure; populated only for passing candidates.
    pub structure: Option<TradeStructure>,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed { "PASS" } else { "fail" };
        write!(
            f,
            "{} [{verdict}] {} {} @ ${:.2} ({:.0}%)",
            self.ticker,
            self.direction.map(|d| d.to_string()).unwrap_or_default(),
            self.trade_type.map(|t| t.to_string()).unwrap_or_default(),
            self.price,
            self.signal_strength,
        )
    }
}

/// Aggregated output of one completed (or timed-out) scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub strategy: StrategyDescriptor,
    pub scan_type: ScanType,
    /// Candidates in ticker-universe order (not re-sorted by score;
    /// consumers sort if needed).
    pub candidates: Vec<Candidate>,
    pub passed_count: usize,
    /// Universe size for the scan type, regardless of fetch failures.
    pub total_count: usize,
    /// Tickers skipped because their data fetch failed.
    pub skipped_count: usize,
    pub structure: OptionStructure,
    pub exits: ExitRules,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Job-level and query-time errors from the scan orchestrator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// A scan is already in flight; the existing job is untouched.
    #[error("a scan is already running")]
    AlreadyRunning,

    /// The requested strategy key is not registered.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// No completed result is cached for the most recent job.
    #[error("no scan results available")]
    NoResults,
}

/// Per-ticker data-fetch failure. Never fatal to a scan — the ticker is
/// skipped and the loop continues.
#[derive(Debug, Error, Clone)]
pub enum DataError {
    #[error("data unavailable for {ticker}: {reason}")]
    Unavailable { ticker: String, reason: String },
}

impl DataError {
    pub fn unavailable(ticker: &str, reason: impl Into<String>) -> Self {
        DataError::Unavailable {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
