//! Strategy evaluation — one ticker, one strategy, one candidate.
//!
//! Fetches the market snapshot, runs the strategy's entry checks, and
//! assembles the immutable `Candidate`, attaching a concrete spread
//! structure when the ticker passes. Fetch failures bubble up as
//! `DataError` for the job loop to skip over.

use std::sync::Arc;
use tracing::{debug, info};

use crate::data::SnapshotProvider;
use crate::spreads::TradeStructure;
use crate::strategies::Strategy;
use crate::types::{Candidate, DataError};

/// Evaluates tickers against strategies using snapshots from the
/// configured provider.
pub struct StrategyEngine {
    provider: Arc<dyn SnapshotProvider>,
}

impl StrategyEngine {
    pub fn new(provider: Arc<dyn SnapshotProvider>) -> Self {
        Self { provider }
    }

    /// Evaluate one ticker against one strategy.
    ///
    /// The only fallible step is the snapshot fetch; the entry checks
    /// themselves always produce a candidate, passing or not.
    pub async fn evaluate(
        &self,
        ticker: &str,
        strategy: &dyn Strategy,
    ) -> Result<Candidate, DataError> {
        let snapshot = self.provider.fetch_snapshot(ticker).await?;

        let signal = strategy.check_entry(ticker, &snapshot);
        let strength = signal.signal_strength.clamp(0.0, 100.0);

        // Spread construction only makes sense for a passing signal
        // with a concrete trade type.
        let structure = if signal.passed {
            signal
                .trade_type
                .map(|t| TradeStructure::for_trade(t, snapshot.price))
        } else {
            None
        };

        let candidate = Candidate {
            ticker: ticker.to_string(),
            passed: signal.passed,
            direction: signal.direction,
            trade_type: signal.trade_type,
            signal_strength: strength,
            price: snapshot.price,
            return_5d: snapshot.return_5d,
            return_20d: snapshot.return_20d,
            iv_rank: snapshot.iv_rank,
            rsi: snapshot.rsi,
            reasons: signal.reasons,
            structure,
        };

        if candidate.passed {
            info!(
                ticker,
                strategy = %strategy.descriptor().key,
                direction = ?candidate.direction,
                trade_type = ?candidate.trade_type,
                strength = format!("{:.0}%", candidate.signal_strength),
                "Candidate passed"
            );
        } else {
            debug!(
                ticker,
                strategy = %strategy.descriptor().key,
                strength = format!("{:.0}%", candidate.signal_strength),
                reason = candidate.reasons.first().map(String::as_str).unwrap_or(""),
                "Candidate failed filters"
            );
        }

        Ok(candidate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
