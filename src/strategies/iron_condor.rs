//! Range-bound iron condors.
//!
//! Most stocks, most of the time, go nowhere. Selling a call spread
//! and a put spread around a range-bound price collects premium from
//! both sides while theta works on both. The screen demands a flat
//! tape on every axis it can see — small 5d/20d moves, converged
//! moving averages, mid-band RSI, moderate IV — and keeps far away
//! from earnings, which break ranges.

use crate::types::{
    Direction, EdgeType, ExitRules, MarketSnapshot, OptionStructure, RiskLevel, Signal,
    StrategyDescriptor, TradeType,
};

use super::Strategy;

// Filter thresholds
const MAX_RETURN_20D: f64 = 5.0;
const MAX_RETURN_5D: f64 = 3.0;
const RSI_MIN: f64 = 35.0;
const RSI_MAX: f64 = 65.0;
const IV_RANK_MIN: f64 = 25.0;
const IV_RANK_MAX: f64 = 55.0;
/// MA20 and MA50 must sit within this percent of each other.
const MAX_MA_SPREAD_PCT: f64 = 3.0;
const MIN_DAYS_TO_EARNINGS: i64 = 25;

const PASS_SCORE: f64 = 60.0;

pub struct IronCondor {
    descriptor: StrategyDescriptor,
}

impl IronCondor {
    pub fn new() -> Self {
        Self {
            descriptor: StrategyDescriptor {
                key: "iron_condor".into(),
                name: "Iron Condor Range".into(),
                description: "Sell iron condors on range-bound stocks to collect premium".into(),
                edge_type: EdgeType::Volatility,
                risk_level: RiskLevel::Medium,
                expected_win_rate: 0.72,
                typical_hold_days: 21,
            },
        }
    }
}

impl Default for IronCondor {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for IronCondor {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    fn check_entry(&self, _ticker: &str, snapshot: &MarketSnapshot) -> Signal {
        let mut reasons = Vec::new();

        let (Some(ma20), Some(ma50)) = (snapshot.ma20, snapshot.ma50) else {
            return Signal::fail(vec!["Missing price data".into()], 0.0);
        };
        let return_5d = snapshot.return_5d.unwrap_or(0.0);
        let return_20d = snapshot.return_20d.unwrap_or(0.0);
        let rsi = snapshot.rsi.unwrap_or(50.0);

        // The range-bound check is the whole premise.
        if return_20d.abs() > MAX_RETURN_20D {
            reasons.push(format!(
                "20D return {return_20d:+.1}% too large (max ±{MAX_RETURN_20D:.0}%)"
            ));
            return Signal::fail(reasons, 0.0);
        }
        if return_5d.abs() > MAX_RETURN_5D {
            reasons.push(format!(
                "5D return {return_5d:+.1}% too large (max ±{MAX_RETURN_5D:.0}%)"
            ));
            return Signal::fail(reasons, 10.0);
        }
        reasons.push(format!(
            "Range-bound: 5D {return_5d:+.1}%, 20D {return_20d:+.1}%"
        ));

        // Converged MAs mean ranging, diverging MAs mean trending.
        let ma_spread_pct = (ma20 - ma50).abs() / ma50 * 100.0;
        if ma_spread_pct > MAX_MA_SPREAD_PCT {
            reasons.push(format!(
                "MAs diverging {ma_spread_pct:.1}% (trending, not ranging)"
            ));
            return Signal::fail(reasons, 20.0);
        }
        reasons.push(format!("MAs flat: spread {ma_spread_pct:.1}%"));

        if !(RSI_MIN..=RSI_MAX).contains(&rsi) {
            reasons.push(format!(
                "RSI {rsi:.0} outside range ({RSI_MIN:.0}-{RSI_MAX:.0})"
            ));
            return Signal::fail(reasons, 25.0);
        }
        reasons.push(format!("RSI {rsi:.0} (neutral)"));

        if let Some(iv_rank) = snapshot.iv_rank {
            if iv_rank < IV_RANK_MIN {
                reasons.push(format!(
                    "IV Rank {iv_rank:.0} too low (not enough premium)"
                ));
                return Signal::fail(reasons, 30.0);
            }
            if iv_rank > IV_RANK_MAX {
                reasons.push(format!(
                    "IV Rank {iv_rank:.0} too high (expecting move)"
                ));
                return Signal::fail(reasons, 30.0);
            }
            reasons.push(format!("IV Rank {iv_rank:.0} (good for premium)"));
        }

        // Never hold a condor through earnings.
        if let Some(days) = snapshot.days_to_earnings {
            if (0..MIN_DAYS_TO_EARNINGS).contains(&days) {
                reasons.push(format!(
                    "Earnings in {days} days - NEVER hold IC through earnings"
                ));
                return Signal::fail(reasons, 0.0);
            }
            if days >= MIN_DAYS_TO_EARNINGS {
                reasons.push(format!("Earnings in {days} days (safe)"));
            }
        }

        let mut strength: f64 = 60.0;
        if return_20d.abs() < 2.0 {
            strength += 15.0;
        }
        if (40.0..=60.0).contains(&rsi) {
            strength += 10.0;
        }
        if let Some(iv_rank) = snapshot.iv_rank {
            if (35.0..=45.0).contains(&iv_rank) {
                strength += 10.0;
            }
        }
        let strength = strength.min(100.0);

        Signal {
            passed: strength >= PASS_SCORE,
            direction: Some(Direction::Neutral),
            trade_type: Some(TradeType::IronCondor),
            signal_strength: strength,
            reasons,
        }
    }

    fn option_structure(&self) -> OptionStructure {
        OptionStructure {
            dte_min: 30,
            dte_max: 45,
            long_delta: 0.10,
            short_delta: Some(0.20),
        }
    }

    fn exit_rules(&self) -> ExitRules {
        ExitRules {
            take_profit_pct: 0.50,
            stop_loss_pct: 1.00,
            // Close before the gamma window.
            time_stop_dte: 14,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
