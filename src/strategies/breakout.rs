//! Breakout momentum.
//!
//! A stock pushing to new highs with volume draws in short covering,
//! breakout traders, and attention — continuation over the next month
//! is better than coin-flip. Call debit spreads capture the follow-
//! through without paying full premium. The screen rejects setups that
//! are already over-extended or carry IV-crush risk.

use crate::types::{
    Direction, EdgeType, ExitRules, MarketSnapshot, OptionStructure, RiskLevel, Signal,
    StrategyDescriptor, TradeType,
};

use super::Strategy;

// Filter thresholds
const MIN_RETURN_5D: f64 = 3.0;
/// Strong 20-day move stands in for a resistance break.
const MIN_RETURN_20D: f64 = 5.0;
const MAX_ABOVE_MA20_PCT: f64 = 10.0;
const RSI_MAX: f64 = 80.0;
const IV_RANK_MIN: f64 = 20.0;
const IV_RANK_MAX: f64 = 60.0;
const MIN_DAYS_TO_EARNINGS: i64 = 7;

const PASS_SCORE: f64 = 55.0;

pub struct Breakout {
    descriptor: StrategyDescriptor,
}

impl Breakout {
    pub fn new() -> Self {
        Self {
            descriptor: StrategyDescriptor {
                key: "breakout".into(),
                name: "Breakout Momentum".into(),
                description: "Buy calls on stocks breaking to new highs with volume".into(),
                edge_type: EdgeType::Trend,
                risk_level: RiskLevel::High,
                expected_win_rate: 0.55,
                typical_hold_days: 14,
            },
        }
    }
}

impl Default for Breakout {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for Breakout {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    fn check_entry(&self, _ticker: &str, snapshot: &MarketSnapshot) -> Signal {
        let mut reasons = Vec::new();

        let (Some(ma20), Some(ma50)) = (snapshot.ma20, snapshot.ma50) else {
            return Signal::fail(vec!["Missing price data".into()], 0.0);
        };
        let price = snapshot.price;
        let return_5d = snapshot.return_5d.unwrap_or(0.0);
        let return_20d = snapshot.return_20d.unwrap_or(0.0);
        let rsi = snapshot.rsi.unwrap_or(50.0);

        if !(price > ma20 && ma20 > ma50) {
            reasons.push(format!(
                "Not in uptrend: ${price:.2}, MA20 ${ma20:.2}, MA50 ${ma50:.2}"
            ));
            return Signal::fail(reasons, 0.0);
        }
        reasons.push(format!("Uptrend confirmed: ${price:.2} > MA20 > MA50"));

        if return_5d < MIN_RETURN_5D {
            reasons.push(format!(
                "5D return +{return_5d:.1}% < {MIN_RETURN_5D:.0}% (weak momentum)"
            ));
            return Signal::fail(reasons, 20.0);
        }
        reasons.push(format!("Strong 5D momentum: +{return_5d:.1}%"));

        if return_20d < MIN_RETURN_20D {
            reasons.push(format!(
                "20D return +{return_20d:.1}% - not a strong breakout"
            ));
            return Signal::fail(reasons, 30.0);
        }
        reasons.push(format!(
            "20D momentum: +{return_20d:.1}% (breakout territory)"
        ));

        let pct_above_ma20 = (price - ma20) / ma20 * 100.0;
        if pct_above_ma20 > MAX_ABOVE_MA20_PCT {
            reasons.push(format!(
                "Extended {pct_above_ma20:.1}% above MA20 (> {MAX_ABOVE_MA20_PCT:.0}%)"
            ));
            return Signal::fail_with_direction(Direction::Bullish, reasons, 35.0);
        }

        if rsi > RSI_MAX {
            reasons.push(format!("RSI {rsi:.0} > {RSI_MAX:.0} (overbought)"));
            return Signal::fail_with_direction(Direction::Bullish, reasons, 40.0);
        }
        reasons.push(format!("RSI {rsi:.0} (not overbought)"));

        if let Some(iv_rank) = snapshot.iv_rank {
            if iv_rank < IV_RANK_MIN {
                // Cheap options are tolerable here; the move may just be
                // starting, so note it and continue.
                reasons.push(format!(
                    "IV Rank {iv_rank:.0} low - options cheap but move may be done"
                ));
            } else if iv_rank > IV_RANK_MAX {
                reasons.push(format!("IV Rank {iv_rank:.0} high - IV crush risk"));
                return Signal::fail_with_direction(Direction::Bullish, reasons, 45.0);
            } else {
                reasons.push(format!("IV Rank {iv_rank:.0} (acceptable)"));
            }
        }

        if let Some(days) = snapshot.days_to_earnings {
            if (0..MIN_DAYS_TO_EARNINGS).contains(&days) {
                reasons.push(format!(
                    "Earnings in {days} days - breakout may be earnings anticipation"
                ));
                return Signal::fail_with_direction(Direction::Bullish, reasons, 40.0);
            }
        }

        let mut strength = 55.0;
        strength += (return_5d - MIN_RETURN_5D).min(10.0) * 2.0;
        strength += (return_20d - MIN_RETURN_20D).min(15.0);
        if let Some(iv_rank) = snapshot.iv_rank {
            if (30.0..=50.0).contains(&iv_rank) {
                strength += 10.0;
            }
        }
        let strength = strength.min(100.0);

        Signal {
            passed: strength >= PASS_SCORE,
            direction: Some(Direction::Bullish),
            trade_type: Some(TradeType::CallDebit),
            signal_strength: strength,
            reasons,
        }
    }

    fn option_structure(&self) -> OptionStructure {
        OptionStructure {
            dte_min: 21,
            dte_max: 45,
            long_delta: 0.50,
            short_delta: Some(0.25),
        }
    }

    fn exit_rules(&self) -> ExitRules {
        ExitRules {
            take_profit_pct: 0.75,
            // Breakouts should work fast; the stop is tighter than the
            // other debit screens.
            stop_loss_pct: 0.40,
            time_stop_dte: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn breakout_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            price: 108.0,
            return_5d: Some(5.0),
            return_20d: Some(9.0),
            iv_rank: Some(40.0),
            rsi: Some(68.0),
            ma20: Some(102.0),
            ma50: Some(97.0),
            realized_vol: Some(28.0),
            days_to_earnings: None,
        }
    }

    #[test]
    fn test_confirmed_breakout_passes() {
        let strategy = Breakout::new();
        let signal = strategy.check_entry("AVGO", &breakout_snapshot());
        assert!(signal.passed);
        assert_eq!(signal.direction, Some(Direction::Bullish));
        assert_eq!(signal.trade_type, Some(TradeType::CallDebit));
        assert!(signal
            .reasons
            .iter()
            .any(|r| r.contains("breakout territory")));
    }

    #[test]
    fn test_downtrend_fails_immediately() {
        let strategy = Breakout::new();
        let snapshot = MarketSnapshot {
            price: 95.0,
            ma20: Some(100.0),
            ..breakout_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(!signal.passed);
        assert!(signal.reasons[0].contains("Not in uptrend"));
    }

    #[test]
    fn test_weak_5d_momentum_fails() {
        let strategy = Breakout::new();
        let snapshot = MarketSnapshot {
            return_5d: Some(1.0),
            ..breakout_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(!signal.passed);
        assert!(signal.reasons.iter().any(|r| r.contains("weak momentum")));
    }

    #[test]
    fn test_weak_20d_momentum_fails() {
        let strategy = Breakout::new();
        let snapshot = MarketSnapshot {
            return_20d: Some(3.0),
            ..breakout_snapshot()
        };
        assert!(!strategy.check_entry("X", &snapshot).passed);
    }

    #[test]
    fn test_overextended_above_ma20_fails() {
        let strategy = Breakout::new();
        let snapshot = MarketSnapshot {
            price: 115.0,
            ma20: Some(100.0),
            ma50: Some(97.0),
            ..breakout_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(!signal.passed);
        assert_eq!(signal.direction, Some(Direction::Bullish));
        assert!(signal.reasons.iter().any(|r| r.contains("Extended")));
    }

    #[test]
    fn test_overbought_rsi_fails() {
        let strategy = Breakout::new();
        let snapshot = MarketSnapshot {
            rsi: Some(85.0),
            ..breakout_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(!signal.passed);
        assert!(signal.reasons.iter().any(|r| r.contains("overbought")));
    }

    #[test]
    fn test_low_iv_noted_but_tolerated() {
        let strategy = Breakout::new();
        let snapshot = MarketSnapshot {
            iv_rank: Some(15.0),
            ..breakout_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(signal.passed);
        assert!(signal.reasons.iter().any(|r| r.contains("options cheap")));
    }

    #[test]
    fn test_high_iv_fails() {
        let strategy = Breakout::new();
        let snapshot = MarketSnapshot {
            iv_rank: Some(70.0),
            ..breakout_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(!signal.passed);
        assert!(signal.reasons.iter().any(|r| r.contains("IV crush risk")));
    }

    #[test]
    fn test_imminent_earnings_blocks() {
        let strategy = Breakout::new();
        let snapshot = MarketSnapshot {
            days_to_earnings: Some(2),
            ..breakout_snapshot()
        };
        assert!(!strategy.check_entry("X", &snapshot).passed);
    }

    #[test]
    fn test_stronger_breakout_scores_higher() {
        let strategy = Breakout::new();
        let base = strategy.check_entry("X", &breakout_snapshot());
        let strong = strategy.check_entry(
            "X",
            &MarketSnapshot {
                return_5d: Some(8.0),
                return_20d: Some(15.0),
                ..breakout_snapshot()
            },
        );
        assert!(strong.signal_strength > base.signal_strength);
        assert!(strong.signal_strength <= 100.0);
    }
}
