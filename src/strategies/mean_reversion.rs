//! Mean-reversion with cheap OTM options.
//!
//! Extreme short-term moves (RSI past 25/75 with a sharp 5-day move)
//! tend to snap back toward the mean. Cheap OTM options in the
//! reversal direction capture that asymmetrically: losers cost the
//! premium, winners multiply. Lower win rate than the other screens,
//! balanced by payoff size.

use crate::types::{
    Direction, EdgeType, ExitRules, MarketSnapshot, OptionStructure, RiskLevel, Signal,
    StrategyDescriptor, TradeType,
};

use super::Strategy;

// Filter thresholds
const RSI_OVERSOLD: f64 = 25.0;
const RSI_OVERBOUGHT: f64 = 75.0;
const MIN_RETURN_5D: f64 = 4.0;
/// Very extreme RSI relaxes the 5-day-move requirement.
const EXTREME_RSI_RELAX: f64 = 0.75;
const MAX_RETURN_20D: f64 = 15.0;
const IV_RANK_MAX: f64 = 50.0;
const MIN_DAYS_TO_EARNINGS: i64 = 7;

const PASS_SCORE: f64 = 50.0;

pub struct MeanReversion {
    descriptor: StrategyDescriptor,
}

impl MeanReversion {
    pub fn new() -> Self {
        Self {
            descriptor: StrategyDescriptor {
                key: "mean_reversion".into(),
                name: "Mean Reversion OTM".into(),
                description: "Buy cheap OTM options betting on snap-back from extreme moves"
                    .into(),
                edge_type: EdgeType::MeanReversion,
                risk_level: RiskLevel::High,
                expected_win_rate: 0.45,
                typical_hold_days: 7,
            },
        }
    }
}

impl Default for MeanReversion {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for MeanReversion {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    fn check_entry(&self, _ticker: &str, snapshot: &MarketSnapshot) -> Signal {
        let mut reasons = Vec::new();

        let Some(rsi) = snapshot.rsi else {
            return Signal::fail(vec!["RSI unavailable".into()], 0.0);
        };

        let return_5d = snapshot.return_5d;
        let extreme_rsi = !(20.0..=80.0).contains(&rsi);
        let threshold = if extreme_rsi {
            MIN_RETURN_5D * EXTREME_RSI_RELAX
        } else {
            MIN_RETURN_5D
        };

        // RSI extreme picks the direction; the 5-day move confirms it.
        let direction;
        if rsi < RSI_OVERSOLD {
            direction = Direction::Bullish;
            reasons.push(format!(
                "RSI {rsi:.0} OVERSOLD (< {RSI_OVERSOLD:.0}) - reversal setup"
            ));
            match return_5d {
                Some(r) if r <= -threshold => {
                    reasons.push(format!("5D return: {r:.1}% (sharp drop)"));
                }
                Some(r) => {
                    reasons.push(format!(
                        "5D return {r:.1}% not extreme enough (need <= -{threshold:.1}%)"
                    ));
                    return Signal::fail(reasons, 20.0);
                }
                None => {
                    reasons.push("5D return unavailable".into());
                    return Signal::fail(reasons, 20.0);
                }
            }
        } else if rsi > RSI_OVERBOUGHT {
            direction = Direction::Bearish;
            reasons.push(format!(
                "RSI {rsi:.0} OVERBOUGHT (> {RSI_OVERBOUGHT:.0}) - reversal setup"
            ));
            match return_5d {
                Some(r) if r >= threshold => {
                    reasons.push(format!("5D return: +{r:.1}% (sharp rally)"));
                }
                Some(r) => {
                    reasons.push(format!(
                        "5D return {r:.1}% not extreme enough (need >= {threshold:.1}%)"
                    ));
                    return Signal::fail(reasons, 20.0);
                }
                None => {
                    reasons.push("5D return unavailable".into());
                    return Signal::fail(reasons, 20.0);
                }
            }
        } else {
            reasons.push(format!(
                "RSI {rsi:.0} not extreme (need <{RSI_OVERSOLD:.0} or >{RSI_OVERBOUGHT:.0})"
            ));
            return Signal::fail(reasons, 0.0);
        }

        // A huge 20-day move is a trend to respect, not a reversal.
        if let Some(return_20d) = snapshot.return_20d {
            if return_20d.abs() > MAX_RETURN_20D {
                reasons.push(format!(
                    "20D return {return_20d:.1}% too extreme - may be trend, not reversal"
                ));
                return Signal::fail_with_direction(direction, reasons, 30.0);
            }
        }

        if let Some(iv_rank) = snapshot.iv_rank {
            if iv_rank > IV_RANK_MAX {
                reasons.push(format!(
                    "IV Rank {iv_rank:.0} > {IV_RANK_MAX:.0} (options expensive)"
                ));
                return Signal::fail_with_direction(direction, reasons, 40.0);
            }
            reasons.push(format!(
                "IV Rank: {iv_rank:.0} (options reasonably priced)"
            ));
        }

        if let Some(days) = snapshot.days_to_earnings {
            if (0..MIN_DAYS_TO_EARNINGS).contains(&days) {
                reasons.push(format!("Earnings in {days} days - reversal may not happen"));
                return Signal::fail_with_direction(direction, reasons, 35.0);
            }
        }

        let mut strength: f64 = 50.0;
        if extreme_rsi {
            strength += 20.0;
        }
        if return_5d.map(|r| r.abs() > 8.0).unwrap_or(false) {
            strength += 15.0;
        }
        if snapshot.iv_rank.map(|iv| iv < 30.0).unwrap_or(false) {
            strength += 10.0;
        }
        let strength = strength.min(100.0);

        Signal {
            passed: strength >= PASS_SCORE,
            direction: Some(direction),
            trade_type: Some(match direction {
                Direction::Bullish => TradeType::CallLong,
                _ => TradeType::PutLong,
            }),
            signal_strength: strength,
            reasons,
        }
    }

    fn option_structure(&self) -> OptionStructure {
        OptionStructure {
            dte_min: 14,
            dte_max: 30,
            long_delta: 0.25,
            short_delta: None,
        }
    }

    fn exit_rules(&self) -> ExitRules {
        ExitRules {
            take_profit_pct: 1.00,
            stop_loss_pct: 0.50,
            time_stop_dte: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn oversold_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            price: 80.0,
            return_5d: Some(-6.0),
            return_20d: Some(-9.0),
            iv_rank: Some(35.0),
            rsi: Some(22.0),
            ma20: Some(88.0),
            ma50: Some(90.0),
            realized_vol: Some(30.0),
            days_to_earnings: None,
        }
    }

    #[test]
    fn test_oversold_with_sharp_drop_buys_calls() {
        let strategy = MeanReversion::new();
        let signal = strategy.check_entry("META", &oversold_snapshot());
        assert!(signal.passed);
        assert_eq!(signal.direction, Some(Direction::Bullish));
        assert_eq!(signal.trade_type, Some(TradeType::CallLong));
        assert!(signal.reasons.iter().any(|r| r.contains("OVERSOLD")));
    }

    #[test]
    fn test_overbought_with_sharp_rally_buys_puts() {
        let strategy = MeanReversion::new();
        let snapshot = MarketSnapshot {
            return_5d: Some(7.0),
            return_20d: Some(10.0),
            rsi: Some(79.0),
            ..oversold_snapshot()
        };
        let signal = strategy.check_entry("TSLA", &snapshot);
        assert!(signal.passed);
        assert_eq!(signal.direction, Some(Direction::Bearish));
        assert_eq!(signal.trade_type, Some(TradeType::PutLong));
    }

    #[test]
    fn test_neutral_rsi_fails() {
        let strategy = MeanReversion::new();
        let snapshot = MarketSnapshot {
            rsi: Some(50.0),
            ..oversold_snapshot()
        };
        let signal = strategy.check_entry("KO", &snapshot);
        assert!(!signal.passed);
        assert!((signal.signal_strength - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_missing_rsi_fails() {
        let strategy = MeanReversion::new();
        let snapshot = MarketSnapshot {
            rsi: None,
            ..oversold_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert_eq!(signal.reasons, vec!["RSI unavailable"]);
    }

    #[test]
    fn test_oversold_without_drop_fails() {
        let strategy = MeanReversion::new();
        let snapshot = MarketSnapshot {
            return_5d: Some(-1.0),
            ..oversold_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(!signal.passed);
        assert!(signal
            .reasons
            .iter()
            .any(|r| r.contains("not extreme enough")));
    }

    #[test]
    fn test_extreme_rsi_relaxes_move_requirement() {
        // −3.5% wouldn't pass the 4% bar, but RSI 15 lowers it to 3%.
        let strategy = MeanReversion::new();
        let snapshot = MarketSnapshot {
            rsi: Some(15.0),
            return_5d: Some(-3.5),
            ..oversold_snapshot()
        };
        assert!(strategy.check_entry("X", &snapshot).passed);
    }

    #[test]
    fn test_mega_trend_blocks_reversal() {
        let strategy = MeanReversion::new();
        let snapshot = MarketSnapshot {
            return_20d: Some(-20.0),
            ..oversold_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(!signal.passed);
        assert!(signal.reasons.iter().any(|r| r.contains("may be trend")));
    }

    #[test]
    fn test_expensive_options_block() {
        let strategy = MeanReversion::new();
        let snapshot = MarketSnapshot {
            iv_rank: Some(70.0),
            ..oversold_snapshot()
        };
        let signal = strategy.check_entry("X", &snapshot);
        assert!(!signal.passed);
        assert!(signal.reasons.iter().any(|r| r.contains("expensive")));
    }

    #[test]
    fn test_imminent_earnings_blocks() {
        let strategy = MeanReversion::new();
        let snapshot = MarketSnapshot {
            days_to_earnings: Some(3),
            ..oversold_snapshot()
        };
        assert!(!strategy.check_entry("X", &snapshot).passed);
    }

    #[test]
    fn test_extreme_setup_scores_higher() {
        let strategy = MeanReversion::new();
        let base = strategy.check_entry("X", &oversold_snapshot());
        let extreme = strategy.check_entry(
            "X",
            &MarketSnapshot {
                rsi: Some(15.0),
                return_5d: Some(-10.0),
                iv_rank: Some(25.0),
                ..oversold_snapshot()
            },
        );
        assert!(extreme.signal_strength > base.signal_strength);
        assert!(extreme.signal_strength <= 100.0);
    }
}
