//! Trend-following debit spreads.
//!
//! A stock in a confirmed trend (price > MA20 > MA50 with momentum, or
//! the inverse) tends to keep going over a 30–45 day window. Debit
//! spreads ride the continuation with defined risk and reduced IV
//! exposure. Avoided when IV rank sits outside a moderate band (cheap
//! options often mean the move is done; expensive ones risk IV crush).

use crate::types::{
    Direction, EdgeType, ExitRules, MarketSnapshot, OptionStructure, RiskLevel, Signal,
    StrategyDescriptor, TradeType,
};

use super::Strategy;

// Filter thresholds
const MIN_RETURN_20D: f64 = 3.0;
const IV_RANK_MIN: f64 = 15.0;
const IV_RANK_MAX: f64 = 55.0;
const RSI_BULL_MIN: f64 = 50.0;
const RSI_BULL_MAX: f64 = 75.0;
const RSI_BEAR_MIN: f64 = 25.0;
const RSI_BEAR_MAX: f64 = 50.0;
const MIN_DAYS_TO_EARNINGS: i64 = 10;

/// Aggregate score needed to pass; the base score for a confirmed
/// trend meets it, gate failures return early below it.
const PASS_SCORE: f64 = 60.0;

pub struct TrendFollowing {
    descriptor: StrategyDescriptor,
}

impl TrendFollowing {
    pub fn new() -> Self {
        Self {
            descriptor: StrategyDescriptor {
                key: "trend_following".into(),
                name: "Trend Following Debit Spread".into(),
                description: "Buy debit spreads in the direction of strong trends".into(),
                edge_type: EdgeType::Trend,
                risk_level: RiskLevel::Medium,
                expected_win_rate: 0.58,
                typical_hold_days: 21,
            },
        }
    }
}

impl Default for TrendFollowing {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for TrendFollowing {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    fn check_entry(&self, _ticker: &str, snapshot: &MarketSnapshot) -> Signal {
        let mut reasons = Vec::new();

        let (Some(ma20), Some(ma50)) = (snapshot.ma20, snapshot.ma50) else {
            return Signal::fail(vec!["Missing price data".into()], 0.0);
        };
        let price = snapshot.price;
        let return_20d = snapshot.return_20d.unwrap_or(0.0);
        let rsi = snapshot.rsi.unwrap_or(50.0);

        // Trend confirmation with RSI band check per direction.
        let direction;
        if price > ma20 && ma20 > ma50 && return_20d >= MIN_RETURN_20D {
            if (RSI_BULL_MIN..=RSI_BULL_MAX).contains(&rsi) {
                direction = Direction::Bullish;
                reasons.push(format!(
                    "Uptrend: ${price:.2} > MA20 ${ma20:.2} > MA50 ${ma50:.2}"
                ));
                reasons.push(format!("Momentum: +{return_20d:.1}% in 20 days"));
                reasons.push(format!("RSI: {rsi:.0} (bullish range)"));
            } else {
                reasons.push(format!(
                    "RSI {rsi:.0} outside bullish range ({RSI_BULL_MIN:.0}-{RSI_BULL_MAX:.0})"
                ));
                return Signal::fail(reasons, 0.0);
            }
        } else if price < ma20 && ma20 < ma50 && return_20d <= -MIN_RETURN_20D {
            if (RSI_BEAR_MIN..=RSI_BEAR_MAX).contains(&rsi) {
                direction = Direction::Bearish;
                reasons.push(format!(
                    "Downtrend: ${price:.2} < MA20 ${ma20:.2} < MA50 ${ma50:.2}"
                ));
                reasons.push(format!("Momentum: {return_20d:.1}% in 20 days"));
                reasons.push(format!("RSI: {rsi:.0} (bearish range)"));
            } else {
                reasons.push(format!(
                    "RSI {rsi:.0} outside bearish range ({RSI_BEAR_MIN:.0}-{RSI_BEAR_MAX:.0})"
                ));
                return Signal::fail(reasons, 0.0);
            }
        } else {
            reasons.push(format!(
                "No clear trend: Price ${price:.2}, MA20 ${ma20:.2}, MA50 ${ma50:.2}"
            ));
            reasons.push(format!(
                "20D return: {return_20d:.1}% (need ±{MIN_RETURN_20D:.0}%)"
            ));
            return Signal::fail(reasons, 0.0);
        }

        // IV window: too cheap means the move may be done, too rich
        // means IV crush risk on a debit structure.
        if let Some(iv_rank) = snapshot.iv_rank {
            if iv_rank < IV_RANK_MIN {
                reasons.push(format!(
                    "IV Rank {iv_rank:.0} too low (min {IV_RANK_MIN:.0})"
                ));
                return Signal::fail_with_direction(direction, reasons, 30.0);
            }
            if iv_rank > IV_RANK_MAX {
                reasons.push(format!(
                    "IV Rank {iv_rank:.0} too high (max {IV_RANK_MAX:.0})"
                ));
                return Signal::fail_with_direction(direction, reasons, 30.0);
            }
            reasons.push(format!("IV Rank: {iv_rank:.0} (good range)"));
        }

        if let Some(days) = snapshot.days_to_earnings {
            if (0..=MIN_DAYS_TO_EARNINGS).contains(&days) {
                reasons.push(format!("Earnings in {days} days - SKIP"));
                return Signal::fail_with_direction(direction, reasons, 40.0);
            }
        }

        let mut strength = 60.0;
        strength += (return_20d.abs() - MIN_RETURN_20D).min(10.0) * 2.0;
        if let Some(iv_rank) = snapshot.iv_rank {
            if (25.0..=45.0).contains(&iv_rank) {
                strength += 10.0;
            }
        }
        let strength = strength.min(100.0);

        Signal {
            passed: strength >= PASS_SCORE,
            direction: Some(direction),
            trade_type: Some(match direction {
                Direction::Bullish => TradeType::CallDebit,
                _ => TradeType::PutDebit,
            }),
            signal_strength: strength,
            reasons,
        }
    }

    fn option_structure(&self) -> OptionStructure {
        OptionStructure {
            dte_min: 30,
            dte_max: 45,
            long_delta: 0.40,
            short_delta: Some(0.20),
        }
    }

    fn exit_rules(&self) -> ExitRules {
        ExitRules {
            take_profit_pct: 0.50,
            stop_loss_pct: 0.50,
            time_stop_dte: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
