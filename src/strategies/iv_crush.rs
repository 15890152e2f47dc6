//! IV-crush credit spreads.
//!
//! Implied volatility is persistently overpriced relative to realized,
//! especially right after events and fear spikes. Selling credit
//! spreads into elevated IV collects premium that decays as IV
//! normalises. Direction leans against the recent move (mean
//! reversion), falling back to RSI when the move is flat.

use crate::types::{
    Direction, EdgeType, ExitRules, MarketSnapshot, OptionStructure, RiskLevel, Signal,
    StrategyDescriptor, TradeType,
};

use super::Strategy;

// Filter thresholds
const IV_RANK_MIN: f64 = 55.0;
const MAX_RETURN_20D: f64 = 8.0;
/// Sell against moves larger than this; inside the band RSI decides.
const DIRECTION_RETURN_BAND: f64 = 2.0;
const MIN_DAYS_TO_NEXT_EARNINGS: i64 = 20;
/// Report within this many days back counts as an IV-crush window.
const POST_EARNINGS_WINDOW: i64 = 5;

const PASS_SCORE: f64 = 50.0;

pub struct IvCrush {
    descriptor: StrategyDescriptor,
}

impl IvCrush {
    pub fn new() -> Self {
        Self {
            descriptor: StrategyDescriptor {
                key: "iv_crush".into(),
                name: "IV Crush Credit Spread".into(),
                description: "Sell credit spreads when IV is elevated to capture premium decay"
                    .into(),
                edge_type: EdgeType::Volatility,
                risk_level: RiskLevel::Medium,
                expected_win_rate: 0.68,
                typical_hold_days: 14,
            },
        }
    }
}

impl Default for IvCrush {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for IvCrush {
    fn descriptor(&self) -> &StrategyDescriptor {
        &self.descriptor
    }

    fn check_entry(&self, _ticker: &str, snapshot: &MarketSnapshot) -> Signal {
        let mut reasons = Vec::new();

        // IV rank is the key input for a premium-selling screen.
        let Some(iv_rank) = snapshot.iv_rank else {
            return Signal::fail(vec!["IV Rank unknown - cannot evaluate".into()], 0.0);
        };

        if iv_rank < IV_RANK_MIN {
            reasons.push(format!(
                "IV Rank {iv_rank:.0} < {IV_RANK_MIN:.0} (need elevated IV)"
            ));
            return Signal::fail(reasons, 0.0);
        }
        reasons.push(format!(
            "IV Rank: {iv_rank:.0} (elevated - good for premium selling)"
        ));

        // Earnings: a report a few days back sets up the crush; one a
        // few days ahead is event risk.
        let mut post_earnings = false;
        if let Some(days) = snapshot.days_to_earnings {
            if days < 0 && -days <= POST_EARNINGS_WINDOW {
                post_earnings = true;
                reasons.push(format!(
                    "Post-earnings ({} days ago) - IV crush opportunity",
                    -days
                ));
            }
            if (0..MIN_DAYS_TO_NEXT_EARNINGS).contains(&days) {
                reasons.push(format!("Earnings in {days} days - SKIP (event risk)"));
                return Signal::fail(reasons, 30.0);
            }
        }

        let return_20d = snapshot.return_20d.unwrap_or(0.0);
        let rsi = snapshot.rsi.unwrap_or(50.0);

        if return_20d.abs() > MAX_RETURN_20D {
            reasons.push(format!(
                "20D return {return_20d:.1}% too extreme (prefer range-bound)"
            ));
            return Signal::fail(reasons, 20.0);
        }

        // Sell against the recent move; flat moves defer to RSI.
        let (direction, trade_type) = if return_20d > DIRECTION_RETURN_BAND {
            reasons.push(format!(
                "Stock up {return_20d:.1}% - sell call spread (mean reversion)"
            ));
            (Direction::Bearish, TradeType::CallCredit)
        } else if return_20d < -DIRECTION_RETURN_BAND {
            reasons.push(format!(
                "Stock down {return_20d:.1}% - sell put spread (mean reversion)"
            ));
            (Direction::Bullish, TradeType::PutCredit)
        } else if rsi > 55.0 {
            reasons.push(format!("RSI {rsi:.0} slightly elevated - sell call spread"));
            (Direction::Bearish, TradeType::CallCredit)
        } else {
            reasons.push(format!("RSI {rsi:.0} neutral/low - sell put spread"));
            (Direction::Bullish, TradeType::PutCredit)
        };

        let mut strength = 50.0;
        strength += (iv_rank - IV_RANK_MIN) * 0.5;
        if post_earnings {
            strength += 15.0;
        }
        if (30.0..=70.0).contains(&rsi) {
            strength += 10.0;
        }
        let strength = strength.min(100.0);

        Signal {
            passed: strength >= PASS_SCORE,
            direction: Some(direction),
            trade_type: Some(trade_type),
            signal_strength: strength,
            reasons,
        }
    }

    fn option_structure(&self) -> OptionStructure {
        OptionStructure {
            dte_min: 20,
            dte_max: 35,
            long_delta: 0.10,
            short_delta: Some(0.25),
        }
    }

    fn exit_rules(&self) -> ExitRules {
        ExitRules {
            take_profit_pct: 0.50,
            stop_loss_pct: 1.50,
            time_stop_dte: 7,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
