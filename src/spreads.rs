//! Spread construction — pure strike and risk math per trade type.
//!
//! Turns a trade type and an underlying price into a concrete option
//! structure: legs, breakevens, max profit and max loss. Strike offsets
//! are fixed percentage constants; premiums default to estimation
//! constants but every constructor also accepts an explicit premium so
//! callers with real chain quotes can supply one.
//!
//! Strikes are exact offset targets, not rounded to listed increments —
//! matching against a live chain happens at order entry, outside this
//! crate. Dollar amounts (max profit / max loss) are per contract
//! (×100 shares); breakevens are price levels.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::TradeType;

// ---------------------------------------------------------------------------
// Strike offset and premium estimation constants
// ---------------------------------------------------------------------------

/// Long single-leg strikes sit slightly out of the money.
const LONG_CALL_STRIKE_PCT: f64 = 1.02;
const LONG_PUT_STRIKE_PCT: f64 = 0.98;

/// Debit spreads: long leg at the money, short leg 5% out.
const DEBIT_LONG_STRIKE_PCT: f64 = 1.00;
const CALL_DEBIT_SHORT_STRIKE_PCT: f64 = 1.05;
const PUT_DEBIT_SHORT_STRIKE_PCT: f64 = 0.95;

/// Credit spreads: short leg 5% out, long wing 10% out.
const CALL_CREDIT_SHORT_STRIKE_PCT: f64 = 1.05;
const CALL_CREDIT_LONG_STRIKE_PCT: f64 = 1.10;
const PUT_CREDIT_SHORT_STRIKE_PCT: f64 = 0.95;
const PUT_CREDIT_LONG_STRIKE_PCT: f64 = 0.90;

/// Default premium estimates, used when no chain quote is supplied.
/// Debit near the upper bound of what the screens tolerate; credit at
/// the minimum the screens demand.
const EST_DEBIT_PCT_OF_WIDTH: f64 = 0.40;
const EST_CREDIT_PCT_OF_WIDTH: f64 = 0.30;
const EST_LONG_PREMIUM_PCT_OF_PRICE: f64 = 0.02;

/// Options are quoted per share; P&L is per 100-share contract.
const CONTRACT_MULTIPLIER: f64 = 100.0;

// ---------------------------------------------------------------------------
// Legs and structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionRight {
    Call,
    Put,
}

/// One leg of an option structure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpreadLeg {
    pub action: LegAction,
    pub right: OptionRight,
    pub strike: f64,
}

impl SpreadLeg {
    fn buy(right: OptionRight, strike: f64) -> Self {
        SpreadLeg {
            action: LegAction::Buy,
            right,
            strike,
        }
    }

    fn sell(right: OptionRight, strike: f64) -> Self {
        SpreadLeg {
            action: LegAction::Sell,
            right,
            strike,
        }
    }
}

impl fmt::Display for SpreadLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            LegAction::Buy => "BUY",
            LegAction::Sell => "SELL",
        };
        let right = match self.right {
            OptionRight::Call => "C",
            OptionRight::Put => "P",
        };
        write!(f, "{action} {:.2}{right}", self.strike)
    }
}

/// A fully specified option structure for one candidate.
///
/// `net_premium` is the per-share debit paid (long structures, debit
/// spreads) or credit received (credit structures). `max_profit` is
/// `None` for structures with unlimited upside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeStructure {
    pub trade_type: TradeType,
    pub legs: Vec<SpreadLeg>,
    /// Per-share debit paid or credit received at entry.
    pub net_premium: f64,
    /// Price levels where the position breaks even at expiry.
    /// One entry for directional structures, two for iron condors.
    pub breakevens: Vec<f64>,
    /// Per-contract dollars; `None` means unlimited.
    pub max_profit: Option<f64>,
    /// Per-contract dollars.
    pub max_loss: f64,
}

impl TradeStructure {
    // -- Constructors with explicit premiums -----------------------------

    /// Long call: buy slightly OTM, unlimited upside.
    pub fn long_call(price: f64, premium: f64) -> Self {
        let strike = price * LONG_CALL_STRIKE_PCT;
        TradeStructure {
            trade_type: TradeType::CallLong,
            legs: vec![SpreadLeg::buy(OptionRight::Call, strike)],
            net_premium: premium,
            breakevens: vec![strike + premium],
            max_profit: None,
            max_loss: premium * CONTRACT_MULTIPLIER,
        }
    }

    /// Long put: buy slightly OTM; profit capped by the zero bound.
    pub fn long_put(price: f64, premium: f64) -> Self {
        let strike = price * LONG_PUT_STRIKE_PCT;
        let breakeven = strike - premium;
        TradeStructure {
            trade_type: TradeType::PutLong,
            legs: vec![SpreadLeg::buy(OptionRight::Put, strike)],
            net_premium: premium,
            breakevens: vec![breakeven],
            // Underlying can't go below zero.
            max_profit: Some(breakeven.max(0.0) * CONTRACT_MULTIPLIER),
            max_loss: premium * CONTRACT_MULTIPLIER,
        }
    }

    /// Bullish call debit spread: buy ATM, sell 5% above.
    pub fn call_debit(price: f64, debit: f64) -> Self {
        let buy_strike = price * DEBIT_LONG_STRIKE_PCT;
        let sell_strike = price * CALL_DEBIT_SHORT_STRIKE_PCT;
        let width = sell_strike - buy_strike;
        TradeStructure {
            trade_type: TradeType::CallDebit,
            legs: vec![
                SpreadLeg::buy(OptionRight::Call, buy_strike),
                SpreadLeg::sell(OptionRight::Call, sell_strike),
            ],
            net_premium: debit,
            breakevens: vec![buy_strike + debit],
            max_profit: Some((width - debit) * CONTRACT_MULTIPLIER),
            max_loss: debit * CONTRACT_MULTIPLIER,
        }
    }

    /// Bearish put debit spread: buy ATM, sell 5% below.
    pub fn put_debit(price: f64, debit: f64) -> Self {
        let buy_strike = price * DEBIT_LONG_STRIKE_PCT;
        let sell_strike = price * PUT_DEBIT_SHORT_STRIKE_PCT;
        let width = buy_strike - sell_strike;
        TradeStructure {
            trade_type: TradeType::PutDebit,
            legs: vec![
                SpreadLeg::buy(OptionRight::Put, buy_strike),
                SpreadLeg::sell(OptionRight::Put, sell_strike),
            ],
            net_premium: debit,
            breakevens: vec![buy_strike - debit],
            max_profit: Some((width - debit) * CONTRACT_MULTIPLIER),
            max_loss: debit * CONTRACT_MULTIPLIER,
        }
    }

    /// Bearish call credit spread: sell 5% above, buy wing 10% above.
    pub fn call_credit(price: f64, credit: f64) -> Self {
        let sell_strike = price * CALL_CREDIT_SHORT_STRIKE_PCT;
        let buy_strike = price * CALL_CREDIT_LONG_STRIKE_PCT;
        let width = buy_strike - sell_strike;
        TradeStructure {
            trade_type: TradeType::CallCredit,
            legs: vec![
                SpreadLeg::sell(OptionRight::Call, sell_strike),
                SpreadLeg::buy(OptionRight::Call, buy_strike),
            ],
            net_premium: credit,
            breakevens: vec![sell_strike + credit],
            max_profit: Some(credit * CONTRACT_MULTIPLIER),
            max_loss: (width - credit) * CONTRACT_MULTIPLIER,
        }
    }

    /// Bullish put credit spread: sell 5% below, buy wing 10% below.
    pub fn put_credit(price: f64, credit: f64) -> Self {
        let sell_strike = price * PUT_CREDIT_SHORT_STRIKE_PCT;
        let buy_strike = price * PUT_CREDIT_LONG_STRIKE_PCT;
        let width = sell_strike - buy_strike;
        TradeStructure {
            trade_type: TradeType::PutCredit,
            legs: vec![
                SpreadLeg::sell(OptionRight::Put, sell_strike),
                SpreadLeg::buy(OptionRight::Put, buy_strike),
            ],
            net_premium: credit,
            breakevens: vec![sell_strike - credit],
            max_profit: Some(credit * CONTRACT_MULTIPLIER),
            max_loss: (width - credit) * CONTRACT_MULTIPLIER,
        }
    }

    /// Iron condor: call credit spread + put credit spread, short
    /// strikes at ±5%, wings at ±10%. `credit` is the total received
    /// from both sides.
    pub fn iron_condor(price: f64, credit: f64) -> Self {
        let call_sell = price * CALL_CREDIT_SHORT_STRIKE_PCT;
        let call_buy = price * CALL_CREDIT_LONG_STRIKE_PCT;
        let put_sell = price * PUT_CREDIT_SHORT_STRIKE_PCT;
        let put_buy = price * PUT_CREDIT_LONG_STRIKE_PCT;
        let call_width = call_buy - call_sell;
        let put_width = put_sell - put_buy;
        TradeStructure {
            trade_type: TradeType::IronCondor,
            legs: vec![
                SpreadLeg::sell(OptionRight::Put, put_sell),
                SpreadLeg::buy(OptionRight::Put, put_buy),
                SpreadLeg::sell(OptionRight::Call, call_sell),
                SpreadLeg::buy(OptionRight::Call, call_buy),
            ],
            net_premium: credit,
            breakevens: vec![put_sell - credit, call_sell + credit],
            max_profit: Some(credit * CONTRACT_MULTIPLIER),
            // Only one side can be breached at expiry.
            max_loss: (call_width.max(put_width) - credit) * CONTRACT_MULTIPLIER,
        }
    }

    // -- Default-premium construction ------------------------------------

    /// Build the structure for a trade type using the default premium
    /// estimates. This is what the evaluation pipeline uses; callers
    /// holding real chain quotes use the explicit constructors instead.
    pub fn for_trade(trade_type: TradeType, price: f64) -> Self {
        match trade_type {
            TradeType::CallLong => {
                Self::long_call(price, price * EST_LONG_PREMIUM_PCT_OF_PRICE)
            }
            TradeType::PutLong => {
                Self::long_put(price, price * EST_LONG_PREMIUM_PCT_OF_PRICE)
            }
            TradeType::CallDebit => {
                let width = price * (CALL_DEBIT_SHORT_STRIKE_PCT - DEBIT_LONG_STRIKE_PCT);
                Self::call_debit(price, width * EST_DEBIT_PCT_OF_WIDTH)
            }
            TradeType::PutDebit => {
                let width = price * (DEBIT_LONG_STRIKE_PCT - PUT_DEBIT_SHORT_STRIKE_PCT);
                Self::put_debit(price, width * EST_DEBIT_PCT_OF_WIDTH)
            }
            TradeType::CallCredit => {
                let width = price * (CALL_CREDIT_LONG_STRIKE_PCT - CALL_CREDIT_SHORT_STRIKE_PCT);
                Self::call_credit(price, width * EST_CREDIT_PCT_OF_WIDTH)
            }
            TradeType::PutCredit => {
                let width = price * (PUT_CREDIT_SHORT_STRIKE_PCT - PUT_CREDIT_LONG_STRIKE_PCT);
                Self::put_credit(price, width * EST_CREDIT_PCT_OF_WIDTH)
            }
            TradeType::IronCondor => {
                let call_width =
                    price * (CALL_CREDIT_LONG_STRIKE_PCT - CALL_CREDIT_SHORT_STRIKE_PCT);
                let put_width =
                    price * (PUT_CREDIT_SHORT_STRIKE_PCT - PUT_CREDIT_LONG_STRIKE_PCT);
                let avg_width = (call_width + put_width) / 2.0;
                Self::iron_condor(price, avg_width * EST_CREDIT_PCT_OF_WIDTH)
            }
        }
    }

    /// Risk/reward ratio (max profit over max loss); `None` when the
    /// upside is unlimited or the downside is zero.
    pub fn risk_reward(&self) -> Option<f64> {
        match self.max_profit {
            Some(p) if self.max_loss > 0.0 => Some(p / self.max_loss),
            _ => None,
        }
    }
}

impl fmt::Display for TradeStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let legs: Vec<String> = self.legs.iter().map(|l| l.to_string()).collect();
        write!(
            f,
            "{} [{}] premium {:.2}, breakeven {}",
            self.trade_type,
            legs.join(" / "),
            self.net_premium,
            self.breakevens
                .iter()
                .map(|b| format!("{b:.2}"))
                .collect::<Vec<_>>()
                .join(" & "),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
