//! Technical indicator math over daily close series.
//!
//! Pure functions; callers pass closes oldest-first. Everything returns
//! `Option` — a series too short for the requested window yields `None`
//! rather than a degenerate value.

/// Annualisation factor for daily volatility (trading days per year).
const TRADING_DAYS: f64 = 252.0;

/// Simple moving average of the last `window` closes.
pub fn sma(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let sum: f64 = closes[closes.len() - window..].iter().sum();
    Some(sum / window as f64)
}

/// Percent change over the last `bars` trading days.
pub fn pct_change(closes: &[f64], bars: usize) -> Option<f64> {
    if bars == 0 || closes.len() < bars + 1 {
        return None;
    }
    let last = *closes.last()?;
    let base = closes[closes.len() - 1 - bars];
    if base == 0.0 {
        return None;
    }
    Some((last - base) / base * 100.0)
}

/// RSI over the last `period` bars.
///
/// RSI = 100 − 100 / (1 + RS), RS = average gain / average loss.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    let start = closes.len() - period;
    for i in start..closes.len() {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses += -change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Annualised realized volatility of daily returns over the last
/// `window` bars, as a percentage.
pub fn realized_vol(closes: &[f64], window: usize) -> Option<f64> {
    let returns = daily_returns(closes);
    if window < 2 || returns.len() < window {
        return None;
    }
    let recent = &returns[returns.len() - window..];
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    let var = recent.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (recent.len() as f64 - 1.0);
    Some(var.sqrt() * TRADING_DAYS.sqrt() * 100.0)
}

/// Volatility rank: where the current 20d realized vol sits in its
/// range over the whole series, 0–100. Used as an IV-rank proxy when
/// no option-chain IV history is available.
///
/// Requires at least 50 rolling vol observations (≈70 closes) so the
/// range is meaningful.
pub fn vol_rank(closes: &[f64]) -> Option<f64> {
    const VOL_WINDOW: usize = 20;
    const MIN_OBSERVATIONS: usize = 50;

    let returns = daily_returns(closes);
    if returns.len() < VOL_WINDOW + MIN_OBSERVATIONS - 1 {
        return None;
    }

    let mut rolling = Vec::with_capacity(returns.len() - VOL_WINDOW + 1);
    for end in VOL_WINDOW..=returns.len() {
        let slice = &returns[end - VOL_WINDOW..end];
        let mean = slice.iter().sum::<f64>() / slice.len() as f64;
        let var = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / (slice.len() as f64 - 1.0);
        rolling.push(var.sqrt());
    }

    let current = *rolling.last()?;
    let min = rolling.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = rolling.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        return Some(50.0);
    }

    Some((current - min) / (max - min) * 100.0)
}

fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
