//! Yahoo Finance chart-API provider.
//!
//! Fetches one year of daily closes per ticker from the public v8 chart
//! endpoint and derives the snapshot indicators locally. No API key;
//! the endpoint only wants a browser-ish user agent.
//!
//! API: `https://query1.finance.yahoo.com/v8/finance/chart/{symbol}`
//! Nulls appear inside the close array on halted days — they are
//! dropped before any indicator math.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{indicators, SnapshotProvider};
use crate::types::{DataError, MarketSnapshot};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const PROVIDER_NAME: &str = "yahoo";

/// Chart query window. A year of dailies is enough for the vol rank.
const RANGE: &str = "1y";
const INTERVAL: &str = "1d";

const REQUEST_TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; edgescan/0.1)";

/// Minimum usable closes — below this MA50 and the vol rank are
/// meaningless and the ticker is skipped.
const MIN_CLOSES: usize = 50;

// ---------------------------------------------------------------------------
// API response types (Yahoo JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Snapshot provider backed by the Yahoo chart API.
pub struct YahooProvider {
    client: Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for Yahoo provider")?;
        Ok(Self { client })
    }

    async fn fetch_closes(&self, ticker: &str) -> Result<(Option<f64>, Vec<f64>), DataError> {
        let url = format!(
            "{BASE_URL}/{}?range={RANGE}&interval={INTERVAL}",
            urlencoding::encode(ticker)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::unavailable(ticker, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DataError::unavailable(
                ticker,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| DataError::unavailable(ticker, format!("bad response body: {e}")))?;

        if let Some(err) = body.chart.error {
            return Err(DataError::unavailable(ticker, format!("chart error: {err}")));
        }

        let result = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| DataError::unavailable(ticker, "empty chart result"))?;

        let closes: Vec<f64> = result
            .indicators
            .quote
            .first()
            .map(|q| q.close.iter().flatten().copied().collect())
            .unwrap_or_default();

        Ok((result.meta.regular_market_price, closes))
    }
}

#[async_trait]
impl SnapshotProvider for YahooProvider {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, DataError> {
        let (market_price, closes) = self.fetch_closes(ticker).await?;

        if closes.len() < MIN_CLOSES {
            warn!(
                ticker,
                closes = closes.len(),
                "Insufficient price history, skipping"
            );
            return Err(DataError::unavailable(
                ticker,
                format!("only {} closes, need {MIN_CLOSES}", closes.len()),
            ));
        }

        let snapshot = build_snapshot(market_price, &closes)
            .ok_or_else(|| DataError::unavailable(ticker, "no usable price"))?;

        debug!(
            ticker,
            price = snapshot.price,
            rsi = ?snapshot.rsi,
            iv_rank = ?snapshot.iv_rank,
            "Snapshot built"
        );

        Ok(snapshot)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

/// Derive a snapshot from a close series, preferring the live market
/// price over the final close when the feed supplies one.
fn build_snapshot(market_price: Option<f64>, closes: &[f64]) -> Option<MarketSnapshot> {
    let price = market_price.or_else(|| closes.last().copied())?;
    if price <= 0.0 {
        return None;
    }

    Some(MarketSnapshot {
        price,
        return_5d: indicators::pct_change(closes, 5),
        return_20d: indicators::pct_change(closes, 20),
        iv_rank: indicators::vol_rank(closes),
        rsi: indicators::rsi(closes, 14),
        ma20: indicators::sma(closes, 20),
        ma50: indicators::sma(closes, 50),
        realized_vol: indicators::realized_vol(closes, 20),
        // The chart endpoint carries no earnings calendar.
        days_to_earnings: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"regularMarketPrice": 105.25, "symbol": "TEST"},
                "timestamp": [1700000000, 1700086400, 1700172800],
                "indicators": {
                    "quote": [{"close": [100.0, null, 104.5]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_response_drops_nulls() {
        let parsed: ChartResponse = serde_json::from_str(SAMPLE_CHART).unwrap();
        let results = parsed.chart.result.unwrap();
        let result = &results[0];
        assert_eq!(result.meta.regular_market_price, Some(105.25));

        let closes: Vec<f64> = result.indicators.quote[0]
            .close
            .iter()
            .flatten()
            .copied()
            .collect();
        assert_eq!(closes, vec![100.0, 104.5]);
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        let parsed: ChartResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.chart.result.is_none());
        assert!(parsed.chart.error.is_some());
    }

    #[test]
    fn test_build_snapshot_prefers_market_price() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.1).collect();
        let snap = build_snapshot(Some(120.0), &closes).unwrap();
        assert!((snap.price - 120.0).abs() < 1e-10);
    }

    #[test]
    fn test_build_snapshot_falls_back_to_last_close() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.1).collect();
        let snap = build_snapshot(None, &closes).unwrap();
        assert!((snap.price - closes[59]).abs() < 1e-10);
    }

    #[test]
    fn test_build_snapshot_computes_mas() {
        let closes: Vec<f64> = (0..60).map(|_| 100.0).collect();
        let snap = build_snapshot(None, &closes).unwrap();
        assert_eq!(snap.ma20, Some(100.0));
        assert_eq!(snap.ma50, Some(100.0));
        // A year of history is needed for the vol rank; 60 closes isn't.
        assert!(snap.iv_rank.is_none());
    }

    #[test]
    fn test_build_snapshot_rejects_nonpositive_price() {
        assert!(build_snapshot(Some(0.0), &[100.0]).is_none());
        assert!(build_snapshot(None, &[]).is_none());
    }

    #[test]
    fn test_provider_constructs() {
        let provider = YahooProvider::new().unwrap();
        assert_eq!(provider.name(), "yahoo");
    }
}
