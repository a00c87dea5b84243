//! Kraken public Ticker price source.
//!
//! Unauthenticated endpoint — fine for public price data.
//! API docs: https://docs.kraken.com/api/docs/rest-api/get-ticker-information
//! The response keys pairs by Kraken's own pair naming (e.g. "XXBTZUSD"
//! for a "XBTUSD" query), so we take the first entry rather than
//! matching the requested pair name.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::PriceSource;

const BASE_URL: &str = "https://api.kraken.com";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: HashMap<String, TickerInfo>,
}

#[derive(Debug, Deserialize)]
struct TickerInfo {
    /// Last trade closed: [price, lot volume].
    #[serde(default)]
    c: Vec<String>,
}

/// Spot prices from Kraken's public Ticker endpoint.
pub struct KrakenTickerSource {
    http: Client,
    base_url: String,
}

impl KrakenTickerSource {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("sheetfolio/0.1.0 (account-dashboard)")
            .build()
            .context("Failed to build HTTP client for Kraken ticker")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point at a different host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PriceSource for KrakenTickerSource {
    async fn last_trade_price(&self, underlying: &str, base: &str) -> Result<Decimal> {
        let pair = format!("{underlying}{base}");
        let url = format!(
            "{}/0/public/Ticker?pair={}",
            self.base_url,
            urlencoding::encode(&pair)
        );

        debug!(pair = %pair, "Fetching Kraken ticker");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Kraken ticker request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Kraken ticker error {status}: {body}");
        }

        let ticker: TickerResponse = resp
            .json()
            .await
            .context("Failed to parse Kraken ticker response")?;

        if !ticker.error.is_empty() {
            anyhow::bail!("Kraken ticker rejected pair {pair}: {}", ticker.error.join(", "));
        }

        let (pair_key, info) = ticker
            .result
            .into_iter()
            .next()
            .with_context(|| format!("No ticker data returned for pair {pair}"))?;

        let last_close = info
            .c
            .first()
            .with_context(|| format!("Ticker for {pair_key} has no last-trade price"))?;

        last_close
            .parse::<Decimal>()
            .with_context(|| format!("Malformed last-trade price for {pair_key}: {last_close:?}"))
    }
}
