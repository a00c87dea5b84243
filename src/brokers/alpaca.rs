//! Alpaca equity/margin account adapter.
//!
//! API docs: https://docs.alpaca.markets/reference/getaccount-1
//! Auth: `APCA-API-KEY-ID` / `APCA-API-SECRET-KEY` headers.
//! Paper and live accounts live on different hosts.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{require_decimal, BrokerAdapter, BrokerError};
use crate::config::AlpacaConfig;
use crate::types::AccountSnapshot;

const PAPER_URL: &str = "https://paper-api.alpaca.markets";
const LIVE_URL: &str = "https://api.alpaca.markets";
const BROKER_NAME: &str = "Alpaca";

/// Fallback when the account object carries no currency.
const DEFAULT_CURRENCY: &str = "USD";

/// `/v2/account` — only the fields we need. Numerics arrive as strings.
#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    #[serde(default)]
    equity: Option<String>,
    #[serde(default)]
    buying_power: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

/// Alpaca Trading API client.
pub struct AlpacaAdapter {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: SecretString,
}

impl AlpacaAdapter {
    pub fn new(cfg: &AlpacaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("sheetfolio/0.1.0 (account-dashboard)")
            .build()
            .context("Failed to build HTTP client for Alpaca")?;

        let base_url = if cfg.paper { PAPER_URL } else { LIVE_URL };

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: cfg.api_key.clone(),
            api_secret: cfg.api_secret.clone(),
        })
    }

    /// Point at a different host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl BrokerAdapter for AlpacaAdapter {
    fn name(&self) -> &'static str {
        BROKER_NAME
    }

    /// account_value ← equity, available_funds ← buying power.
    async fn fetch_snapshot(&self) -> Result<AccountSnapshot, BrokerError> {
        let url = format!("{}/v2/account", self.base_url);
        debug!(url = %url, "Fetching Alpaca account");

        let resp = self
            .http
            .get(&url)
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", self.api_secret.expose_secret())
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Api {
                broker: BROKER_NAME,
                status,
                body,
            });
        }

        let account: AlpacaAccount = resp.json().await?;

        let equity = require_decimal(BROKER_NAME, "equity", account.equity.as_deref())?;
        let buying_power =
            require_decimal(BROKER_NAME, "buying_power", account.buying_power.as_deref())?;
        let currency = account
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        Ok(AccountSnapshot {
            name: BROKER_NAME,
            currency,
            account_value: equity,
            available_funds: buying_power,
            supplemental: None,
        })
    }
}
