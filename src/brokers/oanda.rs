//! OANDA NAV/margin account adapter.
//!
//! API docs: https://developer.oanda.com/rest-live-v20/account-ep/
//! Auth: `Authorization: Bearer {token}`.
//! Practice and live accounts live on different hosts.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{require_decimal, BrokerAdapter, BrokerError};
use crate::config::{OandaConfig, OandaEnvironment};
use crate::types::AccountSnapshot;

const PRACTICE_URL: &str = "https://api-fxpractice.oanda.com";
const LIVE_URL: &str = "https://api-fxtrade.oanda.com";
const BROKER_NAME: &str = "OANDA";

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Deserialize)]
struct AccountSummaryResponse {
    #[serde(default)]
    account: Option<OandaAccount>,
}

/// Account summary — only the fields we need. Numerics arrive as strings.
#[derive(Debug, Deserialize)]
struct OandaAccount {
    #[serde(rename = "NAV", default)]
    nav: Option<String>,
    #[serde(rename = "marginAvailable", default)]
    margin_available: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

/// OANDA v20 REST client.
pub struct OandaAdapter {
    http: Client,
    base_url: String,
    api_key: SecretString,
    account_id: String,
}

impl OandaAdapter {
    pub fn new(cfg: &OandaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("sheetfolio/0.1.0 (account-dashboard)")
            .build()
            .context("Failed to build HTTP client for OANDA")?;

        let base_url = match cfg.environment {
            OandaEnvironment::Practice => PRACTICE_URL,
            OandaEnvironment::Live => LIVE_URL,
        };

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: cfg.api_key.clone(),
            account_id: cfg.account_id.clone(),
        })
    }

    /// Point at a different host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl BrokerAdapter for OandaAdapter {
    fn name(&self) -> &'static str {
        BROKER_NAME
    }

    /// account_value ← NAV, available_funds ← marginAvailable.
    async fn fetch_snapshot(&self) -> Result<AccountSnapshot, BrokerError> {
        let url = format!("{}/v3/accounts/{}/summary", self.base_url, self.account_id);
        debug!(url = %url, "Fetching OANDA account summary");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
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

        let summary: AccountSummaryResponse = resp.json().await?;
        let account = summary.account.ok_or_else(|| BrokerError::Unsupported {
            broker: BROKER_NAME,
            detail: "summary response has no `account` object".to_string(),
        })?;

        let nav = require_decimal(BROKER_NAME, "NAV", account.nav.as_deref())?;
        let margin_available = require_decimal(
            BROKER_NAME,
            "marginAvailable",
            account.margin_available.as_deref(),
        )?;
        let currency = account
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        Ok(AccountSnapshot {
            name: BROKER_NAME,
            currency,
            account_value: nav,
            available_funds: margin_available,
            supplemental: None,
        })
    }
}
