//! Kraken trade-balance adapter with Earn wallet valuation.
//!
//! API docs: https://docs.kraken.com/api/docs/rest-api/get-trade-balance
//! Private REST calls are signed:
//! `API-Sign = base64(HMAC-SHA512(secret, path ‖ SHA256(nonce ‖ postdata)))`
//! with the API secret base64-decoded and a millisecond nonce.
//!
//! Beyond the combined trade balance, the adapter can value the account's
//! Earn/staking wallets as a supplemental figure, either by walking
//! suffix-tagged spot balances or by asking the Earn/Allocations endpoint
//! for pre-converted amounts. Supplemental failures never fail the
//! snapshot.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{require_decimal, BrokerAdapter, BrokerError};
use crate::config::{KrakenConfig, SupplementalStrategy};
use crate::types::{AccountSnapshot, RawBalance, SupplementalValue};
use crate::valuation::ticker::KrakenTickerSource;
use crate::valuation::{assets, convert_to_base, wallet};

const BASE_URL: &str = "https://api.kraken.com";
const BROKER_NAME: &str = "Kraken";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// Every Kraken REST response wraps its payload in this envelope.
#[derive(Debug, Deserialize)]
struct KrakenEnvelope<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

/// `/0/private/TradeBalance` — only the fields we need.
#[derive(Debug, Deserialize)]
struct TradeBalance {
    /// Equivalent balance (combined value of all currencies).
    #[serde(default)]
    eb: Option<String>,
    /// Free margin. Absent on accounts without margin.
    #[serde(default)]
    mf: Option<String>,
}

/// `/0/private/Earn/Allocations` — converted allocation totals.
#[derive(Debug, Deserialize)]
struct EarnAllocations {
    #[serde(default)]
    items: Vec<EarnAllocation>,
}

#[derive(Debug, Deserialize)]
struct EarnAllocation {
    #[serde(default)]
    amount_allocated: Option<AllocatedAmount>,
}

#[derive(Debug, Deserialize)]
struct AllocatedAmount {
    #[serde(default)]
    total: Option<AllocationTotal>,
}

#[derive(Debug, Deserialize)]
struct AllocationTotal {
    /// Amount expressed in the requested `converted_asset`.
    #[serde(default)]
    converted: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Kraken private REST client.
pub struct KrakenAdapter {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: SecretString,
    base_asset: String,
    supplemental: SupplementalStrategy,
    ticker: KrakenTickerSource,
}

impl KrakenAdapter {
    pub fn new(cfg: &KrakenConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("sheetfolio/0.1.0 (account-dashboard)")
            .build()
            .context("Failed to build HTTP client for Kraken")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            api_key: cfg.api_key.clone(),
            api_secret: cfg.api_secret.clone(),
            base_asset: cfg.base_asset.clone(),
            supplemental: cfg.supplemental,
            ticker: KrakenTickerSource::new()?,
        })
    }

    /// Point the private API and the public ticker at a different host
    /// (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.ticker = self.ticker.with_base_url(url.clone());
        self.base_url = url;
        self
    }

    // -- Internal helpers ------------------------------------------------

    /// Signed POST to a private endpoint, unwrapping the Kraken envelope.
    async fn private_post<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, BrokerError> {
        let nonce = chrono::Utc::now().timestamp_millis().to_string();

        let mut postdata = format!("nonce={nonce}");
        for (key, value) in params {
            postdata.push('&');
            postdata.push_str(key);
            postdata.push('=');
            postdata.push_str(&urlencoding::encode(value));
        }

        let signature = sign(self.api_secret.expose_secret(), path, &nonce, &postdata)?;

        let url = format!("{}{}", self.base_url, path);
        debug!(path, "Kraken private request");

        let resp = self
            .http
            .post(&url)
            .header("API-Key", &self.api_key)
            .header("API-Sign", signature)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(postdata)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Api {
                broker: BROKER_NAME,
                status,
                body,
            });
        }

        let envelope: KrakenEnvelope<T> = resp.json().await?;

        if !envelope.error.is_empty() {
            return Err(BrokerError::Api {
                broker: BROKER_NAME,
                status,
                body: envelope.error.join(", "),
            });
        }

        envelope.result.ok_or_else(|| BrokerError::Unsupported {
            broker: BROKER_NAME,
            detail: "response has no `result` payload".to_string(),
        })
    }

    /// Compute the supplemental (Earn wallet) value per the configured
    /// strategy. All errors are absorbed here: a broken supplemental
    /// valuation degrades to "no supplemental value", never a failed
    /// snapshot.
    async fn supplemental_value(&self) -> Option<SupplementalValue> {
        let result = match self.supplemental {
            SupplementalStrategy::Off => return None,
            SupplementalStrategy::EarnSuffix => self.earn_wallet_value().await,
            SupplementalStrategy::Allocations => self.allocations_value().await,
        };

        match result {
            Ok(value) if value > Decimal::ZERO => Some(SupplementalValue {
                currency: self.base_asset.clone(),
                value,
            }),
            // Zero/negative totals are omitted entirely, not shown as 0.
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Kraken supplemental valuation failed; omitting");
                None
            }
        }
    }

    /// Suffix strategy: fetch spot balances, classify Earn wallets,
    /// and price each underlying via public tickers.
    async fn earn_wallet_value(&self) -> Result<Decimal, BrokerError> {
        let balances: HashMap<String, String> =
            self.private_post("/0/private/Balance", &[]).await?;

        let raw: RawBalance = balances
            .into_iter()
            .filter_map(|(code, amount)| match amount.parse::<Decimal>() {
                Ok(amount) => Some((code, amount)),
                Err(_) => {
                    debug!(asset = %code, raw = %amount, "Skipping unparseable balance");
                    None
                }
            })
            .collect();

        let classified = wallet::classify(&raw);
        if classified.is_empty() {
            return Ok(Decimal::ZERO);
        }

        Ok(convert_to_base(&classified, &self.base_asset, &self.ticker).await)
    }

    /// Allocations strategy: the Earn/Allocations endpoint reports each
    /// allocation already converted into the requested asset.
    async fn allocations_value(&self) -> Result<Decimal, BrokerError> {
        let base_alt = assets::normalize(&self.base_asset);
        let allocations: EarnAllocations = self
            .private_post("/0/private/Earn/Allocations", &[("converted_asset", base_alt)])
            .await?;

        let mut total = Decimal::ZERO;
        for item in &allocations.items {
            let converted = item
                .amount_allocated
                .as_ref()
                .and_then(|a| a.total.as_ref())
                .and_then(|t| t.converted.as_deref());

            match converted.map(str::parse::<Decimal>) {
                Some(Ok(amount)) => total += amount,
                Some(Err(e)) => {
                    warn!(error = %e, "Skipping allocation with malformed converted amount");
                }
                None => {
                    warn!("Skipping allocation with no converted amount");
                }
            }
        }

        Ok(total)
    }
}

#[async_trait]
impl BrokerAdapter for KrakenAdapter {
    fn name(&self) -> &'static str {
        BROKER_NAME
    }

    /// account_value ← `eb` (equivalent balance, combined);
    /// available_funds ← `mf` (free margin) when present, else `eb`.
    async fn fetch_snapshot(&self) -> Result<AccountSnapshot, BrokerError> {
        let tb: TradeBalance = self
            .private_post("/0/private/TradeBalance", &[("asset", self.base_asset.as_str())])
            .await?;

        let account_value = require_decimal(BROKER_NAME, "eb", tb.eb.as_deref())?;

        // Fallback order: free margin when the account reports it,
        // otherwise the combined balance.
        let available_funds = match tb.mf.as_deref() {
            Some(mf) => require_decimal(BROKER_NAME, "mf", Some(mf))?,
            None => account_value,
        };

        let supplemental = self.supplemental_value().await;

        Ok(AccountSnapshot {
            name: BROKER_NAME,
            currency: self.base_asset.clone(),
            account_value,
            available_funds,
            supplemental,
        })
    }
}

// ---------------------------------------------------------------------------
// Request signing
// ---------------------------------------------------------------------------

/// Kraken request signature:
/// `base64(HMAC-SHA512(base64-decode(secret), path ‖ SHA256(nonce ‖ postdata)))`.
fn sign(
    secret_b64: &str,
    path: &str,
    nonce: &str,
    postdata: &str,
) -> Result<String, BrokerError> {
    let secret = BASE64
        .decode(secret_b64)
        .map_err(|e| BrokerError::Credentials {
            broker: BROKER_NAME,
            detail: format!("API secret is not valid base64: {e}"),
        })?;

    let mut sha = Sha256::new();
    sha.update(nonce.as_bytes());
    sha.update(postdata.as_bytes());
    let digest = sha.finalize();

    let mut mac =
        Hmac::<Sha512>::new_from_slice(&secret).map_err(|e| BrokerError::Credentials {
            broker: BROKER_NAME,
            detail: format!("API secret has an unusable length: {e}"),
        })?;
    mac.update(path.as_bytes());
    mac.update(&digest);

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
