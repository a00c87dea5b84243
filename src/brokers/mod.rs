//! Brokerage integrations.
//!
//! Defines the `BrokerAdapter` trait and provides implementations for:
//! - Alpaca — equity/margin account (Trading API v2)
//! - Kraken — combined trade balance plus Earn wallet valuation
//! - OANDA — NAV/margin account (v20 REST)
//!
//! An adapter only exists when its broker's credentials are configured;
//! "not configured" is handled upstream and is not an error. Any error
//! returned here is a hard error for that broker's snapshot this cycle.

pub mod alpaca;
pub mod kraken;
pub mod oanda;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::AccountSnapshot;

/// Why a configured broker's snapshot could not be produced.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote API answered but rejected the request.
    #[error("{broker} API error {status}: {body}")]
    Api {
        broker: &'static str,
        status: StatusCode,
        body: String,
    },

    /// The response parsed but is missing data this adapter requires —
    /// typically an unsupported API version. Never silently defaulted.
    #[error("{broker} returned an unsupported response: {detail}")]
    Unsupported {
        broker: &'static str,
        detail: String,
    },

    /// Locally held credentials are unusable (e.g. secret not base64).
    #[error("{broker} credentials are invalid: {detail}")]
    Credentials {
        broker: &'static str,
        detail: String,
    },
}

/// Abstraction over brokerage account sources.
///
/// One snapshot per call; implementations hold their own HTTP client
/// and credentials.
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    /// Broker name for logging and row labels.
    fn name(&self) -> &'static str;

    /// Fetch a fresh snapshot of the account.
    async fn fetch_snapshot(&self) -> Result<AccountSnapshot, BrokerError>;
}

/// Resolve a required numeric field from an optional string value.
///
/// Absence or a non-numeric value is an `Unsupported` error: an API
/// shape we don't recognize must fail fast, not default to zero.
pub(crate) fn require_decimal(
    broker: &'static str,
    field: &str,
    value: Option<&str>,
) -> Result<Decimal, BrokerError> {
    let raw = value.ok_or_else(|| BrokerError::Unsupported {
        broker,
        detail: format!("missing required field `{field}`"),
    })?;
    raw.parse::<Decimal>().map_err(|e| BrokerError::Unsupported {
        broker,
        detail: format!("field `{field}` is not numeric ({raw:?}): {e}"),
    })
}
