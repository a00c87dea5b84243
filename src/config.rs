//! Configuration from environment variables.
//!
//! Every knob is an env var (`.env` is loaded non-fatally at startup).
//! Broker credentials are modeled as presence: a broker whose required
//! variables are absent is simply "not configured" and contributes no
//! rows, which is not an error. Secrets are held as `SecretString` and
//! exposed only at header/signing time.

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use std::str::FromStr;
use std::time::Duration;

/// Default worksheet tab written to.
const DEFAULT_WORKSHEET: &str = "Dashboard Control tab";

/// Default base asset for the Kraken trade balance.
const DEFAULT_KRAKEN_BASE_ASSET: &str = "ZUSD";

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub sheet: SheetConfig,
    pub alpaca: Option<AlpacaConfig>,
    pub kraken: Option<KrakenConfig>,
    pub oanda: Option<OandaConfig>,
    /// If set, run in a loop with this interval; otherwise run once and exit.
    pub update_interval: Option<Duration>,
    /// Timezone the per-cycle timestamp is rendered in.
    pub timezone: chrono_tz::Tz,
}

/// Target spreadsheet. The bearer token is obtained out-of-band
/// (service-account auth is not this crate's concern).
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub token: SecretString,
}

#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: SecretString,
    /// Paper-trading endpoint vs live.
    pub paper: bool,
}

#[derive(Debug, Clone)]
pub struct KrakenConfig {
    pub api_key: String,
    pub api_secret: SecretString,
    /// Base asset for TradeBalance and the supplemental valuation (e.g. ZUSD).
    pub base_asset: String,
    pub supplemental: SupplementalStrategy,
}

#[derive(Debug, Clone)]
pub struct OandaConfig {
    pub api_key: SecretString,
    pub account_id: String,
    pub environment: OandaEnvironment,
}

/// How the Kraken supplemental (Earn wallet) value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplementalStrategy {
    /// Walk spot balances, include suffix-tagged Earn wallets, price each
    /// underlying via public tickers.
    EarnSuffix,
    /// Ask the Earn/Allocations endpoint for amounts already converted
    /// into the base asset.
    Allocations,
    /// No supplemental valuation.
    Off,
}

impl FromStr for SupplementalStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "earn-suffix" => Ok(Self::EarnSuffix),
            "allocations" => Ok(Self::Allocations),
            "off" => Ok(Self::Off),
            other => bail!(
                "KRAKEN_SUPPLEMENTAL must be one of earn-suffix | allocations | off, got {other:?}"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OandaEnvironment {
    Practice,
    Live,
}

impl FromStr for OandaEnvironment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "practice" => Ok(Self::Practice),
            "live" => Ok(Self::Live),
            other => bail!("OANDA_ENV must be 'practice' or 'live', got {other:?}"),
        }
    }
}

impl Config {
    /// Assemble the full configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let sheet = SheetConfig {
            spreadsheet_id: env_required("GOOGLE_SPREADSHEET_ID")?,
            worksheet: env_opt("GOOGLE_WORKSHEET_NAME")
                .unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
            token: SecretString::new(env_required("GOOGLE_SHEETS_TOKEN")?),
        };

        let alpaca = match (env_opt("ALPACA_API_KEY"), env_opt("ALPACA_API_SECRET")) {
            (Some(api_key), Some(secret)) => Some(AlpacaConfig {
                api_key,
                api_secret: SecretString::new(secret),
                paper: match env_opt("ALPACA_PAPER") {
                    Some(v) => parse_truthy(&v),
                    None => true,
                },
            }),
            _ => None,
        };

        let kraken = match (env_opt("KRAKEN_API_KEY"), env_opt("KRAKEN_API_SECRET")) {
            (Some(api_key), Some(secret)) => Some(KrakenConfig {
                api_key,
                api_secret: SecretString::new(secret),
                base_asset: env_opt("KRAKEN_BASE_ASSET")
                    .unwrap_or_else(|| DEFAULT_KRAKEN_BASE_ASSET.to_string()),
                supplemental: match env_opt("KRAKEN_SUPPLEMENTAL") {
                    Some(v) => v.parse()?,
                    None => SupplementalStrategy::EarnSuffix,
                },
            }),
            _ => None,
        };

        let oanda = match (env_opt("OANDA_API_KEY"), env_opt("OANDA_ACCOUNT_ID")) {
            (Some(api_key), Some(account_id)) => Some(OandaConfig {
                api_key: SecretString::new(api_key),
                account_id,
                environment: match env_opt("OANDA_ENV") {
                    Some(v) => v.parse()?,
                    None => OandaEnvironment::Practice,
                },
            }),
            _ => None,
        };

        let update_interval = env_opt("UPDATE_INTERVAL_SECONDS")
            .map(|v| {
                v.parse::<u64>()
                    .context("UPDATE_INTERVAL_SECONDS must be an integer (seconds)")
            })
            .transpose()?
            .map(Duration::from_secs);

        let timezone = match env_opt("DASHBOARD_TIMEZONE") {
            Some(v) => v
                .parse::<chrono_tz::Tz>()
                .map_err(|e| anyhow::anyhow!("DASHBOARD_TIMEZONE is not a valid IANA zone: {e}"))?,
            None => chrono_tz::America::Denver,
        };

        Ok(Self {
            sheet,
            alpaca,
            kraken,
            oanda,
            update_interval,
            timezone,
        })
    }
}

/// Read an env var, treating unset and empty the same way (absent).
fn env_opt(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => None,
    }
}

fn env_required(name: &str) -> Result<String> {
    env_opt(name).with_context(|| format!("Environment variable not set: {name}"))
}

/// Boolean parsing for env flags. Accepts a fixed set of truthy tokens,
/// case-insensitively; everything else is false.
pub fn parse_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_truthy_accepts_fixed_tokens() {
        assert!(parse_truthy("1"));
        assert!(parse_truthy("true"));
        assert!(parse_truthy("TRUE"));
        assert!(parse_truthy("Yes"));
    }

    #[test]
    fn test_parse_truthy_rejects_everything_else() {
        assert!(!parse_truthy("0"));
        assert!(!parse_truthy("no"));
        assert!(!parse_truthy("false"));
        assert!(!parse_truthy(""));
        assert!(!parse_truthy("on"));
    }

    #[test]
    fn test_supplemental_strategy_tokens() {
        assert_eq!(
            "earn-suffix".parse::<SupplementalStrategy>().unwrap(),
            SupplementalStrategy::EarnSuffix
        );
        assert_eq!(
            "allocations".parse::<SupplementalStrategy>().unwrap(),
            SupplementalStrategy::Allocations
        );
        assert_eq!(
            "off".parse::<SupplementalStrategy>().unwrap(),
            SupplementalStrategy::Off
        );
        assert!("suffix".parse::<SupplementalStrategy>().is_err());
    }

    #[test]
    fn test_oanda_environment_tokens() {
        assert_eq!(
            "practice".parse::<OandaEnvironment>().unwrap(),
            OandaEnvironment::Practice
        );
        assert_eq!("live".parse::<OandaEnvironment>().unwrap(), OandaEnvironment::Live);
        assert!("prod".parse::<OandaEnvironment>().is_err());
    }
}
