//! Supplemental wallet valuation.
//!
//! Converts classified wallet balances into a base currency using spot
//! prices. The conversion never fails: every per-asset problem (missing
//! ticker, fetch error, malformed quote) is absorbed and logged, because
//! a partial wallet total is strictly preferable to losing the account's
//! rows for the cycle.

pub mod assets;
pub mod ticker;
pub mod wallet;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

use self::wallet::ClassifiedBalance;

/// Abstraction over a spot-price feed.
///
/// Returns the last-trade price of `underlying` quoted in `base`
/// (e.g. DOT in USD), or an error when the pair is unavailable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn last_trade_price(&self, underlying: &str, base: &str) -> Result<Decimal>;
}

/// Spot-price cache for a single valuation pass.
///
/// Keyed by underlying asset only, so a run performs at most one fetch
/// per underlying even when it appears in multiple buckets — a failed
/// fetch is remembered as `None` and not retried within the pass.
/// Never persists across cycles; prices are point-in-time.
#[derive(Debug, Default)]
struct PriceCache {
    prices: HashMap<String, Option<Decimal>>,
}

impl PriceCache {
    fn get(&self, underlying: &str) -> Option<&Option<Decimal>> {
        self.prices.get(underlying)
    }

    fn insert(&mut self, underlying: &str, price: Option<Decimal>) {
        self.prices.insert(underlying.to_string(), price);
    }
}

/// Value a classified balance in `base_asset`.
///
/// Entries whose underlying equals the base asset (or its normalized
/// alias) are added directly — an exact-equality fast path that performs
/// no price lookup and never touches the cache. Everything else is
/// converted at the cached or freshly fetched spot price; assets that
/// cannot be priced contribute nothing.
pub async fn convert_to_base(
    classified: &ClassifiedBalance,
    base_asset: &str,
    source: &dyn PriceSource,
) -> Decimal {
    let base_alt = assets::normalize(base_asset);
    let mut cache = PriceCache::default();
    let mut total = Decimal::ZERO;

    for entry in classified.included() {
        if entry.underlying == base_asset || entry.underlying == base_alt {
            total += entry.amount;
            continue;
        }

        let price = match cache.get(&entry.underlying) {
            Some(cached) => *cached,
            None => {
                let fetched = match source.last_trade_price(&entry.underlying, base_alt).await {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!(
                            asset = %entry.code,
                            underlying = %entry.underlying,
                            base = base_alt,
                            error = %e,
                            "Could not price asset; skipping its contribution"
                        );
                        None
                    }
                };
                cache.insert(&entry.underlying, fetched);
                fetched
            }
        };

        if let Some(price) = price {
            debug!(
                asset = %entry.code,
                amount = %entry.amount,
                price = %price,
                "Valued wallet asset"
            );
            total += entry.amount * price;
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawBalance;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn classified(pairs: &[(&str, Decimal)]) -> ClassifiedBalance {
        let raw: RawBalance = pairs.iter().map(|(c, a)| (c.to_string(), *a)).collect();
        wallet::classify(&raw)
    }

    #[tokio::test]
    async fn test_mixed_wallet_valuation() {
        // DOT.B at 5, ETH.S at 2000; XBT.F is Auto Earn and must not even
        // trigger a price lookup.
        let balances = classified(&[
            ("DOT.B", dec!(10)),
            ("XBT.F", dec!(1)),
            ("ETH.S", dec!(2)),
        ]);

        let mut source = MockPriceSource::new();
        source
            .expect_last_trade_price()
            .with(eq("DOT"), eq("USD"))
            .times(1)
            .returning(|_, _| Ok(dec!(5)));
        source
            .expect_last_trade_price()
            .with(eq("ETH"), eq("USD"))
            .times(1)
            .returning(|_, _| Ok(dec!(2000)));

        let total = convert_to_base(&balances, "ZUSD", &source).await;
        assert_eq!(total, dec!(4050));
    }

    #[tokio::test]
    async fn test_base_asset_fast_path_performs_no_lookups() {
        let balances = classified(&[("USD.B", dec!(250)), ("ZUSD.S", dec!(50))]);

        let mut source = MockPriceSource::new();
        source.expect_last_trade_price().times(0);

        let total = convert_to_base(&balances, "ZUSD", &source).await;
        assert_eq!(total, dec!(300));
    }

    #[tokio::test]
    async fn test_failed_lookup_skips_only_that_asset() {
        let balances = classified(&[("DOT.B", dec!(10)), ("ETH.S", dec!(2))]);

        let mut source = MockPriceSource::new();
        source
            .expect_last_trade_price()
            .with(eq("DOT"), eq("USD"))
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("pair unavailable")));
        source
            .expect_last_trade_price()
            .with(eq("ETH"), eq("USD"))
            .times(1)
            .returning(|_, _| Ok(dec!(2000)));

        let total = convert_to_base(&balances, "ZUSD", &source).await;
        assert_eq!(total, dec!(4000));
    }

    #[tokio::test]
    async fn test_price_cached_per_underlying() {
        // DOT appears in two buckets; the feed must be hit once.
        let balances = classified(&[("DOT.B", dec!(10)), ("DOT.S", dec!(4))]);

        let mut source = MockPriceSource::new();
        source
            .expect_last_trade_price()
            .with(eq("DOT"), eq("USD"))
            .times(1)
            .returning(|_, _| Ok(dec!(5)));

        let total = convert_to_base(&balances, "ZUSD", &source).await;
        assert_eq!(total, dec!(70));
    }

    #[tokio::test]
    async fn test_failed_lookup_not_retried_within_pass() {
        let balances = classified(&[("DOT.B", dec!(10)), ("DOT.S", dec!(4))]);

        let mut source = MockPriceSource::new();
        source
            .expect_last_trade_price()
            .with(eq("DOT"), eq("USD"))
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("timeout")));

        let total = convert_to_base(&balances, "ZUSD", &source).await;
        assert_eq!(total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_empty_classification_is_zero() {
        let balances = classified(&[]);
        let source = MockPriceSource::new();

        let total = convert_to_base(&balances, "ZUSD", &source).await;
        assert_eq!(total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_auto_earn_contributes_zero_regardless_of_amount() {
        let balances = classified(&[("XBT.F", dec!(999999))]);
        let mut source = MockPriceSource::new();
        source.expect_last_trade_price().times(0);

        let total = convert_to_base(&balances, "ZUSD", &source).await;
        assert_eq!(total, Decimal::ZERO);
    }
}
