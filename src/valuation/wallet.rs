//! Suffix-based wallet classification.
//!
//! Kraken tags non-primary wallet balances with a two-character suffix
//! on the asset code:
//! - `.B` — yield-bearing Earn products
//! - `.S` — staked balances
//! - `.M` — opt-in rewards
//! - `.F` — Auto Earn (Kraken Rewards)
//!
//! Auto Earn is hard-excluded from every downstream valuation regardless
//! of amount; the other buckets are included. Codes without a recognized
//! suffix, and non-positive amounts, are dropped silently.

use rust_decimal::Decimal;

use crate::types::RawBalance;

/// Wallet category derived from an asset code suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletBucket {
    YieldBearing,
    Staked,
    RewardsOptIn,
    AutoEarn,
}

impl WalletBucket {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            ".B" => Some(Self::YieldBearing),
            ".S" => Some(Self::Staked),
            ".M" => Some(Self::RewardsOptIn),
            ".F" => Some(Self::AutoEarn),
            _ => None,
        }
    }

    /// Whether balances in this bucket count toward the wallet total.
    /// Auto Earn never does, regardless of configuration.
    pub fn included(self) -> bool {
        !matches!(self, Self::AutoEarn)
    }
}

/// One classified balance entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedAsset {
    /// Original code with suffix, e.g. "DOT.B".
    pub code: String,
    /// Asset identity with the suffix stripped, e.g. "DOT".
    pub underlying: String,
    pub bucket: WalletBucket,
    pub amount: Decimal,
}

/// Raw balances partitioned into wallet buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedBalance {
    entries: Vec<ClassifiedAsset>,
}

impl ClassifiedBalance {
    /// Entries that count toward the valuation (everything but Auto Earn).
    pub fn included(&self) -> impl Iterator<Item = &ClassifiedAsset> {
        self.entries.iter().filter(|e| e.bucket.included())
    }

    /// All classified entries, excluded buckets included.
    pub fn entries(&self) -> &[ClassifiedAsset] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Partition raw balances by wallet-type suffix.
///
/// Input is not mutated; the returned classification owns its data.
pub fn classify(balances: &RawBalance) -> ClassifiedBalance {
    let mut entries = Vec::new();

    for (code, amount) in balances {
        if *amount <= Decimal::ZERO {
            continue;
        }
        let Some((underlying, suffix)) = split_suffix(code) else {
            continue;
        };
        let Some(bucket) = WalletBucket::from_suffix(suffix) else {
            continue;
        };
        entries.push(ClassifiedAsset {
            code: code.clone(),
            underlying: underlying.to_string(),
            bucket,
            amount: *amount,
        });
    }

    ClassifiedBalance { entries }
}

/// Split `"DOT.B"` into `("DOT", ".B")`. Codes shorter than the suffix
/// or without a trailing `.X` form yield None.
fn split_suffix(code: &str) -> Option<(&str, &str)> {
    if code.len() < 3 || !code.is_ascii() {
        return None;
    }
    let (underlying, suffix) = code.split_at(code.len() - 2);
    if suffix.starts_with('.') && !underlying.is_empty() {
        Some((underlying, suffix))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balances(pairs: &[(&str, Decimal)]) -> RawBalance {
        pairs.iter().map(|(c, a)| (c.to_string(), *a)).collect()
    }

    #[test]
    fn test_classifies_recognized_suffixes() {
        let raw = balances(&[
            ("DOT.B", dec!(10)),
            ("ETH.S", dec!(2)),
            ("SOL.M", dec!(5)),
        ]);
        let classified = classify(&raw);

        let buckets: Vec<_> = classified.entries().iter().map(|e| e.bucket).collect();
        assert!(buckets.contains(&WalletBucket::YieldBearing));
        assert!(buckets.contains(&WalletBucket::Staked));
        assert!(buckets.contains(&WalletBucket::RewardsOptIn));
        assert_eq!(classified.included().count(), 3);
    }

    #[test]
    fn test_auto_earn_never_included() {
        let raw = balances(&[("XBT.F", dec!(1000000))]);
        let classified = classify(&raw);

        assert!(classified.included().next().is_none());
    }

    #[test]
    fn test_strips_suffix_to_underlying() {
        let raw = balances(&[("DOT.B", dec!(10))]);
        let classified = classify(&raw);
        let entry = classified.included().next().unwrap();

        assert_eq!(entry.underlying, "DOT");
        assert_eq!(entry.code, "DOT.B");
    }

    #[test]
    fn test_drops_unrecognized_and_suffixless_codes() {
        let raw = balances(&[
            ("ZUSD", dec!(100)),
            ("XXBT", dec!(1)),
            ("DOT.X", dec!(10)),
        ]);
        let classified = classify(&raw);

        assert!(classified.is_empty());
    }

    #[test]
    fn test_drops_non_positive_amounts() {
        let raw = balances(&[
            ("DOT.B", dec!(0)),
            ("ETH.S", dec!(-3)),
            ("SOL.M", dec!(1)),
        ]);
        let classified = classify(&raw);

        assert_eq!(classified.included().count(), 1);
        assert_eq!(classified.included().next().unwrap().underlying, "SOL");
    }

    #[test]
    fn test_input_not_mutated() {
        let raw = balances(&[("DOT.B", dec!(10)), ("XBT.F", dec!(1))]);
        let before = raw.clone();
        let _ = classify(&raw);
        assert_eq!(raw, before);
    }
}
