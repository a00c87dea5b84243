//! Core domain types shared across the crate.
//!
//! Everything here is cycle-local: snapshots, balances, and rows are
//! rebuilt from scratch on every update pass and discarded after the
//! sheet write. Nothing persists between cycles.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Account snapshots
// ---------------------------------------------------------------------------

/// A normalized view of one brokerage account, produced per cycle.
///
/// `currency` and the supplemental value's currency may differ; both are
/// carried through to the output rows unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    /// Broker identifier, e.g. "Alpaca".
    pub name: &'static str,
    /// Denomination of `account_value` / `available_funds`.
    pub currency: String,
    /// Total equity / net asset value (broker-defined semantics).
    pub account_value: Decimal,
    /// Usable / withdrawable / margin-available amount.
    pub available_funds: Decimal,
    /// Secondary valuation (Earn/staked wallet), if any.
    pub supplemental: Option<SupplementalValue>,
}

/// A secondary balance reported alongside the primary account value,
/// e.g. the total of staked and yield-bearing funds.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplementalValue {
    pub currency: String,
    pub value: Decimal,
}

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// Raw per-asset balances as reported by a broker: asset code → amount.
///
/// Amounts may be zero or negative as reported; only positive amounts are
/// valuation-eligible. BTreeMap keeps iteration deterministic.
pub type RawBalance = BTreeMap<String, Decimal>;

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

/// One sheet row: label, value, and the per-cycle timestamp.
///
/// Rows have no identity beyond their position in the block; the full
/// block is rebuilt every cycle, never diffed against prior state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub value: String,
    pub updated_at: String,
}

impl Row {
    pub fn new(label: String, value: Decimal, updated_at: &str) -> Self {
        Self {
            label,
            value: value.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    /// Flatten into the 3-cell form the sheet writer expects
    /// (column A: label, B: value, C: updated_at).
    pub fn into_cells(self) -> Vec<String> {
        vec![self.label, self.value, self.updated_at]
    }
}
