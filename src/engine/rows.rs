//! Row building: snapshots → ordered label/value/timestamp triples.
//!
//! Layout contract: column A = label, column B = value, column C = the
//! single per-cycle timestamp. Absent snapshots produce zero rows and
//! reserve no space.

use crate::types::{AccountSnapshot, Row};

/// Flatten snapshots into sheet rows.
///
/// Snapshots are processed in input order. Each present snapshot emits
/// an account-value row, an available-funds row, and — only when
/// present — a supplemental-value row. Every row carries the same
/// timestamp string, captured once per cycle.
pub fn build_rows(snapshots: &[Option<AccountSnapshot>], timestamp: &str) -> Vec<Row> {
    let mut rows = Vec::new();

    for snap in snapshots.iter().flatten() {
        rows.push(Row::new(
            format!("{}: Account Value ({})", snap.name, snap.currency),
            snap.account_value,
            timestamp,
        ));
        rows.push(Row::new(
            format!("{}: Available Funds ({})", snap.name, snap.currency),
            snap.available_funds,
            timestamp,
        ));

        if let Some(supp) = &snap.supplemental {
            rows.push(Row::new(
                format!("{}: Earn Wallet Value ({})", snap.name, supp.currency),
                supp.value,
                timestamp,
            ));
        }
    }

    rows
}
