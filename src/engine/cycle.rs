//! Update orchestration — one fetch→normalize→write pass.
//!
//! Adapters run sequentially in a fixed order; a broker that is not
//! configured or whose call fails contributes no rows but never aborts
//! the cycle. Only a writer failure is cycle-fatal, and even that only
//! skips to the next scheduled tick.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use super::rows::build_rows;
use crate::brokers::BrokerAdapter;
use crate::sheet::SheetWriter;
use crate::types::Row;

/// First data row on the sheet. Rows 1–4 (headers and spacing) and
/// columns D+ are never written.
const FIRST_ROW: usize = 5;

/// One broker position in the output. The slot keeps its place in the
/// row order whether or not the broker is configured.
pub struct BrokerSlot {
    name: &'static str,
    adapter: Option<Box<dyn BrokerAdapter>>,
}

impl BrokerSlot {
    pub fn configured(adapter: Box<dyn BrokerAdapter>) -> Self {
        Self {
            name: adapter.name(),
            adapter: Some(adapter),
        }
    }

    pub fn not_configured(name: &'static str) -> Self {
        Self {
            name,
            adapter: None,
        }
    }
}

/// Summary of one complete update cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub rows_written: usize,
    /// Rectangle handed to the writer, e.g. "A5:C11". None if the
    /// write was skipped.
    pub range: Option<String>,
    pub brokers_present: usize,
    pub brokers_failed: usize,
    pub brokers_skipped: usize,
    pub timestamp: String,
}

/// Sequences adapters → row builder → sheet writer.
pub struct Orchestrator {
    slots: Vec<BrokerSlot>,
    writer: Box<dyn SheetWriter>,
    timezone: chrono_tz::Tz,
}

impl Orchestrator {
    pub fn new(
        slots: Vec<BrokerSlot>,
        writer: Box<dyn SheetWriter>,
        timezone: chrono_tz::Tz,
    ) -> Self {
        Self {
            slots,
            writer,
            timezone,
        }
    }

    /// The per-cycle timestamp, captured once and shared by every row.
    fn cycle_timestamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.timezone)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string()
    }

    /// Run a single update cycle.
    ///
    /// Returns Err only when the sheet write fails; adapter problems are
    /// absorbed into the report.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let timestamp = self.cycle_timestamp();

        let mut snapshots = Vec::with_capacity(self.slots.len());
        let mut failed = 0usize;
        let mut skipped = 0usize;

        for slot in &self.slots {
            match &slot.adapter {
                None => {
                    info!(broker = slot.name, "Broker not configured; skipping");
                    skipped += 1;
                    snapshots.push(None);
                }
                Some(adapter) => match adapter.fetch_snapshot().await {
                    Ok(snap) => {
                        info!(
                            broker = slot.name,
                            currency = %snap.currency,
                            account_value = %snap.account_value,
                            available_funds = %snap.available_funds,
                            supplemental = ?snap.supplemental.as_ref().map(|s| s.value),
                            "Snapshot fetched"
                        );
                        snapshots.push(Some(snap));
                    }
                    Err(e) => {
                        error!(
                            broker = slot.name,
                            error = %e,
                            "Broker snapshot failed; omitting its rows this cycle"
                        );
                        failed += 1;
                        snapshots.push(None);
                    }
                },
            }
        }

        let brokers_present = snapshots.iter().flatten().count();
        let rows = build_rows(&snapshots, &timestamp);

        if rows.is_empty() {
            warn!("No rows to write (no brokers configured or all failed)");
            return Ok(CycleReport {
                rows_written: 0,
                range: None,
                brokers_present,
                brokers_failed: failed,
                brokers_skipped: skipped,
                timestamp,
            });
        }

        let range = range_for(rows.len());
        info!(range = %range, rows = rows.len(), "Updating sheet range");

        let rows_written = rows.len();
        let values: Vec<Vec<String>> = rows.into_iter().map(Row::into_cells).collect();

        self.writer
            .write_range(&range, values)
            .await
            .context("Sheet write failed")?;

        Ok(CycleReport {
            rows_written,
            range: Some(range),
            brokers_present,
            brokers_failed: failed,
            brokers_skipped: skipped,
            timestamp,
        })
    }
}

/// Rectangle for a row block: columns A–C, starting at `FIRST_ROW`,
/// inclusive end.
fn range_for(row_count: usize) -> String {
    format!("A{FIRST_ROW}:C{}", FIRST_ROW + row_count - 1)
}

/// Log a human-readable cycle summary.
pub fn log_cycle_report(report: &CycleReport) {
    info!(
        rows = report.rows_written,
        range = report.range.as_deref().unwrap_or("-"),
        present = report.brokers_present,
        failed = report.brokers_failed,
        skipped = report.brokers_skipped,
        timestamp = %report.timestamp,
        "Cycle complete"
    );
}
