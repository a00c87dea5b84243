//! Spreadsheet output.
//!
//! The orchestrator only knows the `SheetWriter` trait; the Google
//! Sheets implementation is a thin wrapper around the values.update
//! call. Auth is out-of-band: the writer is handed a ready bearer token.

pub mod google;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over the spreadsheet backend.
#[async_trait]
pub trait SheetWriter: Send + Sync {
    /// Overwrite exactly the addressed rectangle (e.g. `"A5:C9"`,
    /// 1-based, inclusive) with the value block. Cells outside the
    /// rectangle are left untouched. The destination interprets value
    /// types (numeric strings become numbers).
    async fn write_range(&self, range: &str, values: Vec<Vec<String>>) -> Result<()>;
}
