//! Google Sheets values.update writer.
//!
//! API docs: https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values/update
//! `valueInputOption=USER_ENTERED` so the sheet parses numeric strings
//! into numbers instead of storing literal text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use super::SheetWriter;
use crate::config::SheetConfig;

const BASE_URL: &str = "https://sheets.googleapis.com";

/// Writes row blocks into one worksheet of one spreadsheet.
pub struct GoogleSheetsWriter {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    worksheet: String,
    token: SecretString,
}

impl GoogleSheetsWriter {
    pub fn new(cfg: &SheetConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("sheetfolio/0.1.0 (account-dashboard)")
            .build()
            .context("Failed to build HTTP client for Google Sheets")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            worksheet: cfg.worksheet.clone(),
            token: cfg.token.clone(),
        })
    }

    /// Point at a different host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SheetWriter for GoogleSheetsWriter {
    async fn write_range(&self, range: &str, values: Vec<Vec<String>>) -> Result<()> {
        let range_ref = format!("'{}'!{}", self.worksheet, range);
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}?valueInputOption=USER_ENTERED",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(&range_ref),
        );

        debug!(range = %range_ref, rows = values.len(), "Writing sheet range");

        let body = json!({
            "range": range_ref,
            "majorDimension": "ROWS",
            "values": values,
        });

        let resp = self
            .http
            .put(&url)
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Google Sheets request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Google Sheets API error {status}: {body}");
        }

        Ok(())
    }
}
