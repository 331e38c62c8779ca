//! REST client for the spreadsheet values API.
//!
//! Speaks the Google-Sheets-style values surface: formatted range
//! reads via GET, raw single-cell writes via PUT, bearer-token auth.

use super::SheetSession;
use crate::config::SheetConfig;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Environment fallback for the API token when the token file is
/// absent.
pub const TOKEN_ENV: &str = "FAIRSWEEP_SHEET_TOKEN";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Factory for sheet sessions against the remote store.
pub struct RestSheetStore {
    api_base: String,
    spreadsheet_id: String,
    worksheet: String,
    token_file: String,
}

impl RestSheetStore {
    pub fn new(cfg: &SheetConfig) -> Self {
        Self {
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            worksheet: cfg.worksheet.clone(),
            token_file: cfg.token_file.clone(),
        }
    }

    /// Open a session with fresh credentials.
    ///
    /// Reads the bearer token from the configured token file, falling
    /// back to the `FAIRSWEEP_SHEET_TOKEN` environment variable. Called
    /// once per cycle so a rotated token is picked up on the next scan.
    pub fn open_session(&self) -> Result<RestSheetSession> {
        let token = self.load_token()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for the sheet store")?;

        Ok(RestSheetSession {
            client,
            values_base: format!("{}/{}/values", self.api_base, self.spreadsheet_id),
            worksheet: self.worksheet.clone(),
            token,
        })
    }

    fn load_token(&self) -> Result<String> {
        match std::fs::read_to_string(&self.token_file) {
            Ok(content) => {
                let token = content.trim().to_string();
                if token.is_empty() {
                    bail!("Token file is empty: {}", self.token_file);
                }
                Ok(token)
            }
            Err(_) => std::env::var(TOKEN_ENV).with_context(|| {
                format!(
                    "No sheet token: cannot read {} and {} is not set",
                    self.token_file, TOKEN_ENV
                )
            }),
        }
    }
}

/// Response body of a range read. A fully blank range has no `values`
/// member at all.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// One authenticated session against the values API.
pub struct RestSheetSession {
    client: reqwest::Client,
    values_base: String,
    worksheet: String,
    token: String,
}

impl RestSheetSession {
    fn range_url(&self, range: &str) -> String {
        format!("{}/{}!{}", self.values_base, self.worksheet, range)
    }
}

impl SheetSession for RestSheetSession {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.range_url(range);
        debug!(%url, "reading range");

        let response = self
            .client
            .get(&url)
            .query(&[("valueRenderOption", "FORMATTED_VALUE")])
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Failed to read range {range}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Sheet store returned HTTP {status} reading {range}: {body}");
        }

        let value_range: ValueRange = response
            .json()
            .await
            .with_context(|| format!("Invalid response body reading {range}"))?;
        Ok(value_range.values)
    }

    async fn read_cell(&self, addr: &str) -> Result<String> {
        let rows = self.read_range(addr).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.concat())
            .unwrap_or_default())
    }

    async fn write_cell(&self, addr: &str, value: &str) -> Result<()> {
        let url = self.range_url(addr);
        debug!(%url, %value, "writing cell");

        let response = self
            .client
            .put(&url)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.token)
            .json(&json!({ "values": [[value]] }))
            .send()
            .await
            .with_context(|| format!("Failed to write cell {addr}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Sheet store returned HTTP {status} writing {addr}: {body}");
        }
        Ok(())
    }
}
