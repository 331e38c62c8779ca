//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `fairsweep.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Worklist store settings.
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Evaluation service settings.
    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    /// Polling settings.
    #[serde(default)]
    pub poll: PollConfig,
}

/// Worklist store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Base URL of the spreadsheet values API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Spreadsheet identifier.
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Worksheet (tab) holding the worklist.
    #[serde(default = "default_worksheet")]
    pub worksheet: String,

    /// File holding the API bearer token.
    #[serde(default = "default_token_file")]
    pub token_file: String,

    /// First data row of the scan window (row 1 is the header).
    #[serde(default = "default_first_row")]
    pub first_row: u32,

    /// Last row of the scan window.
    #[serde(default = "default_last_row")]
    pub last_row: u32,

    /// Column assignment.
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Control cells.
    #[serde(default)]
    pub control: ControlConfig,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            spreadsheet_id: String::new(),
            worksheet: default_worksheet(),
            token_file: default_token_file(),
            first_row: default_first_row(),
            last_row: default_last_row(),
            columns: ColumnsConfig::default(),
            control: ControlConfig::default(),
        }
    }
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".to_string()
}

fn default_worksheet() -> String {
    "EVAL".to_string()
}

fn default_token_file() -> String {
    "sheet-token.txt".to_string()
}

fn default_first_row() -> u32 {
    2
}

fn default_last_row() -> u32 {
    4000
}

/// Column letters for every field written or read per row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    /// Dataset identifier (worklist input).
    #[serde(default = "col_b")]
    pub identifier: String,

    /// Identifier-resolution diagnostic (status code or N/A).
    #[serde(default = "col_c")]
    pub resolution: String,

    /// Pass/fail bitstring.
    #[serde(default = "col_d")]
    pub result_string: String,

    #[serde(default = "col_e")]
    pub findable: String,

    #[serde(default = "col_f")]
    pub accessible: String,

    #[serde(default = "col_g")]
    pub interoperable: String,

    #[serde(default = "col_h")]
    pub reusable: String,

    /// Total percentage; a non-empty cell here marks the row done.
    #[serde(default = "col_i")]
    pub total: String,

    /// `(earned:possible)` points summary.
    #[serde(default = "col_j")]
    pub points: String,

    /// Row lifecycle status.
    #[serde(default = "col_k")]
    pub status: String,

    /// Processing start timestamp.
    #[serde(default = "col_l")]
    pub started: String,

    /// Processing finish timestamp.
    #[serde(default = "col_m")]
    pub finished: String,

    /// Elapsed processing duration.
    #[serde(default = "col_n")]
    pub duration: String,

    /// Failure description for rows marked Error.
    #[serde(default = "col_p")]
    pub error: String,

    /// Success annotations plus PID notes.
    #[serde(default = "col_z")]
    pub annotations: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            identifier: col_b(),
            resolution: col_c(),
            result_string: col_d(),
            findable: col_e(),
            accessible: col_f(),
            interoperable: col_g(),
            reusable: col_h(),
            total: col_i(),
            points: col_j(),
            status: col_k(),
            started: col_l(),
            finished: col_m(),
            duration: col_n(),
            error: col_p(),
            annotations: col_z(),
        }
    }
}

fn col_b() -> String {
    "B".to_string()
}
fn col_c() -> String {
    "C".to_string()
}
fn col_d() -> String {
    "D".to_string()
}
fn col_e() -> String {
    "E".to_string()
}
fn col_f() -> String {
    "F".to_string()
}
fn col_g() -> String {
    "G".to_string()
}
fn col_h() -> String {
    "H".to_string()
}
fn col_i() -> String {
    "I".to_string()
}
fn col_j() -> String {
    "J".to_string()
}
fn col_k() -> String {
    "K".to_string()
}
fn col_l() -> String {
    "L".to_string()
}
fn col_m() -> String {
    "M".to_string()
}
fn col_n() -> String {
    "N".to_string()
}
fn col_p() -> String {
    "P".to_string()
}
fn col_z() -> String {
    "Z".to_string()
}

/// Control cells read from the sheet while scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Cell holding the run/stop toggle.
    #[serde(default = "default_run_cell")]
    pub run_cell: String,

    /// Exact text that means "keep running".
    #[serde(default = "default_run_sentinel")]
    pub run_sentinel: String,

    /// Cell holding the datacite-usage flag (`true`/`false`).
    #[serde(default = "default_datacite_cell")]
    pub datacite_cell: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            run_cell: default_run_cell(),
            run_sentinel: default_run_sentinel(),
            datacite_cell: default_datacite_cell(),
        }
    }
}

fn default_run_cell() -> String {
    "O1".to_string()
}

fn default_run_sentinel() -> String {
    "Run script".to_string()
}

fn default_datacite_cell() -> String {
    "O2".to_string()
}

/// Evaluation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Evaluation endpoint URL.
    #[serde(default = "default_evaluator_url")]
    pub url: String,

    /// Basic auth username.
    #[serde(default)]
    pub username: String,

    /// Basic auth password.
    #[serde(default)]
    pub password: String,

    /// Hard upper bound on one evaluation call, in seconds.
    #[serde(default = "default_evaluator_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            url: default_evaluator_url(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: default_evaluator_timeout(),
        }
    }
}

fn default_evaluator_url() -> String {
    "http://localhost:1071/fuji/api/v1/evaluate".to_string()
}

fn default_evaluator_timeout() -> u64 {
    300
}

/// Polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between scan cycles (also the retry delay after a
    /// failed cycle).
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    60
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new("fairsweep.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings; only
    /// explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(interval) = args.interval {
            self.poll.interval_seconds = interval;
        }
    }

    /// Range covering the identifier column over the scan window.
    pub fn identifier_range(&self) -> String {
        self.column_range(&self.sheet.columns.identifier)
    }

    /// Range covering the "row already done" marker column.
    pub fn result_range(&self) -> String {
        self.column_range(&self.sheet.columns.total)
    }

    fn column_range(&self, column: &str) -> String {
        format!(
            "{}{}:{}{}",
            column, self.sheet.first_row, column, self.sheet.last_row
        )
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
