//! Data models for the evaluation pipeline.
//!
//! This module contains the wire types returned by the evaluation
//! service and the aggregated scorecard written back to the worklist.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The four FAIR assessment categories.
///
/// Derived from the single-letter code embedded in a metric identifier
/// (e.g. `FsF-F1-01D` is a Findable metric).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FairCategory {
    Findable,
    Accessible,
    Interoperable,
    Reusable,
}

/// Namespace prefix shared by all metric identifiers.
pub const METRIC_NAMESPACE: &str = "FsF-";

impl FairCategory {
    /// Determine the category from a metric identifier.
    ///
    /// Returns `None` for identifiers outside the namespace or with an
    /// unrecognized category letter; such metrics contribute to no
    /// sub-score.
    pub fn from_metric_identifier(metric_identifier: &str) -> Option<Self> {
        let rest = metric_identifier.strip_prefix(METRIC_NAMESPACE)?;
        match rest.chars().next()? {
            'F' => Some(FairCategory::Findable),
            'A' => Some(FairCategory::Accessible),
            'I' => Some(FairCategory::Interoperable),
            'R' => Some(FairCategory::Reusable),
            _ => None,
        }
    }
}

impl fmt::Display for FairCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FairCategory::Findable => write!(f, "Findable"),
            FairCategory::Accessible => write!(f, "Accessible"),
            FairCategory::Interoperable => write!(f, "Interoperable"),
            FairCategory::Reusable => write!(f, "Reusable"),
        }
    }
}

/// Processing status of one worklist row.
///
/// The status cell is the row's lifecycle marker: blank means the row
/// has never been picked up (or was reset by a human), and only blank
/// rows are eligible for submission. `Analyzing`, `Error` and `Ready`
/// all keep the row out of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Ready,
    Analyzing,
    Error,
    /// Empty or unrecognized cell text.
    Unset,
}

impl RowStatus {
    /// Parse the status cell text. Anything that is not one of the
    /// three named states counts as `Unset` (and thus eligible).
    pub fn parse(text: &str) -> Self {
        match text {
            "Ready" => RowStatus::Ready,
            "Analyzing" => RowStatus::Analyzing,
            "Error" => RowStatus::Error,
            _ => RowStatus::Unset,
        }
    }

    /// Whether a row in this state may be submitted for evaluation.
    pub fn is_eligible(self) -> bool {
        matches!(self, RowStatus::Unset)
    }

    /// Cell text written for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            RowStatus::Ready => "Ready",
            RowStatus::Analyzing => "Analyzing",
            RowStatus::Error => "Error",
            RowStatus::Unset => "",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pass/fail outcome of one metric test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    /// Any other status text; scored as a failure.
    #[serde(other)]
    Unknown,
}

impl TestStatus {
    pub fn passed(self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

/// Points earned vs. possible for one metric.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MetricScore {
    pub earned: f64,
    pub total: f64,
}

/// One independently scored test within an evaluation report.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricResult {
    pub metric_identifier: String,
    pub score: MetricScore,
    pub test_status: TestStatus,
    /// Metric-specific output fields; the PID-resolution metric carries
    /// `pid` and `pid_scheme` here.
    #[serde(default)]
    pub output: serde_json::Map<String, Value>,
    /// Free-text diagnostic lines emitted while the test ran.
    #[serde(default)]
    pub test_debug: Vec<String>,
}

impl MetricResult {
    /// Non-empty string value of an `output` field, if present.
    pub fn output_str(&self, key: &str) -> Option<&str> {
        self.output
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Echo of the submitted evaluation request.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEcho {
    pub object_identifier: String,
}

/// The raw structured result from the evaluation service.
///
/// Missing required fields fail deserialization and surface as
/// `MalformedReport` at the client boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationReport {
    pub request: RequestEcho,
    pub results: Vec<MetricResult>,
}

/// Earned/possible points for one category (or the overall total),
/// with the percentage precomputed and guarded against empty
/// categories.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubScore {
    pub earned: f64,
    pub possible: f64,
    /// `round(earned / possible * 100, 2)`, or `None` when the
    /// category contributed no points ("not applicable").
    pub percent: Option<f64>,
}

impl SubScore {
    pub fn new(earned: f64, possible: f64) -> Self {
        let percent = if possible > 0.0 {
            Some((earned / possible * 100.0 * 100.0).round() / 100.0)
        } else {
            None
        };
        Self {
            earned,
            possible,
            percent,
        }
    }

    /// Cell text for the percentage: `"88.46%"`, or `"N/A"` for an
    /// empty category.
    pub fn percent_display(&self) -> String {
        match self.percent {
            Some(p) => format!("{:.2}%", p),
            None => "N/A".to_string(),
        }
    }
}

/// Persistent-identifier metadata extracted from the PID-resolution
/// metric.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PidSummary {
    /// The PID with its scheme's canonical resolver prefix stripped.
    pub value: Option<String>,
    /// Normalized scheme token (e.g. `doi`).
    pub scheme: Option<String>,
    /// Whether the scheme is one of the known resolver schemes.
    pub known: bool,
}

impl PidSummary {
    /// Annotation for the extracted PID value.
    pub fn pid_note(&self) -> String {
        match &self.value {
            Some(v) => format!("(PID extracted): {}", v),
            None => "PID not extracted".to_string(),
        }
    }

    /// Annotation for the PID scheme; unknown schemes get a warning
    /// marker so they stand out in the sheet.
    pub fn pid_type_note(&self) -> String {
        match &self.scheme {
            Some(s) if self.known => format!("(PID type): {}", s),
            Some(s) => format!("(PID type): WARNING! {}", s),
            None => "No PID type".to_string(),
        }
    }
}

/// The aggregated, per-dataset evaluation summary written back to the
/// worklist.
#[derive(Debug, Clone, Serialize)]
pub struct Scorecard {
    /// Identifier echoed back by the evaluation service.
    pub dataset_identifier: String,
    pub findable: SubScore,
    pub accessible: SubScore,
    pub interoperable: SubScore,
    pub reusable: SubScore,
    /// Pass/fail bits for every categorized metric, concatenated in
    /// F, A, I, R order.
    pub result_string: String,
    pub total: SubScore,
    /// Deduplicated success annotations, first-seen order.
    pub success_notes: Vec<String>,
    /// URLs observed while the PID-resolution metric retrieved pages.
    pub resolved_urls: Vec<String>,
    /// Last HTTP status code observed during identifier resolution.
    pub resolution_status: Option<u16>,
    pub pid: PidSummary,
}

impl Scorecard {
    /// The annotation cell content: success notes followed by the PID
    /// notes, comma-joined.
    pub fn annotation(&self) -> String {
        let mut parts = self.success_notes.clone();
        parts.push(self.pid.pid_note());
        parts.push(self.pid.pid_type_note());
        parts.join(", ")
    }

    /// The points cell content, `"(earned:possible)"` with integral
    /// values rendered without a decimal point.
    pub fn points_display(&self) -> String {
        format!(
            "({}:{})",
            format_points(self.total.earned),
            format_points(self.total.possible)
        )
    }
}

/// Render a point count the way the sheet expects: `5` rather than
/// `5.0`, but `5.5` kept as-is.
pub fn format_points(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
