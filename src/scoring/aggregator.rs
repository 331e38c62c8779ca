//! Reduction of an evaluation report into a scorecard.
//!
//! Walks the report's metric results once, accumulating per-category
//! points and pass/fail bits, collecting deduplicated success
//! annotations, and pulling PID metadata and resolution diagnostics
//! out of the PID-resolution metric.

use crate::models::{
    EvaluationReport, FairCategory, MetricResult, PidSummary, Scorecard, SubScore,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// The metric responsible for persistent-identifier resolution.
pub const PID_METRIC: &str = "FsF-F1-02D";

/// Canonical resolver URL prefix for each known PID scheme.
fn resolver_prefix(scheme: &str) -> Option<&'static str> {
    match scheme {
        "doi" => Some("http://doi.org/"),
        "handle" => Some("http://hdl.handle.net/"),
        "urn" => Some("http://nbn-resolving.org/"),
        _ => None,
    }
}

/// Matches scheme-qualified URLs, `www.`-prefixed hosts and bare
/// `domain.tld/` forms inside free-text debug lines.
fn url_pattern() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\b(?:https?://|www\d{0,3}[.]|[a-z0-9.\-]+[.][a-z]{2,4}/)[^\s()<>]*[^\s`!()\[\]{};:'".,<>?«»“”‘’]"#,
        )
        .expect("URL pattern must compile")
    })
}

fn digits_pattern() -> &'static Regex {
    static DIGITS_RE: OnceLock<Regex> = OnceLock::new();
    DIGITS_RE.get_or_init(|| Regex::new(r"\d+").expect("digits pattern must compile"))
}

/// Running totals for one FAIR category.
#[derive(Default)]
struct CategoryTally {
    earned: f64,
    possible: f64,
    bits: String,
}

impl CategoryTally {
    fn add(&mut self, result: &MetricResult) {
        self.earned += result.score.earned;
        self.possible += result.score.total;
        self.bits
            .push(if result.test_status.passed() { '1' } else { '0' });
    }

    fn sub_score(&self) -> SubScore {
        SubScore::new(self.earned, self.possible)
    }
}

/// Reduce one evaluation report into a scorecard.
///
/// Total function over a well-formed report: empty categories come out
/// as "not applicable" sub-scores rather than failing, and a missing
/// PID yields the sentinel notes from [`PidSummary`].
pub fn aggregate(report: &EvaluationReport) -> Scorecard {
    let mut findable = CategoryTally::default();
    let mut accessible = CategoryTally::default();
    let mut interoperable = CategoryTally::default();
    let mut reusable = CategoryTally::default();

    let mut success_notes: Vec<String> = Vec::new();
    let mut resolved_urls: Vec<String> = Vec::new();
    let mut resolution_status: Option<u16> = None;
    let mut pid = PidSummary::default();
    let mut total_tests = 0usize;

    for result in &report.results {
        total_tests += 1;

        if result.metric_identifier == PID_METRIC {
            extract_pid_metadata(result, &mut pid, &mut resolved_urls, &mut resolution_status);
        }

        match FairCategory::from_metric_identifier(&result.metric_identifier) {
            Some(FairCategory::Findable) => findable.add(result),
            Some(FairCategory::Accessible) => accessible.add(result),
            Some(FairCategory::Interoperable) => interoperable.add(result),
            Some(FairCategory::Reusable) => reusable.add(result),
            // Counted toward total_tests only
            None => {}
        }

        for line in &result.test_debug {
            if let Some(message) = strip_success_marker(line) {
                let note = format!("({}) {}", result.metric_identifier, message);
                if !success_notes.contains(&note) {
                    success_notes.push(note);
                }
            }
        }
    }

    debug!(
        total_tests,
        dataset = %report.request.object_identifier,
        "aggregated evaluation report"
    );

    let result_string = format!(
        "{}{}{}{}",
        findable.bits, accessible.bits, interoperable.bits, reusable.bits
    );
    let total = SubScore::new(
        findable.earned + accessible.earned + interoperable.earned + reusable.earned,
        findable.possible + accessible.possible + interoperable.possible + reusable.possible,
    );

    Scorecard {
        dataset_identifier: report.request.object_identifier.clone(),
        findable: findable.sub_score(),
        accessible: accessible.sub_score(),
        interoperable: interoperable.sub_score(),
        reusable: reusable.sub_score(),
        result_string,
        total,
        success_notes,
        resolved_urls,
        resolution_status,
        pid,
    }
}

/// Pull PID scheme/value and resolution diagnostics out of the
/// PID-resolution metric.
fn extract_pid_metadata(
    result: &MetricResult,
    pid: &mut PidSummary,
    resolved_urls: &mut Vec<String>,
    resolution_status: &mut Option<u16>,
) {
    if let Some(raw_scheme) = result.output_str("pid_scheme") {
        let scheme = normalize_scheme(raw_scheme);
        if !scheme.is_empty() {
            pid.known = resolver_prefix(&scheme).is_some();
            pid.scheme = Some(scheme);
        }
    }

    if let Some(raw_pid) = result.output_str("pid") {
        let value = pid
            .scheme
            .as_deref()
            .and_then(resolver_prefix)
            .map(|prefix| strip_resolver_prefix(raw_pid, prefix))
            .unwrap_or(raw_pid);
        pid.value = Some(value.to_string());
    }

    for line in &result.test_debug {
        if line.contains("Retrieving page") {
            for m in url_pattern().find_iter(line) {
                resolved_urls.push(m.as_str().to_string());
            }
        }
        if line.contains("status code") {
            // Last observed status wins
            if let Some(code) = digits_pattern()
                .find(line)
                .and_then(|m| m.as_str().parse::<u16>().ok())
            {
                *resolution_status = Some(code);
            }
        }
    }
}

/// Normalize a raw `pid_scheme` token. The service sometimes wraps the
/// scheme in a list literal (`"['doi', 'url']"`); take the first
/// element, drop quoting, lowercase.
fn normalize_scheme(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .to_lowercase()
}

/// Strip the scheme's canonical resolver prefix (either `http` or
/// `https` form) from a PID for display.
fn strip_resolver_prefix<'a>(value: &'a str, prefix: &str) -> &'a str {
    if let Some(rest) = value.strip_prefix(prefix) {
        return rest;
    }
    if let Some(secure) = prefix.strip_prefix("http://") {
        if let Some(rest) = value
            .strip_prefix("https://")
            .and_then(|v| v.strip_prefix(secure))
        {
            return rest;
        }
    }
    value
}

/// If the line carries a `SUCCESS` marker, return the message after it
/// with the marker and its separator removed.
fn strip_success_marker(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once("SUCCESS")?;
    Some(rest.trim_start_matches(|c| c == ':' || c == ' '))
}
