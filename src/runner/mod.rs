//! The evaluation orchestrator.
//!
//! One cycle scans the worklist, selects eligible rows and processes
//! them strictly one at a time: mark Analyzing, call the evaluator,
//! aggregate, publish, mark Ready. Any per-row failure marks the row
//! Error and the scan continues; only store-level failures abort the
//! cycle. The outer driver repeats cycles on a fixed interval forever,
//! logging and swallowing cycle-level errors, until shutdown.

use crate::config::Config;
use crate::evaluator::{Evaluator, EvaluatorClient};
use crate::models::RowStatus;
use crate::scoring::aggregate;
use crate::sheet::publish::{push_scorecard, StatusWriter};
use crate::sheet::rest::RestSheetStore;
use crate::sheet::{cell, SheetSession};
use crate::worklist::select_candidates;
use anyhow::Result;
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

/// What happened during one scan cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleSummary {
    /// Rows the selector considered eligible.
    pub candidates: usize,
    /// Rows actually submitted to the evaluator.
    pub processed: usize,
    /// Rows whose scorecard was written back.
    pub published: usize,
    /// Rows marked Error.
    pub failed: usize,
    /// Candidates skipped over their current status.
    pub skipped: usize,
    /// Whether the stop signal ended the scan early.
    pub stopped: bool,
}

enum RowOutcome {
    Published,
    /// The identifier cell changed mid-flight; results were discarded
    /// and the row stays Analyzing until a human resets it.
    Discarded,
}

/// Run one scan cycle over the worklist.
///
/// Cycle-level errors (store unreachable, a status write failed) bubble
/// out; the driver logs them and retries after the polling interval.
pub async fn run_cycle<S, E>(
    session: &S,
    evaluator: &E,
    config: &Config,
    stop: &AtomicBool,
) -> Result<CycleSummary>
where
    S: SheetSession,
    E: Evaluator,
{
    let mut summary = CycleSummary::default();
    let control = &config.sheet.control;

    if !run_requested(session, config).await? {
        info!("run control cell not set, cycle skipped");
        summary.stopped = true;
        return Ok(summary);
    }

    let identifiers = session.read_range(&config.identifier_range()).await?;
    let results = session.read_range(&config.result_range()).await?;
    let candidates = select_candidates(&identifiers, &results, config.sheet.first_row);
    summary.candidates = candidates.len();
    info!(candidates = candidates.len(), "worklist scanned");

    let columns = &config.sheet.columns;
    let writer = StatusWriter::new(session, columns);

    for (row, identifier) in candidates {
        // Cooperative stop: checked once per row, never mid-call
        if stop.load(Ordering::Relaxed) || !run_requested(session, config).await? {
            info!("stop requested, ending scan");
            summary.stopped = true;
            break;
        }

        let status = RowStatus::parse(&session.read_cell(&cell(&columns.status, row)).await?);
        if !status.is_eligible() {
            summary.skipped += 1;
            continue;
        }

        let datacite_text = session.read_cell(&control.datacite_cell).await?;
        let use_datacite = datacite_text.eq_ignore_ascii_case("true");

        info!(row, %identifier, use_datacite, "processing");
        let started = Local::now();
        writer.mark_analyzing(row, started).await?;
        summary.processed += 1;

        match process_row(
            session, evaluator, &writer, columns, row, &identifier, use_datacite, started,
        )
        .await
        {
            Ok(RowOutcome::Published) => summary.published += 1,
            Ok(RowOutcome::Discarded) => {
                warn!(row, %identifier, "results discarded, row left in Analyzing");
            }
            Err(e) => {
                error!(row, %identifier, "row failed: {e:#}");
                writer.mark_error(row, &e.to_string()).await?;
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

async fn run_requested<S: SheetSession>(session: &S, config: &Config) -> Result<bool> {
    let control = &config.sheet.control;
    let text = session.read_cell(&control.run_cell).await?;
    Ok(text == control.run_sentinel)
}

#[allow(clippy::too_many_arguments)]
async fn process_row<S, E>(
    session: &S,
    evaluator: &E,
    writer: &StatusWriter<'_, S>,
    columns: &crate::config::ColumnsConfig,
    row: u32,
    identifier: &str,
    use_datacite: bool,
    started: chrono::DateTime<Local>,
) -> Result<RowOutcome>
where
    S: SheetSession,
    E: Evaluator,
{
    let report = evaluator.evaluate(identifier, use_datacite).await?;
    // Duration measures the remote call, not the write-back
    let finished = Local::now();

    let card = aggregate(&report);
    if push_scorecard(session, columns, row, &card).await? {
        writer.mark_ready(row, finished, finished - started).await?;
        Ok(RowOutcome::Published)
    } else {
        Ok(RowOutcome::Discarded)
    }
}

/// The outer fixed-interval driver.
///
/// Each tick opens a fresh store session (credential refresh happens
/// there, once per cycle) and runs one cycle. The loop only ends on
/// the process-level stop flag or, with `once`, after the first cycle.
pub async fn run(config: &Config, stop: &AtomicBool, once: bool) -> Result<()> {
    let store = RestSheetStore::new(&config.sheet);
    let evaluator = EvaluatorClient::new(&config.evaluator)?;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.poll.interval_seconds));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if stop.load(Ordering::Relaxed) {
            info!("shutdown requested, stopping");
            break;
        }

        let outcome = match store.open_session() {
            Ok(session) => run_cycle(&session, &evaluator, config, stop).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(summary) => info!(
                candidates = summary.candidates,
                processed = summary.processed,
                published = summary.published,
                failed = summary.failed,
                skipped = summary.skipped,
                stopped = summary.stopped,
                "cycle complete"
            ),
            // The process never dies on a bad cycle; try again next tick
            Err(e) => error!("cycle failed: {e:#}"),
        }

        if once || stop.load(Ordering::Relaxed) {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluatorError;
    use crate::models::{
        EvaluationReport, MetricResult, MetricScore, RequestEcho, TestStatus,
    };
    use crate::sheet::memory::MemorySheet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Scripted evaluator: records every call, optionally fails for
    /// one identifier, optionally runs a hook before responding.
    #[derive(Default)]
    struct MockEvaluator {
        calls: AtomicUsize,
        datacite_flags: Mutex<Vec<bool>>,
        fail_for: Option<String>,
        #[allow(clippy::type_complexity)]
        on_call: Option<Box<dyn Fn(&str) + Send + Sync>>,
    }

    impl MockEvaluator {
        fn call_count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    impl Evaluator for MockEvaluator {
        async fn evaluate(
            &self,
            identifier: &str,
            use_datacite: bool,
        ) -> Result<EvaluationReport, EvaluatorError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.datacite_flags.lock().unwrap().push(use_datacite);
            if let Some(hook) = &self.on_call {
                hook(identifier);
            }
            if self.fail_for.as_deref() == Some(identifier) {
                return Err(EvaluatorError::Unreachable("connection refused".to_string()));
            }
            Ok(EvaluationReport {
                request: RequestEcho {
                    object_identifier: identifier.to_string(),
                },
                results: vec![MetricResult {
                    metric_identifier: "FsF-F1-01D".to_string(),
                    score: MetricScore {
                        earned: 1.0,
                        total: 1.0,
                    },
                    test_status: TestStatus::Pass,
                    output: serde_json::Map::new(),
                    test_debug: vec!["SUCCESS: Identifier found".to_string()],
                }],
            })
        }
    }

    fn running_sheet() -> MemorySheet {
        let sheet = MemorySheet::new();
        sheet.seed("O1", "Run script");
        sheet
    }

    fn config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn test_stop_sentinel_absent_means_no_work() {
        let sheet = MemorySheet::new();
        sheet.seed("B2", "10.1/a");
        let evaluator = MockEvaluator::default();
        let stop = AtomicBool::new(false);

        let summary = run_cycle(&sheet, &evaluator, &config(), &stop)
            .await
            .unwrap();

        assert!(summary.stopped);
        assert_eq!(summary.candidates, 0);
        assert_eq!(evaluator.call_count(), 0);
        assert_eq!(sheet.write_count(), 0);
    }

    #[tokio::test]
    async fn test_happy_path_publishes_and_marks_ready() {
        let sheet = running_sheet();
        sheet.seed("O2", "True");
        sheet.seed("B2", "10.1/a");
        let evaluator = MockEvaluator::default();
        let stop = AtomicBool::new(false);

        let summary = run_cycle(&sheet, &evaluator, &config(), &stop)
            .await
            .unwrap();

        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.published, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(sheet.value("K2"), "Ready");
        assert_eq!(sheet.value("D2"), "'1");
        assert_eq!(sheet.value("E2"), "100.00%");
        assert_eq!(sheet.value("I2"), "100.00%");
        assert!(!sheet.value("L2").is_empty());
        assert!(!sheet.value("M2").is_empty());
        assert_eq!(evaluator.datacite_flags.lock().unwrap().as_slice(), &[true]);
    }

    #[tokio::test]
    async fn test_row_failure_is_isolated() {
        let sheet = running_sheet();
        sheet.seed("B2", "10.1/bad");
        sheet.seed("B3", "10.1/good");
        let evaluator = MockEvaluator {
            fail_for: Some("10.1/bad".to_string()),
            ..MockEvaluator::default()
        };
        let stop = AtomicBool::new(false);

        let summary = run_cycle(&sheet, &evaluator, &config(), &stop)
            .await
            .unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.published, 1);
        assert_eq!(sheet.value("K2"), "Error");
        assert!(sheet.value("P2").contains("unreachable"));
        assert_eq!(sheet.value("K3"), "Ready");
    }

    #[tokio::test]
    async fn test_ineligible_status_skipped_without_evaluator_call() {
        let sheet = running_sheet();
        sheet.seed("B2", "10.1/a");
        sheet.seed("K2", "Error");
        let evaluator = MockEvaluator::default();
        let stop = AtomicBool::new(false);

        let summary = run_cycle(&sheet, &evaluator, &config(), &stop)
            .await
            .unwrap();

        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 0);
        assert_eq!(evaluator.call_count(), 0);
        assert_eq!(sheet.value("K2"), "Error");
    }

    #[tokio::test]
    async fn test_rows_with_results_not_revisited() {
        let sheet = running_sheet();
        sheet.seed("B2", "10.1/done");
        sheet.seed("I2", "80.00%");
        sheet.seed("B3", "10.1/pending");
        let evaluator = MockEvaluator::default();
        let stop = AtomicBool::new(false);

        let summary = run_cycle(&sheet, &evaluator, &config(), &stop)
            .await
            .unwrap();

        assert_eq!(summary.candidates, 1);
        assert_eq!(evaluator.call_count(), 1);
        assert_eq!(sheet.value("K3"), "Ready");
        assert_eq!(sheet.value("K2"), "");
    }

    #[tokio::test]
    async fn test_datacite_flag_parsing() {
        let sheet = running_sheet();
        sheet.seed("O2", "TRUE");
        sheet.seed("B2", "10.1/a");
        let evaluator = MockEvaluator::default();
        let stop = AtomicBool::new(false);
        run_cycle(&sheet, &evaluator, &config(), &stop).await.unwrap();
        assert_eq!(evaluator.datacite_flags.lock().unwrap().as_slice(), &[true]);

        let sheet = running_sheet();
        sheet.seed("O2", "False");
        sheet.seed("B2", "10.1/a");
        let evaluator = MockEvaluator::default();
        run_cycle(&sheet, &evaluator, &config(), &stop).await.unwrap();
        assert_eq!(evaluator.datacite_flags.lock().unwrap().as_slice(), &[false]);

        // Blank cell means no datacite
        let sheet = running_sheet();
        sheet.seed("B2", "10.1/a");
        let evaluator = MockEvaluator::default();
        run_cycle(&sheet, &evaluator, &config(), &stop).await.unwrap();
        assert_eq!(evaluator.datacite_flags.lock().unwrap().as_slice(), &[false]);
    }

    #[tokio::test]
    async fn test_process_stop_flag_ends_scan_between_rows() {
        let sheet = running_sheet();
        sheet.seed("B2", "10.1/a");
        sheet.seed("B3", "10.1/b");
        let stop = std::sync::Arc::new(AtomicBool::new(false));
        let stop_from_hook = stop.clone();
        let evaluator = MockEvaluator {
            on_call: Some(Box::new(move |_| {
                stop_from_hook.store(true, Ordering::Relaxed);
            })),
            ..MockEvaluator::default()
        };

        let summary = run_cycle(&sheet, &evaluator, &config(), &stop)
            .await
            .unwrap();

        // First row ran to completion, second was never started
        assert!(summary.stopped);
        assert_eq!(evaluator.call_count(), 1);
        assert_eq!(sheet.value("K2"), "Ready");
        assert_eq!(sheet.value("K3"), "");
    }

    #[tokio::test]
    async fn test_mismatched_identifier_leaves_row_analyzing() {
        let sheet = std::sync::Arc::new(running_sheet());
        sheet.seed("B2", "10.1/a");
        // Simulate a human editing the identifier while the evaluator runs
        let sheet_from_hook = sheet.clone();
        let evaluator = MockEvaluator {
            on_call: Some(Box::new(move |_| {
                sheet_from_hook.seed("B2", "10.1/edited");
            })),
            ..MockEvaluator::default()
        };
        let stop = AtomicBool::new(false);

        let summary = run_cycle(&*sheet, &evaluator, &config(), &stop)
            .await
            .unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.published, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(sheet.value("K2"), "Analyzing");
        // No scorecard cells were touched
        assert_eq!(sheet.value("D2"), "");
        assert_eq!(sheet.value("I2"), "");
    }
}
