//! Row status lifecycle and scorecard publication.
//!
//! All per-row mutations of the worklist live here: the status state
//! machine (`Ready` / `Analyzing` / `Error` plus timestamps) and the
//! guarded write-back of a finished scorecard. Writes go out one cell
//! at a time and are not transactional; a crash mid-sequence leaves
//! partial state on the row, which the eligibility rule then keeps
//! out of the scan until a human resets it.

use super::{cell, SheetSession};
use crate::config::ColumnsConfig;
use crate::models::{RowStatus, Scorecard};
use anyhow::Result;
use chrono::{DateTime, Duration, Local};
use tracing::{info, warn};

/// Timestamp format used in the start/finish cells.
pub const TIMESTAMP_FORMAT: &str = "%d-%b-%Y, %H:%M:%S";

/// Render an elapsed duration as `H:MM:SS` for the duration cell.
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Writes a row's lifecycle fields through an open sheet session.
///
/// Transitions are unconditional: calling them in a sane order is the
/// orchestrator's job, not this type's.
pub struct StatusWriter<'a, S: SheetSession> {
    session: &'a S,
    columns: &'a ColumnsConfig,
}

impl<'a, S: SheetSession> StatusWriter<'a, S> {
    pub fn new(session: &'a S, columns: &'a ColumnsConfig) -> Self {
        Self { session, columns }
    }

    /// Status ← Analyzing, start timestamp written, finish cleared.
    pub async fn mark_analyzing(&self, row: u32, started: DateTime<Local>) -> Result<()> {
        self.write_status(row, RowStatus::Analyzing).await?;
        self.session
            .write_cell(
                &cell(&self.columns.started, row),
                &started.format(TIMESTAMP_FORMAT).to_string(),
            )
            .await?;
        self.session
            .write_cell(&cell(&self.columns.finished, row), "")
            .await
    }

    /// Status ← Ready with finish timestamp and elapsed duration.
    /// Only called after the scorecard was successfully published.
    pub async fn mark_ready(
        &self,
        row: u32,
        finished: DateTime<Local>,
        elapsed: Duration,
    ) -> Result<()> {
        self.write_status(row, RowStatus::Ready).await?;
        self.session
            .write_cell(
                &cell(&self.columns.finished, row),
                &finished.format(TIMESTAMP_FORMAT).to_string(),
            )
            .await?;
        self.session
            .write_cell(&cell(&self.columns.duration, row), &format_duration(elapsed))
            .await
    }

    /// Status ← Error with the failure description. Timestamps are
    /// left as they were.
    pub async fn mark_error(&self, row: u32, message: &str) -> Result<()> {
        self.write_status(row, RowStatus::Error).await?;
        self.session
            .write_cell(&cell(&self.columns.error, row), message)
            .await
    }

    async fn write_status(&self, row: u32, status: RowStatus) -> Result<()> {
        self.session
            .write_cell(&cell(&self.columns.status, row), status.as_str())
            .await
    }
}

/// Publish a finished scorecard to its row.
///
/// Guard: the row's identifier cell is re-read first; if it no longer
/// matches the identifier that was evaluated (the worklist was edited
/// under us), nothing is written and `false` comes back so the caller
/// can report non-publication instead of corrupting an unrelated row.
pub async fn push_scorecard<S: SheetSession>(
    session: &S,
    columns: &ColumnsConfig,
    row: u32,
    card: &Scorecard,
) -> Result<bool> {
    let current = session.read_cell(&cell(&columns.identifier, row)).await?;
    if current.trim_end() != card.dataset_identifier {
        warn!(
            row,
            expected = %card.dataset_identifier,
            found = %current,
            "identifier cell changed since evaluation, discarding results"
        );
        return Ok(false);
    }

    // Leading apostrophe keeps the sheet from reading the bitstring as
    // a number
    session
        .write_cell(
            &cell(&columns.result_string, row),
            &format!("'{}", card.result_string),
        )
        .await?;
    session
        .write_cell(&cell(&columns.findable, row), &card.findable.percent_display())
        .await?;
    session
        .write_cell(
            &cell(&columns.accessible, row),
            &card.accessible.percent_display(),
        )
        .await?;
    session
        .write_cell(
            &cell(&columns.interoperable, row),
            &card.interoperable.percent_display(),
        )
        .await?;
    session
        .write_cell(&cell(&columns.reusable, row), &card.reusable.percent_display())
        .await?;
    session
        .write_cell(&cell(&columns.total, row), &card.total.percent_display())
        .await?;
    session
        .write_cell(&cell(&columns.points, row), &card.points_display())
        .await?;
    session
        .write_cell(&cell(&columns.annotations, row), &card.annotation())
        .await?;

    // Resolution diagnostic: the observed status code when any page
    // retrieved during PID resolution mentions this identifier,
    // otherwise N/A. Nothing is written when no pages were retrieved.
    if !card.resolved_urls.is_empty() {
        let resolved_here = card
            .resolved_urls
            .iter()
            .any(|url| url.contains(&card.dataset_identifier));
        let value = match (resolved_here, card.resolution_status) {
            (true, Some(code)) => code.to_string(),
            _ => "N/A".to_string(),
        };
        session
            .write_cell(&cell(&columns.resolution, row), &value)
            .await?;
    }

    info!(row, dataset = %card.dataset_identifier, "scorecard published");
    Ok(true)
}
