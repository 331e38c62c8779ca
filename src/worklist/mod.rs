//! Work discovery over the worklist snapshot.
//!
//! Scans the identifier and result column ranges read from the sheet
//! and yields the rows that still need an evaluation.

use std::collections::BTreeMap;

/// Select the rows eligible for processing.
///
/// `identifiers` and `results` are parallel single-column range
/// snapshots as returned by the store: one entry per row, each entry
/// the list of cell values in that row (empty for a blank cell). The
/// store omits trailing blank rows, so the result range is routinely
/// shorter than the identifier range; any row past its end counts as
/// "no result yet".
///
/// A row is a candidate when its identifier cell is non-empty and its
/// result cell is empty or absent. Rows with blank identifiers are
/// skipped silently. The returned map iterates in ascending sheet-row
/// order; `first_row` anchors index 0 of the snapshot (row 2 in the
/// standard layout, below the header).
pub fn select_candidates(
    identifiers: &[Vec<String>],
    results: &[Vec<String>],
    first_row: u32,
) -> BTreeMap<u32, String> {
    let mut candidates = BTreeMap::new();

    for (i, cells) in identifiers.iter().enumerate() {
        let identifier = cells.concat();
        if identifier.is_empty() {
            continue;
        }

        let has_result = results
            .get(i)
            .map(|cells| !cells.concat().is_empty())
            .unwrap_or(false);

        if !has_result {
            candidates.insert(first_row + i as u32, identifier);
        }
    }

    candidates
}
