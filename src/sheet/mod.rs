//! Worklist store access.
//!
//! The worklist lives in a spreadsheet addressed by column letter plus
//! 1-based row number. [`SheetSession`] is the narrow interface the
//! pipeline needs; [`rest::RestSheetStore`] talks to the real values
//! API and `memory::MemorySheet` backs the tests.

#[cfg(test)]
pub mod memory;
pub mod publish;
pub mod rest;

use anyhow::Result;

/// One open session against the worklist store.
///
/// A session carries valid credentials for its lifetime; the driver
/// opens a fresh one per cycle so credential refresh happens in exactly
/// one place.
#[allow(async_fn_in_trait)] // single-crate use, generic dispatch only
pub trait SheetSession {
    /// Read a cell range (e.g. `B2:B4000`). Returns one entry per row,
    /// each entry the cell values in that row; trailing blank rows are
    /// omitted, and a fully blank range is empty.
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Read a single cell (e.g. `K7`). A blank cell reads as `""`.
    async fn read_cell(&self, addr: &str) -> Result<String>;

    /// Write a single cell.
    async fn write_cell(&self, addr: &str, value: &str) -> Result<()>;
}

/// Build a cell address from column letter(s) and a 1-based row.
pub fn cell(column: &str, row: u32) -> String {
    format!("{}{}", column, row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_address() {
        assert_eq!(cell("K", 7), "K7");
        assert_eq!(cell("AA", 120), "AA120");
    }
}
