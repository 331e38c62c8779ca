//! In-memory sheet store used by tests.

use super::SheetSession;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory single-worksheet store.
///
/// Mimics the values API's range behavior: blank cells in a range come
/// back as empty rows and trailing blank rows are trimmed off.
#[derive(Default)]
pub struct MemorySheet {
    cells: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cell without recording it as a write.
    pub fn seed(&self, addr: &str, value: &str) {
        self.cells
            .lock()
            .unwrap()
            .insert(addr.to_string(), value.to_string());
    }

    /// Current value of a cell (empty string when blank).
    pub fn value(&self, addr: &str) -> String {
        self.cells
            .lock()
            .unwrap()
            .get(addr)
            .cloned()
            .unwrap_or_default()
    }

    /// Every write made through the session, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

/// Split `K7` into `("K", 7)`.
fn parse_addr(addr: &str) -> Result<(String, u32)> {
    let split = addr.find(|c: char| c.is_ascii_digit());
    let Some(split) = split else {
        bail!("invalid cell address: {addr}");
    };
    let (column, row) = addr.split_at(split);
    if column.is_empty() {
        bail!("invalid cell address: {addr}");
    }
    Ok((column.to_string(), row.parse()?))
}

impl SheetSession for MemorySheet {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let Some((start, end)) = range.split_once(':') else {
            bail!("invalid range: {range}");
        };
        let (column, first) = parse_addr(start)?;
        let (end_column, last) = parse_addr(end)?;
        if column != end_column {
            bail!("only single-column ranges are supported: {range}");
        }

        let cells = self.cells.lock().unwrap();
        let mut rows: Vec<Vec<String>> = (first..=last)
            .map(|row| {
                match cells.get(&super::cell(&column, row)) {
                    Some(v) if !v.is_empty() => vec![v.clone()],
                    _ => Vec::new(),
                }
            })
            .collect();

        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn read_cell(&self, addr: &str) -> Result<String> {
        Ok(self.value(addr))
    }

    async fn write_cell(&self, addr: &str, value: &str) -> Result<()> {
        self.cells
            .lock()
            .unwrap()
            .insert(addr.to_string(), value.to_string());
        self.writes
            .lock()
            .unwrap()
            .push((addr.to_string(), value.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_range_trims_trailing_blank_rows() {
        let sheet = MemorySheet::new();
        sheet.seed("B2", "10.1/a");
        sheet.seed("B4", "10.1/c");

        let rows = sheet.read_range("B2:B10").await.unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["10.1/a".to_string()],
                vec![],
                vec!["10.1/c".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_range_is_empty() {
        let sheet = MemorySheet::new();
        let rows = sheet.read_range("I2:I4000").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_read_write_cell() {
        let sheet = MemorySheet::new();
        assert_eq!(sheet.read_cell("K7").await.unwrap(), "");

        sheet.write_cell("K7", "Analyzing").await.unwrap();
        assert_eq!(sheet.read_cell("K7").await.unwrap(), "Analyzing");
        assert_eq!(sheet.writes(), vec![("K7".to_string(), "Analyzing".to_string())]);
    }

    #[tokio::test]
    async fn test_invalid_addresses_rejected() {
        let sheet = MemorySheet::new();
        assert!(sheet.read_range("B2").await.is_err());
        assert!(sheet.read_range("B2:C4").await.is_err());
    }
}
