//! Workbook reading: first sheet → header-keyed rows.
//!
//! Row 1 is the header. Header names are trimmed; blank header cells are
//! ignored and a repeated header keeps its first column. Cell values are
//! taken verbatim from the stored cell text (no trimming, no numeric
//! reformatting), so `007` stays `007`. Rows whose cells are all blank are
//! dropped.

use crate::error::CardError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Columns every workbook must carry, in the order they appear on the card.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Name", "Course", "Year", "Team"];

/// One data row, keyed by trimmed header name. Blank cells are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRow {
    /// 1-based spreadsheet row number.
    pub row_num: usize,
    pub cells: BTreeMap<String, String>,
}

impl TableRow {
    pub fn new(row_num: usize) -> Self {
        Self {
            row_num,
            cells: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly for tests and in-memory tables.
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.cells.insert(column.to_string(), value.to_string());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// The first sheet of a workbook.
#[derive(Debug, Clone)]
pub struct Table {
    pub path: PathBuf,
    pub sheet_name: String,
    /// Trimmed, de-duplicated header names in column order.
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Build a table from a raw cell grid whose first row is the header.
    ///
    /// `grid[r][c]` is the text of spreadsheet row `r + 1`, column `c + 1`.
    pub fn from_grid(path: impl AsRef<Path>, sheet_name: &str, grid: &[Vec<String>]) -> Self {
        let mut columns = Vec::new();
        // (column index, header name) for every usable header cell
        let mut header: Vec<(usize, String)> = Vec::new();
        if let Some(first) = grid.first() {
            for (idx, raw) in first.iter().enumerate() {
                let name = raw.trim();
                if name.is_empty() || columns.iter().any(|c| c == name) {
                    continue;
                }
                columns.push(name.to_string());
                header.push((idx, name.to_string()));
            }
        }

        let mut rows = Vec::new();
        for (offset, cells) in grid.iter().enumerate().skip(1) {
            let row_num = offset + 1;
            let mut row = TableRow::new(row_num);
            for (idx, name) in &header {
                if let Some(value) = cells.get(*idx) {
                    if !value.is_empty() {
                        row.cells.insert(name.clone(), value.clone());
                    }
                }
            }
            if row.cells.values().all(|v| v.trim().is_empty()) {
                debug!("Skipping blank row {}", row_num);
                continue;
            }
            rows.push(row);
        }

        Self {
            path: path.as_ref().to_path_buf(),
            sheet_name: sheet_name.to_string(),
            columns,
            rows,
        }
    }

    /// Required columns missing from the header, in [`REQUIRED_COLUMNS`] order.
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|req| !self.columns.iter().any(|c| c == *req))
            .map(|s| s.to_string())
            .collect()
    }

    /// Fail with [`CardError::MissingRequiredColumns`] unless every required column is present.
    pub fn validate_columns(&self) -> Result<(), CardError> {
        let missing = self.missing_columns();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CardError::MissingRequiredColumns { missing })
        }
    }
}

/// Read the first worksheet of an `.xlsx` file.
pub fn read_table(path: &Path) -> Result<Table, CardError> {
    let book =
        umya_spreadsheet::reader::xlsx::read(path).map_err(|e| CardError::WorkbookUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let sheet = book
        .get_sheet_collection()
        .first()
        .ok_or_else(|| CardError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?;

    let (max_col, max_row) = sheet.get_highest_column_and_row();
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(max_row as usize);
    for row in 1..=max_row {
        let cells = (1..=max_col)
            .map(|col| {
                sheet
                    .get_cell((col, row))
                    .map(|cell| cell.get_value().to_string())
                    .unwrap_or_default()
            })
            .collect();
        grid.push(cells);
    }

    let table = Table::from_grid(path, sheet.get_name(), &grid);
    info!(
        "Read sheet '{}': {} columns, {} data rows",
        table.sheet_name,
        table.columns.len(),
        table.rows.len()
    );
    Ok(table)
}
