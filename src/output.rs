//! Result types returned by the generation entry points.

use crate::error::{AssetWarning, CardError, RowError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every row produced a page.
    Complete,
    /// At least one row was skipped after an error; all others produced pages.
    Partial,
    /// `fail_fast` stopped the run; the document holds the rows before the failure.
    Aborted,
}

/// Outcome of one spreadsheet row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowResult {
    /// 1-based spreadsheet row (the header is row 1).
    pub row_num: usize,
    /// The `Name` cell, when the row had one.
    pub name: Option<String>,
    /// 1-based page in the output document; `None` when the row failed.
    pub page_num: Option<usize>,
    /// Where the card PNG was written, if image output is enabled.
    pub image_path: Option<PathBuf>,
    /// Wall-clock time spent on this row.
    pub duration_ms: u64,
    pub error: Option<RowError>,
}

impl RowResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run-level counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Data rows in the sheet.
    pub total_rows: usize,
    /// Rows that produced a page.
    pub rendered_rows: usize,
    /// Rows that failed.
    pub failed_rows: usize,
    /// Rows never attempted because `fail_fast` stopped the run.
    pub skipped_rows: usize,
    pub total_duration_ms: u64,
    /// Time spent inside the card renderer only.
    pub render_duration_ms: u64,
}

/// Everything a harness needs after a run: the document, per-row results and warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// The finalised PDF; readable without the generating process.
    pub document_path: PathBuf,
    /// One entry per attempted row, in input order.
    pub rows: Vec<RowResult>,
    /// Asset substitutions made while loading fonts and logos.
    pub warnings: Vec<AssetWarning>,
    pub stats: GenerationStats,
    pub status: RunStatus,
}

impl GenerationOutput {
    /// Rows that failed, in input order.
    pub fn failed_rows(&self) -> impl Iterator<Item = &RowResult> {
        self.rows.iter().filter(|r| r.error.is_some())
    }

    /// Treat any failed row as an error.
    pub fn into_result(self) -> Result<Self, CardError> {
        if self.status == RunStatus::Complete {
            Ok(self)
        } else {
            Err(CardError::PartialFailure {
                success: self.stats.rendered_rows,
                failed: self.stats.failed_rows,
                total: self.stats.total_rows,
            })
        }
    }
}

/// Workbook overview produced by [`crate::generate::inspect`] without rendering anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookSummary {
    pub path: PathBuf,
    pub sheet_name: String,
    /// Trimmed header names in column order.
    pub columns: Vec<String>,
    /// Non-blank data rows.
    pub row_count: usize,
    /// Required columns absent from the header.
    pub missing_columns: Vec<String>,
    /// The first few data rows.
    pub preview: Vec<BTreeMap<String, String>>,
}

impl WorkbookSummary {
    pub fn is_valid(&self) -> bool {
        self.missing_columns.is_empty()
    }
}
