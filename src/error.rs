//! Error types for the cardsmith library.
//!
//! Three distinct types reflect three distinct failure modes:
//!
//! * [`CardError`]: **Fatal**: the run cannot proceed at all (workbook
//!   missing, required columns absent, output document not writable).
//!   Returned as `Err(CardError)` from the top-level `generate*` functions.
//!
//! * [`RowError`]: **Non-fatal**: a single row failed (missing field, QR
//!   payload too large, card image not writable) but every other row is fine.
//!   Stored inside [`crate::output::RowResult`] so callers can inspect partial
//!   success.
//!
//! * [`AssetWarning`]: **Degradation**: a font or logo could not be loaded and
//!   a fallback was substituted. The run always continues.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the cardsmith library.
///
/// Row-level failures use [`RowError`] and are stored in
/// [`crate::output::RowResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CardError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Workbook not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not an `.xlsx` workbook.
    #[error("File is not an .xlsx workbook: '{path}'\nFirst bytes: {magic:?}")]
    NotAWorkbook { path: PathBuf, magic: [u8; 4] },

    // ── Workbook errors ───────────────────────────────────────────────────
    /// The zip container or the sheet XML could not be parsed.
    #[error("Workbook '{path}' could not be read: {detail}")]
    WorkbookUnreadable { path: PathBuf, detail: String },

    /// The workbook contains no worksheet at all.
    #[error("Workbook '{path}' has no worksheets")]
    EmptyWorkbook { path: PathBuf },

    /// The header row lacks one or more of the required columns.
    #[error(
        "Missing required columns: {}\nEnsure the sheet contains: Name, Course, Year, Team",
        .missing.join(", ")
    )]
    MissingRequiredColumns { missing: Vec<String> },

    /// The header row is valid but there are no data rows below it.
    #[error("Workbook '{path}' has no data rows below the header")]
    NoRecords { path: PathBuf },

    // ── Run outcome errors ────────────────────────────────────────────────
    /// Every row failed; no document was written.
    #[error("All {total} rows failed; no document was written.\nFirst error: {first_error}")]
    AllRowsFailed { total: usize, first_error: String },

    /// Some rows succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::GenerationOutput::into_result`] when
    /// the caller wants to treat any row failure as an error.
    #[error("{failed}/{total} rows failed; the document holds {success} cards")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The assembled PDF could not be finalised on disk.
    #[error("Failed to write document '{path}': {source}")]
    DocumentWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create the output directory or another output file.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single row.
///
/// `row` is the 1-based spreadsheet row number (the header is row 1).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RowError {
    /// One of Name, Course, Year, Team is absent or blank.
    #[error("Row {row}: missing field '{field}'")]
    MissingField { row: usize, field: String },

    /// Drawing the card failed.
    #[error("Row {row}: rendering failed: {detail}")]
    RenderFailed { row: usize, detail: String },

    /// The intermediate card image could not be saved.
    #[error("Row {row}: failed to write card image '{}': {detail}", .path.display())]
    ImageWriteFailed {
        row: usize,
        path: PathBuf,
        detail: String,
    },

    /// The card could not be added to the output document.
    #[error("Row {row}: failed to append page: {detail}")]
    PageAppendFailed { row: usize, detail: String },
}

impl RowError {
    /// Spreadsheet row the error belongs to.
    pub fn row(&self) -> usize {
        match self {
            RowError::MissingField { row, .. }
            | RowError::RenderFailed { row, .. }
            | RowError::ImageWriteFailed { row, .. }
            | RowError::PageAppendFailed { row, .. } => *row,
        }
    }
}

/// Which logo slot an [`AssetWarning::LogoUnavailable`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoSlot {
    /// Small logo in the top-left corner.
    Primary,
    /// Wide logo below the institute label.
    Secondary,
}

impl std::fmt::Display for LogoSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogoSlot::Primary => f.write_str("primary"),
            LogoSlot::Secondary => f.write_str("secondary"),
        }
    }
}

/// An asset that could not be loaded and was replaced by a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AssetWarning {
    /// The TrueType font is missing or unparsable; the built-in face is used.
    #[error("Font '{}' unavailable ({detail}); using the built-in font", .path.display())]
    FontUnavailable { path: PathBuf, detail: String },

    /// A logo is missing or undecodable; the card is drawn without it.
    #[error("{slot} logo '{}' unavailable ({detail}); proceeding without it", .path.display())]
    LogoUnavailable {
        slot: LogoSlot,
        path: PathBuf,
        detail: String,
    },
}
