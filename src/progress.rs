//! Progress-callback trait for per-row generation events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::CardConfigBuilder::progress_callback`] to receive events as
//! the pipeline loads assets and works through each spreadsheet row.
//!
//! # Example
//!
//! ```rust
//! use cardsmith::{CardConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_row_complete(&self, row_num: usize, total_rows: usize, page_num: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Row {} of {} → page {}", row_num, total_rows, page_num);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = CardConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::AssetWarning;
use std::sync::Arc;

/// Called by the generation pipeline as it processes each row.
///
/// Rows are processed one at a time, but the callback runs on Tokio's blocking
/// pool rather than the caller's thread, hence `Send + Sync`. All methods have
/// no-op defaults so callers only override what they care about.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after the workbook is validated, before assets are loaded.
    ///
    /// # Arguments
    /// * `total_rows`: number of data rows that will be attempted
    fn on_run_start(&self, total_rows: usize) {
        let _ = total_rows;
    }

    /// Called for every asset that was replaced by a fallback.
    fn on_asset_warning(&self, warning: &AssetWarning) {
        let _ = warning;
    }

    /// Called just before a row is normalised and rendered.
    ///
    /// # Arguments
    /// * `row_num`   : 1-based spreadsheet row (the header is row 1)
    /// * `total_rows`: total data rows in the run
    fn on_row_start(&self, row_num: usize, total_rows: usize) {
        let _ = (row_num, total_rows);
    }

    /// Called when a row's card has been appended to the document.
    ///
    /// # Arguments
    /// * `row_num`   : 1-based spreadsheet row
    /// * `total_rows`: total data rows
    /// * `page_num`  : 1-based page the card landed on
    fn on_row_complete(&self, row_num: usize, total_rows: usize, page_num: usize) {
        let _ = (row_num, total_rows, page_num);
    }

    /// Called when a row fails and is skipped.
    fn on_row_error(&self, row_num: usize, total_rows: usize, error: &str) {
        let _ = (row_num, total_rows, error);
    }

    /// Called once after the last row has been attempted.
    ///
    /// # Arguments
    /// * `total_rows`   : total data rows
    /// * `success_count`: rows that produced a page
    fn on_run_complete(&self, total_rows: usize, success_count: usize) {
        let _ = (total_rows, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CardConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
