//! Generation entry points.
//!
//! Input resolution is async (URL inputs are downloaded); everything after it
//! is CPU-bound image work and runs as one blocking task. Rows are processed
//! strictly in sheet order, so page `N` of the document always belongs to the
//! `N`th successful row.

use crate::config::CardConfig;
use crate::error::{CardError, RowError};
use crate::layout::CardLayout;
use crate::output::{GenerationOutput, GenerationStats, RowResult, RunStatus, WorkbookSummary};
use crate::pipeline::artifact::CardImageWriter;
use crate::pipeline::assets::AssetSet;
use crate::pipeline::document::CardDocument;
use crate::pipeline::input;
use crate::pipeline::normalize::normalize;
use crate::pipeline::render::render_card;
use crate::pipeline::table::{read_table, Table, TableRow};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Rows shown by [`inspect`].
pub const PREVIEW_ROWS: usize = 5;

/// Generate one card per row of a workbook and assemble them into a PDF.
///
/// # Arguments
/// * `input` : local `.xlsx` path or HTTP/HTTPS URL
/// * `config`: run configuration
///
/// # Returns
/// `Ok(GenerationOutput)` whenever a document was written, even if some rows
/// failed (check `output.status` or call [`GenerationOutput::into_result`]).
///
/// # Errors
/// Returns `Err(CardError)` only for fatal errors:
/// - workbook missing, unreadable or not an `.xlsx`
/// - required columns absent, or no data rows
/// - every row failed, so no document was written
/// - the document could not be written
pub async fn generate(
    input_str: impl AsRef<str>,
    config: &CardConfig,
) -> Result<GenerationOutput, CardError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting card generation: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();

    let config = config.clone();
    let mut output = tokio::task::spawn_blocking(move || run_pipeline(&path, &config))
        .await
        .map_err(|e| CardError::Internal(format!("Generation task panicked: {}", e)))??;

    // `resolved` (and any downloaded temp file) lives until here.
    drop(resolved);
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input_str: impl AsRef<str>,
    config: &CardConfig,
) -> Result<GenerationOutput, CardError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CardError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input_str, config))
}

/// Generate cards from workbook bytes held in memory.
///
/// The bytes are written to a managed temp file that is removed on return.
///
/// # Example
/// ```rust,no_run
/// use cardsmith::{generate_from_bytes, CardConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("students.xlsx")?;
/// let output = generate_from_bytes(&bytes, &CardConfig::default()).await?;
/// println!("{}", output.document_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn generate_from_bytes(
    bytes: &[u8],
    config: &CardConfig,
) -> Result<GenerationOutput, CardError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("cardsmith-")
        .suffix(".xlsx")
        .tempfile()
        .map_err(|e| CardError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| CardError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    generate(&path, config).await
}

/// Read a workbook's header and first rows without rendering anything.
///
/// `download_timeout_secs` applies when `input_str` is a URL.
pub async fn inspect(
    input_str: impl AsRef<str>,
    download_timeout_secs: u64,
) -> Result<WorkbookSummary, CardError> {
    let resolved = input::resolve_input(input_str.as_ref(), download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();
    let table = tokio::task::spawn_blocking(move || read_table(&path))
        .await
        .map_err(|e| CardError::Internal(format!("Inspect task panicked: {}", e)))??;
    Ok(summarize(&table))
}

fn summarize(table: &Table) -> WorkbookSummary {
    WorkbookSummary {
        path: table.path.clone(),
        sheet_name: table.sheet_name.clone(),
        columns: table.columns.clone(),
        row_count: table.rows.len(),
        missing_columns: table.missing_columns(),
        preview: table
            .rows
            .iter()
            .take(PREVIEW_ROWS)
            .map(|r| r.cells.clone())
            .collect(),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The blocking part of a run: workbook → assets → rows → document.
fn run_pipeline(workbook: &Path, config: &CardConfig) -> Result<GenerationOutput, CardError> {
    let run_start = Instant::now();

    // ── Step 1: Read and validate the sheet ──────────────────────────────
    let table = read_table(workbook)?;
    table.validate_columns()?;
    if table.rows.is_empty() {
        return Err(CardError::NoRecords {
            path: workbook.to_path_buf(),
        });
    }
    let total_rows = table.rows.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_rows);
    }

    // ── Step 2: Load assets once ─────────────────────────────────────────
    let layout = config.layout();
    let assets = AssetSet::load(&config.asset_paths(), &layout);
    if let Some(ref cb) = config.progress_callback {
        for w in &assets.warnings {
            cb.on_asset_warning(w);
        }
    }

    // ── Step 3: Render rows in order ─────────────────────────────────────
    let mut document = CardDocument::open(config.document_path(), layout.canvas_size())?;
    let mut images = CardImageWriter::new(&config.output_dir);
    let mut rows: Vec<RowResult> = Vec::with_capacity(total_rows);
    let mut render_time = Duration::ZERO;
    let mut aborted = false;

    for (idx, row) in table.rows.iter().enumerate() {
        let row_start = Instant::now();
        if let Some(ref cb) = config.progress_callback {
            cb.on_row_start(row.row_num, total_rows);
        }

        let mut ctx = RowContext {
            assets: &assets,
            layout: &layout,
            config,
            document: &mut document,
            images: &mut images,
            render_time: &mut render_time,
        };
        let outcome = ctx.process(row);
        let duration_ms = row_start.elapsed().as_millis() as u64;
        let name = row.get("Name").map(str::to_string);

        match outcome {
            Ok((page_num, image_path)) => {
                debug!("Row {} → page {}", row.row_num, page_num);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_row_complete(row.row_num, total_rows, page_num);
                }
                rows.push(RowResult {
                    row_num: row.row_num,
                    name,
                    page_num: Some(page_num),
                    image_path,
                    duration_ms,
                    error: None,
                });
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_row_error(row.row_num, total_rows, &e.to_string());
                }
                rows.push(RowResult {
                    row_num: row.row_num,
                    name,
                    page_num: None,
                    image_path: None,
                    duration_ms,
                    error: Some(e),
                });
                if config.fail_fast {
                    warn!(
                        "Stopping after row {}; {} rows left unprocessed",
                        row.row_num,
                        total_rows - idx - 1
                    );
                    aborted = true;
                    break;
                }
            }
        }
    }

    // ── Step 4: Tally and finalise ───────────────────────────────────────
    let rendered = rows.iter().filter(|r| r.is_ok()).count();
    let failed = rows.len() - rendered;
    let skipped = total_rows - rows.len();

    if rendered == 0 {
        if let Some(ref cb) = config.progress_callback {
            cb.on_run_complete(total_rows, 0);
        }
        let first_error = rows
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(CardError::AllRowsFailed {
            total: total_rows,
            first_error,
        });
    }

    let document_path = document.finalize()?;

    let status = if aborted {
        RunStatus::Aborted
    } else if failed > 0 {
        RunStatus::Partial
    } else {
        RunStatus::Complete
    };

    let stats = GenerationStats {
        total_rows,
        rendered_rows: rendered,
        failed_rows: failed,
        skipped_rows: skipped,
        total_duration_ms: run_start.elapsed().as_millis() as u64,
        render_duration_ms: render_time.as_millis() as u64,
    };

    info!(
        "Generation complete: {}/{} cards, {}ms total",
        rendered, total_rows, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total_rows, rendered);
    }

    Ok(GenerationOutput {
        document_path,
        rows,
        warnings: assets.warnings,
        stats,
        status,
    })
}

/// Borrowed run state needed to turn one row into one page.
struct RowContext<'a> {
    assets: &'a AssetSet,
    layout: &'a CardLayout,
    config: &'a CardConfig,
    document: &'a mut CardDocument,
    images: &'a mut CardImageWriter,
    render_time: &'a mut Duration,
}

impl RowContext<'_> {
    /// Returns the page number and, when image output is on, the PNG path.
    fn process(&mut self, row: &TableRow) -> Result<(usize, Option<PathBuf>), RowError> {
        let record = normalize(row)?;

        let render_start = Instant::now();
        let card = render_card(
            &record,
            self.assets,
            self.layout,
            &self.config.institute_label,
        )
        .map_err(|e| RowError::RenderFailed {
            row: row.row_num,
            detail: e.to_string(),
        })?;
        *self.render_time += render_start.elapsed();

        if self.config.write_card_images {
            let path = self.images.write(row.row_num, &record.name, &card.image)?;
            let page = self.document.append_image_file(row.row_num, &path)?;
            Ok((page, Some(path)))
        } else {
            Ok((self.document.append_page(row.row_num, &card.image)?, None))
        }
    }
}
