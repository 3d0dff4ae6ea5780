//! # cardsmith
//!
//! Turn a spreadsheet of students into a printable PDF of identity cards.
//!
//! Every data row of the first worksheet becomes one 600 × 1000 card: two
//! logos, the institute label, four `"Label: value"` lines, a QR code that
//! repeats those lines, and an empty signature box. Each card is one page of
//! the output document, in sheet order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .xlsx
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Table      first sheet → header-keyed rows, required columns checked
//!  ├─ 3. Assets     font + two logos, each with a fallback
//!  ├─ 4. Normalize  Name / Course / Year / Team, verbatim
//!  ├─ 5. Render     canvas, text, QR block, signature box
//!  ├─ 6. Artifact   <output_dir>/<name>.png
//!  └─ 7. Document   one page per card, written atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardsmith::{generate, CardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CardConfig::builder()
//!         .output_dir("id_cards")
//!         .font_path("fonts/DejaVuSans.ttf")
//!         .build()?;
//!     let output = generate("students.xlsx", &config).await?;
//!     println!("{} cards → {}", output.stats.rendered_rows, output.document_path.display());
//!     for row in output.failed_rows() {
//!         eprintln!("skipped: {}", row.error.as_ref().map(|e| e.to_string()).unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Model
//!
//! | Kind | Type | Effect |
//! |------|------|--------|
//! | Fatal | [`CardError`] | Nothing (or no document) is produced |
//! | Per row | [`RowError`] | Row skipped, recorded in [`RowResult`] |
//! | Asset | [`AssetWarning`] | Fallback used, run continues |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cardsmith` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CardConfig, CardConfigBuilder, DEFAULT_INSTITUTE_LABEL};
pub use error::{AssetWarning, CardError, LogoSlot, RowError};
pub use generate::{generate, generate_from_bytes, generate_sync, inspect};
pub use layout::{CardLayout, Rect};
pub use output::{GenerationOutput, GenerationStats, RowResult, RunStatus, WorkbookSummary};
pub use pipeline::normalize::InputRecord;
pub use pipeline::render::{render_card, RenderedCard};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
