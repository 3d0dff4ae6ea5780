//! CLI binary for cardsmith.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `CardConfig` and prints results.

use anyhow::{Context, Result};
use cardsmith::{
    generate, inspect, AssetWarning, CardConfig, GenerationOutput, ProgressCallback,
    RunProgressCallback, RunStatus, WorkbookSummary,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per row.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-row start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` tells us how many rows there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading workbook…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} cards  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, row_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&row_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_rows: usize) {
        self.activate_bar(total_rows);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating {total_rows} cards…"))
        ));
    }

    fn on_asset_warning(&self, warning: &AssetWarning) {
        self.bar
            .println(format!("  {} {}", yellow("!"), yellow(&warning.to_string())));
    }

    fn on_row_start(&self, row_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(row_num, Instant::now());
        }
        self.bar.set_message(format!("row {row_num}"));
    }

    fn on_row_complete(&self, row_num: usize, _total: usize, page_num: usize) {
        let secs = self.elapsed_secs(row_num);
        self.bar.println(format!(
            "  {} Row {:>4}  →  page {:<4}  {}",
            green("✓"),
            row_num,
            page_num,
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_row_error(&self, row_num: usize, _total: usize, error: &str) {
        let secs = self.elapsed_secs(row_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Row {:>4}  {}  {}",
            red("✗"),
            row_num,
            red(&msg),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_rows: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 && success_count == total_rows {
            eprintln!(
                "{} {} cards generated",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} cards generated  ({} failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_rows,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Cards for every student in the sheet → id_cards/student_id_cards.pdf
  cardsmith students.xlsx

  # Custom output location and assets
  cardsmith students.xlsx -o out --font fonts/DejaVuSans.ttf \
      --primary-logo logos/crest.png --secondary-logo logos/banner.png

  # Workbook from a URL
  cardsmith https://example.org/exports/batch-2024.xlsx

  # Check columns and preview rows without rendering
  cardsmith --inspect-only students.xlsx

  # Double-resolution cards, PDF only, machine-readable report
  cardsmith students.xlsx --scale 2 --no-card-images --json > report.json

WORKBOOK FORMAT:
  First worksheet, header in row 1. Required columns (case-sensitive):
    Name  Course  Year  Team
  Extra columns are ignored. Cell text is printed exactly as stored.

ASSETS:
  A missing font falls back to a built-in bitmap face; a missing logo is
  simply left out. Both are reported as warnings, never as failures.

ENVIRONMENT VARIABLES:
  Every flag has a CARDSMITH_* equivalent, e.g. CARDSMITH_OUTPUT_DIR,
  CARDSMITH_FONT, CARDSMITH_SCALE. RUST_LOG overrides the log filter.
"#;

/// Render identity cards from a spreadsheet into one PDF.
#[derive(Parser, Debug)]
#[command(
    name = "cardsmith",
    version,
    about = "Render identity cards from a spreadsheet into one PDF",
    long_about = "Reads the first sheet of an .xlsx workbook (local path or URL) and renders \
one identity card per row: logos, institute label, Name/Course/Year/Team, a QR code of those \
details and a signature box. Every card becomes one page of a single PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .xlsx file path or HTTP/HTTPS URL.
    input: String,

    /// Directory for the PDF and card images.
    #[arg(short, long = "output-dir", env = "CARDSMITH_OUTPUT_DIR", default_value = "id_cards")]
    output_dir: PathBuf,

    /// File name of the PDF inside the output directory.
    #[arg(long, env = "CARDSMITH_DOCUMENT_NAME", default_value = "student_id_cards.pdf")]
    document_name: String,

    /// TrueType font for all card text.
    #[arg(long, env = "CARDSMITH_FONT", default_value = "arial.ttf")]
    font: PathBuf,

    /// Logo drawn in the top-left corner.
    #[arg(long, env = "CARDSMITH_PRIMARY_LOGO", default_value = "sims_logo.png")]
    primary_logo: PathBuf,

    /// Wide logo drawn under the institute label.
    #[arg(long, env = "CARDSMITH_SECONDARY_LOGO", default_value = "dazzle_logo.png")]
    secondary_logo: PathBuf,

    /// Institute label printed under the primary logo.
    #[arg(long, env = "CARDSMITH_LABEL", default_value = cardsmith::DEFAULT_INSTITUTE_LABEL)]
    label: String,

    /// Uniform layout scale (0.25–4.0); 1.0 is a 600×1000 card.
    #[arg(long, env = "CARDSMITH_SCALE", default_value_t = 1.0)]
    scale: f32,

    /// Do not save each card as a PNG next to the PDF.
    #[arg(long, env = "CARDSMITH_NO_CARD_IMAGES")]
    no_card_images: bool,

    /// Stop at the first row that fails instead of skipping it.
    #[arg(long, env = "CARDSMITH_FAIL_FAST")]
    fail_fast: bool,

    /// Print the run report (or workbook summary) as JSON on stdout.
    #[arg(long, env = "CARDSMITH_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "CARDSMITH_NO_PROGRESS")]
    no_progress: bool,

    /// Print columns and a preview of the first rows, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CARDSMITH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CARDSMITH_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "CARDSMITH_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; warnings still reach stderr via
    // the asset-warning callback.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(&cli.input, cli.download_timeout)
            .await
            .context("Failed to inspect workbook")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
            );
        } else {
            print_summary(&cli.input, &summary);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = generate(&cli.input, &config)
        .await
        .context("Card generation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        print_report(&output, show_progress);
    }

    Ok(())
}

/// Map CLI args to `CardConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CardConfig> {
    let mut builder = CardConfig::builder()
        .output_dir(&cli.output_dir)
        .document_name(cli.document_name.clone())
        .font_path(&cli.font)
        .primary_logo_path(&cli.primary_logo)
        .secondary_logo_path(&cli.secondary_logo)
        .institute_label(cli.label.clone())
        .scale(cli.scale)
        .write_card_images(!cli.no_card_images)
        .fail_fast(cli.fail_fast)
        .download_timeout_secs(cli.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(input: &str, summary: &WorkbookSummary) {
    println!("File:      {}", input);
    println!("Sheet:     {}", summary.sheet_name);
    println!("Columns:   {}", summary.columns.join(", "));
    println!("Rows:      {}", summary.row_count);
    if summary.is_valid() {
        println!("Status:    {}", green("ready"));
    } else {
        println!(
            "Status:    {} (missing {})",
            red("invalid"),
            summary.missing_columns.join(", ")
        );
    }
    if summary.preview.is_empty() {
        return;
    }
    println!();
    for (i, row) in summary.preview.iter().enumerate() {
        let cells: Vec<String> = summary
            .columns
            .iter()
            .map(|c| row.get(c).cloned().unwrap_or_default())
            .collect();
        println!("  {}  {}", dim(&format!("{:>2}", i + 1)), cells.join(" | "));
    }
}

fn print_report(output: &GenerationOutput, progress_shown: bool) {
    let stats = &output.stats;
    if !progress_shown {
        for w in &output.warnings {
            eprintln!("{} {}", yellow("warning:"), w);
        }
        for row in output.failed_rows() {
            if let Some(ref e) = row.error {
                eprintln!("{} {}", red("error:"), e);
            }
        }
    }

    let mark = match output.status {
        RunStatus::Complete => green("✔"),
        RunStatus::Partial => cyan("⚠"),
        RunStatus::Aborted => red("✘"),
    };
    eprintln!(
        "{}  {}/{} cards  {}ms  →  {}",
        mark,
        stats.rendered_rows,
        stats.total_rows,
        stats.total_duration_ms,
        bold(&output.document_path.display().to_string()),
    );
    if stats.skipped_rows > 0 {
        eprintln!(
            "   {} rows not attempted after --fail-fast stop",
            dim(&stats.skipped_rows.to_string())
        );
    }
}
