//! End-to-end integration tests for cardsmith.
//!
//! Every test builds its own workbook (and logos, where needed) inside a temp
//! directory, runs the full pipeline and reads the resulting PDF back with
//! `lopdf`. Nothing touches the network or the working directory.
//!
//! Run with:
//!   cargo test --test end_to_end -- --nocapture

use cardsmith::pipeline::assets::AssetSet;
use cardsmith::{
    generate, generate_from_bytes, generate_sync, inspect, render_card, AssetWarning, CardConfig,
    CardError, CardLayout, InputRecord, RowError, RunProgressCallback, RunStatus,
};
use flate2::read::ZlibDecoder;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Document, Object, ObjectId};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const HEADER: &[&str] = &["Name", "Course", "Year", "Team"];
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Write `rows` (first row is the header) to an .xlsx file. Empty strings leave the cell unset.
fn write_workbook(path: &Path, rows: &[&[&str]]) {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
    for (r, cells) in rows.iter().enumerate() {
        for (c, value) in cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let coord = format!("{}{}", (b'A' + c as u8) as char, r + 1);
            sheet.get_cell_mut(coord.as_str()).set_value_string(*value);
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn workbook(&self, rows: &[&[&str]]) -> String {
        let p = self.path("students.xlsx");
        write_workbook(&p, rows);
        p.to_string_lossy().to_string()
    }

    fn out_dir(&self) -> PathBuf {
        self.path("id_cards")
    }

    /// Config whose assets all point at files that do not exist.
    fn config(&self) -> cardsmith::CardConfigBuilder {
        CardConfig::builder()
            .output_dir(self.out_dir())
            .font_path(self.path("no-such-font.ttf"))
            .primary_logo_path(self.path("no-primary.png"))
            .secondary_logo_path(self.path("no-secondary.png"))
    }

    fn logo(&self, name: &str, w: u32, h: u32, color: [u8; 4]) -> PathBuf {
        let p = self.path(name);
        RgbaImage::from_pixel(w, h, Rgba(color)).save(&p).unwrap();
        p
    }
}

/// Decompressed RGB bytes of page `page_id`'s single image.
fn page_pixels(doc: &Document, page_id: ObjectId) -> Vec<u8> {
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
    let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
    // lopdf refuses to decode image streams itself.
    let mut raw = Vec::new();
    ZlibDecoder::new(stream.content.as_slice())
        .read_to_end(&mut raw)
        .unwrap();
    raw
}

fn number(o: &Object) -> f32 {
    match o {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r as f32,
        other => panic!("not a number: {other:?}"),
    }
}

fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let page = doc.get_dictionary(page_id).unwrap();
    let arr = page.get(b"MediaBox").unwrap().as_array().unwrap();
    [number(&arr[0]), number(&arr[1]), number(&arr[2]), number(&arr[3])]
}

fn page_image(doc: &Document, page_id: ObjectId, w: u32, h: u32) -> RgbImage {
    RgbImage::from_raw(w, h, page_pixels(doc, page_id)).expect("page image has canvas size")
}

/// First row in `[y0, y1)` with any non-white pixel.
fn first_ink_row(img: &RgbImage, y0: u32, y1: u32) -> Option<u32> {
    (y0..y1).find(|&y| (0..img.width()).any(|x| *img.get_pixel(x, y) != WHITE))
}

fn decode_qr(img: &RgbImage, x: u32, y: u32, size: u32) -> String {
    let crop = image::imageops::crop_imm(img, x, y, size, size).to_image();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        size as usize,
        size as usize,
        |px, py| crop.get_pixel(px as u32, py as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR grid");
    grids[0].decode().unwrap().1
}

// ── Document structure ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_one_page_per_row_in_sheet_order() {
    let fx = Fixture::new();
    let input = fx.workbook(&[
        HEADER,
        &["Asha Verma", "MBA", "2023", "Falcons"],
        &["Ravi Kumar", "BBA", "2024", "Hawks"],
        &["Meera Nair", "PGDM", "2022", "Owls"],
    ]);
    let config = fx.config().build().unwrap();
    let output = generate(&input, &config).await.unwrap();

    assert_eq!(output.status, RunStatus::Complete);
    assert_eq!(output.stats.rendered_rows, 3);
    assert_eq!(output.document_path, fx.out_dir().join("student_id_cards.pdf"));

    let doc = Document::load(&output.document_path).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);

    let layout = CardLayout::default();
    let assets = AssetSet::load(&config.asset_paths(), &layout);
    let records = [
        InputRecord::new("Asha Verma", "MBA", "2023", "Falcons"),
        InputRecord::new("Ravi Kumar", "BBA", "2024", "Hawks"),
        InputRecord::new("Meera Nair", "PGDM", "2022", "Owls"),
    ];
    for (i, record) in records.iter().enumerate() {
        let expected = render_card(record, &assets, &layout, &config.institute_label).unwrap();
        let page_id = pages[&(i as u32 + 1)];
        assert_eq!(media_box(&doc, page_id), [0.0, 0.0, 600.0, 1000.0]);
        assert!(
            page_pixels(&doc, page_id) == expected.image.as_raw().as_slice(),
            "page {} does not hold row {}'s card",
            i + 1,
            i + 2
        );
        assert_eq!(output.rows[i].page_num, Some(i + 1));
    }
}

#[tokio::test]
async fn test_qr_block_decodes_to_exact_payload() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha Verma", "MBA", "007", "Falcons"]]);
    let output = generate(&input, &fx.config().build().unwrap()).await.unwrap();

    let doc = Document::load(&output.document_path).unwrap();
    let page_id = doc.get_pages()[&1];
    let img = page_image(&doc, page_id, 600, 1000);
    assert_eq!(
        decode_qr(&img, 50, 750, 200),
        "Name: Asha Verma\nCourse: MBA\nYear: 007\nTeam: Falcons"
    );
}

#[test]
fn test_year_text_is_kept_verbatim() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "007", "Falcons"]]);
    let output = generate_sync(&input, &fx.config().build().unwrap()).unwrap();
    assert_eq!(output.status, RunStatus::Complete);

    let doc = Document::load(&output.document_path).unwrap();
    let img = page_image(&doc, doc.get_pages()[&1], 600, 1000);
    let payload = decode_qr(&img, 50, 750, 200);
    assert!(payload.contains("\nYear: 007\n"), "payload: {payload:?}");
}

// ── Assets ───────────────────────────────────────────────────────────────────

#[test]
fn test_canvas_size_for_every_logo_combination() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", "Falcons"]]);
    let primary = fx.logo("primary.png", 300, 100, [200, 0, 0, 255]);
    let secondary = fx.logo("secondary.png", 800, 240, [0, 0, 200, 255]);

    for (with_primary, with_secondary) in [(false, false), (true, false), (false, true), (true, true)] {
        let mut builder = fx.config().write_card_images(false);
        if with_primary {
            builder = builder.primary_logo_path(&primary);
        }
        if with_secondary {
            builder = builder.secondary_logo_path(&secondary);
        }
        let output = generate_sync(&input, &builder.build().unwrap()).unwrap();
        let logo_warnings = output
            .warnings
            .iter()
            .filter(|w| matches!(w, AssetWarning::LogoUnavailable { .. }))
            .count();
        assert_eq!(logo_warnings, 2 - with_primary as usize - with_secondary as usize);

        let doc = Document::load(&output.document_path).unwrap();
        let page_id = doc.get_pages()[&1];
        assert_eq!(media_box(&doc, page_id), [0.0, 0.0, 600.0, 1000.0]);
        let img = page_image(&doc, page_id, 600, 1000);

        assert_eq!(
            *img.get_pixel(100, 50) == WHITE,
            !with_primary,
            "primary logo slot (primary={with_primary})"
        );
        assert_eq!(
            *img.get_pixel(300, 200) == WHITE,
            !with_secondary,
            "secondary logo slot (secondary={with_secondary})"
        );
        // Detail block never moves, logo or not.
        assert_eq!(first_ink_row(&img, 261, 700), Some(320));
    }
}

#[test]
fn test_missing_logos_keep_detail_anchor() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", "Falcons"]]);
    let output = generate_sync(&input, &fx.config().build().unwrap()).unwrap();

    let doc = Document::load(&output.document_path).unwrap();
    let img = page_image(&doc, doc.get_pages()[&1], 600, 1000);
    // Nothing between the label and the detail block.
    assert_eq!(first_ink_row(&img, 120, 700), Some(320));
}

#[test]
fn test_missing_font_still_produces_text() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", "Falcons"]]);
    let output = generate_sync(&input, &fx.config().build().unwrap()).unwrap();
    assert!(output
        .warnings
        .iter()
        .any(|w| matches!(w, AssetWarning::FontUnavailable { .. })));

    let doc = Document::load(&output.document_path).unwrap();
    let img = page_image(&doc, doc.get_pages()[&1], 600, 1000);
    for y in [90, 320, 380, 440, 500] {
        assert!(
            first_ink_row(&img, y, y + 30).is_some(),
            "no ink in text band starting at y={y}"
        );
    }
}

#[test]
fn test_truetype_font_when_available() {
    let font = Path::new("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
    if !font.exists() {
        println!("SKIP: font not found: {}", font.display());
        return;
    }
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", "Falcons"]]);
    let output = generate_sync(&input, &fx.config().font_path(font).build().unwrap()).unwrap();
    assert!(!output
        .warnings
        .iter()
        .any(|w| matches!(w, AssetWarning::FontUnavailable { .. })));

    let doc = Document::load(&output.document_path).unwrap();
    let img = page_image(&doc, doc.get_pages()[&1], 600, 1000);
    assert!(first_ink_row(&img, 320, 370).is_some());
    assert_eq!(
        decode_qr(&img, 50, 750, 200),
        "Name: Asha\nCourse: MBA\nYear: 2023\nTeam: Falcons"
    );
}

// ── Row and run failures ─────────────────────────────────────────────────────

#[test]
fn test_row_missing_team_is_skipped() {
    let fx = Fixture::new();
    let input = fx.workbook(&[
        HEADER,
        &["Asha", "MBA", "2023", "Falcons"],
        &["Ravi", "BBA", "2024", ""],
        &["Meera", "PGDM", "2022", "Owls"],
    ]);
    let output = generate_sync(&input, &fx.config().build().unwrap()).unwrap();

    assert_eq!(output.status, RunStatus::Partial);
    assert_eq!(output.stats.rendered_rows, 2);
    assert_eq!(output.stats.failed_rows, 1);
    let failed: Vec<_> = output.failed_rows().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(
        failed[0].error,
        Some(RowError::MissingField {
            row: 3,
            field: "Team".into()
        })
    );
    assert_eq!(output.rows[2].page_num, Some(2));

    let doc = Document::load(&output.document_path).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    assert!(matches!(
        output.into_result(),
        Err(CardError::PartialFailure {
            success: 2,
            failed: 1,
            total: 3
        })
    ));
}

#[test]
fn test_missing_required_column_is_fatal() {
    let fx = Fixture::new();
    let input = fx.workbook(&[
        &["Name", "Course", "Year"],
        &["Asha", "MBA", "2023"],
    ]);
    let err = generate_sync(&input, &fx.config().build().unwrap()).unwrap_err();
    match err {
        CardError::MissingRequiredColumns { missing } => assert_eq!(missing, vec!["Team"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fx.out_dir().join("student_id_cards.pdf").exists());
}

#[test]
fn test_header_only_workbook_has_no_records() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER]);
    let err = generate_sync(&input, &fx.config().build().unwrap()).unwrap_err();
    assert!(matches!(err, CardError::NoRecords { .. }));
}

#[test]
fn test_all_rows_failing_writes_no_document() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "", "2023", "Falcons"], &["Ravi", "BBA", "", "Hawks"]]);
    let err = generate_sync(&input, &fx.config().build().unwrap()).unwrap_err();
    match err {
        CardError::AllRowsFailed { total, first_error } => {
            assert_eq!(total, 2);
            assert!(first_error.contains("Course"), "got: {first_error}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fx.out_dir().join("student_id_cards.pdf").exists());
}

#[test]
fn test_fail_fast_stops_at_first_bad_row() {
    let fx = Fixture::new();
    let input = fx.workbook(&[
        HEADER,
        &["Asha", "MBA", "2023", "Falcons"],
        &["Ravi", "", "2024", "Hawks"],
        &["Meera", "PGDM", "2022", "Owls"],
        &["Kiran", "MCA", "2021", "Lions"],
    ]);
    let output = generate_sync(&input, &fx.config().fail_fast(true).build().unwrap()).unwrap();
    assert_eq!(output.status, RunStatus::Aborted);
    assert_eq!(output.rows.len(), 2);
    assert_eq!(output.stats.rendered_rows, 1);
    assert_eq!(output.stats.skipped_rows, 2);

    let doc = Document::load(&output.document_path).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn test_non_workbook_input_is_rejected() {
    let fx = Fixture::new();
    let csv = fx.path("students.csv");
    std::fs::write(&csv, "Name,Course,Year,Team\nAsha,MBA,2023,Falcons\n").unwrap();
    let err = generate_sync(csv.to_string_lossy(), &fx.config().build().unwrap()).unwrap_err();
    assert!(matches!(err, CardError::NotAWorkbook { .. }));
}

// ── Outputs and options ──────────────────────────────────────────────────────

#[test]
fn test_card_images_are_written_with_unique_names() {
    let fx = Fixture::new();
    let input = fx.workbook(&[
        HEADER,
        &["Asha Verma", "MBA", "2023", "Falcons"],
        &["Asha Verma", "BBA", "2024", "Hawks"],
        &["R/K: Singh", "PGDM", "2022", "Owls"],
    ]);
    let output = generate_sync(&input, &fx.config().build().unwrap()).unwrap();
    let out = fx.out_dir();
    let paths: Vec<_> = output.rows.iter().map(|r| r.image_path.clone().unwrap()).collect();
    assert_eq!(
        paths,
        vec![
            out.join("Asha Verma.png"),
            out.join("Asha Verma-2.png"),
            out.join("R_K_ Singh.png"),
        ]
    );
    for p in &paths {
        let img = image::open(p).unwrap();
        assert_eq!((img.width(), img.height()), (600, 1000));
    }
}

#[test]
fn test_card_images_can_be_disabled() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", "Falcons"]]);
    let output =
        generate_sync(&input, &fx.config().write_card_images(false).build().unwrap()).unwrap();
    assert!(output.rows[0].image_path.is_none());
    let entries: Vec<_> = std::fs::read_dir(fx.out_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["student_id_cards.pdf"]);
}

#[test]
fn test_scaled_layout_changes_page_size() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", "Falcons"]]);
    let config = fx
        .config()
        .scale(0.5)
        .document_name("half.pdf")
        .build()
        .unwrap();
    let output = generate_sync(&input, &config).unwrap();
    assert_eq!(output.document_path, fx.out_dir().join("half.pdf"));

    let doc = Document::load(&output.document_path).unwrap();
    let page_id = doc.get_pages()[&1];
    assert_eq!(media_box(&doc, page_id), [0.0, 0.0, 300.0, 500.0]);
    let img = page_image(&doc, page_id, 300, 500);
    assert_eq!(first_ink_row(&img, 130, 350), Some(160));
}

#[test]
fn test_progress_callback_sees_every_row() {
    #[derive(Default)]
    struct Counter {
        started: AtomicUsize,
        completed: AtomicUsize,
        errors: AtomicUsize,
        warnings: AtomicUsize,
        success: AtomicUsize,
    }
    impl RunProgressCallback for Counter {
        fn on_asset_warning(&self, _w: &AssetWarning) {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }
        fn on_row_start(&self, _row: usize, _total: usize) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_row_complete(&self, _row: usize, _total: usize, _page: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_row_error(&self, _row: usize, _total: usize, _e: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_run_complete(&self, _total: usize, success: usize) {
            self.success.store(success, Ordering::SeqCst);
        }
    }

    let fx = Fixture::new();
    let input = fx.workbook(&[
        HEADER,
        &["Asha", "MBA", "2023", "Falcons"],
        &["Ravi", "BBA", "2024", ""],
    ]);
    let counter = Arc::new(Counter::default());
    let config = fx
        .config()
        .progress_callback(counter.clone() as Arc<dyn RunProgressCallback>)
        .build()
        .unwrap();
    generate_sync(&input, &config).unwrap();

    assert_eq!(counter.started.load(Ordering::SeqCst), 2);
    assert_eq!(counter.completed.load(Ordering::SeqCst), 1);
    assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counter.warnings.load(Ordering::SeqCst), 3);
    assert_eq!(counter.success.load(Ordering::SeqCst), 1);
}

#[test]
fn test_run_complete_fires_when_every_row_fails() {
    #[derive(Default)]
    struct Completion {
        calls: AtomicUsize,
        success: AtomicUsize,
    }
    impl RunProgressCallback for Completion {
        fn on_run_complete(&self, _total: usize, success: usize) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.success.store(success, Ordering::SeqCst);
        }
    }

    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "", "2023", "Falcons"]]);
    let completion = Arc::new(Completion::default());
    let config = fx
        .config()
        .progress_callback(completion.clone() as Arc<dyn RunProgressCallback>)
        .build()
        .unwrap();
    let err = generate_sync(&input, &config).unwrap_err();
    assert!(matches!(err, CardError::AllRowsFailed { .. }));
    assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    assert_eq!(completion.success.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_from_bytes() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", "Falcons"]]);
    let bytes = std::fs::read(&input).unwrap();
    let output = generate_from_bytes(&bytes, &fx.config().build().unwrap())
        .await
        .unwrap();
    assert_eq!(output.stats.rendered_rows, 1);
    assert!(output.document_path.exists());
}

#[tokio::test]
async fn test_inspect_reports_columns_and_preview() {
    let fx = Fixture::new();
    let input = fx.workbook(&[
        &["Name", "Course", "Year", "Email"],
        &["Asha", "MBA", "007", "asha@example.org"],
        &["Ravi", "BBA", "2024", ""],
    ]);
    let summary = inspect(&input, 120).await.unwrap();
    assert_eq!(summary.columns, vec!["Name", "Course", "Year", "Email"]);
    assert_eq!(summary.row_count, 2);
    assert_eq!(summary.missing_columns, vec!["Team"]);
    assert!(!summary.is_valid());
    assert_eq!(summary.preview[0].get("Year").map(String::as_str), Some("007"));
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    let err = inspect("/definitely/not/here.xlsx", 120).await.unwrap_err();
    assert!(matches!(err, CardError::InputNotFound { .. }));
}

#[test]
fn test_output_is_json_serialisable() {
    let fx = Fixture::new();
    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", ""]]);
    let err = generate_sync(&input, &fx.config().build().unwrap()).unwrap_err();
    assert!(matches!(err, CardError::AllRowsFailed { .. }));

    let input = fx.workbook(&[HEADER, &["Asha", "MBA", "2023", "Falcons"]]);
    let output = generate_sync(&input, &fx.config().build().unwrap()).unwrap();
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["status"], "complete");
    assert_eq!(json["stats"]["rendered_rows"], 1);
    assert_eq!(json["warnings"].as_array().unwrap().len(), 3);
}
