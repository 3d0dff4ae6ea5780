//! Output document: one PDF page per card.
//!
//! Each page is a single Flate-compressed DeviceRGB image XObject stretched
//! over a MediaBox the size of the canvas, so one card pixel is one PDF unit.
//! Pages are serialised as they are appended; only the page tree and catalog
//! are left for [`CardDocument::finalize`], which writes the whole file to a
//! sibling temp path and renames it into place.

use crate::error::{CardError, RowError};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// A PDF being assembled. Exclusively owned by one run.
pub struct CardDocument {
    path: PathBuf,
    page_size: (u32, u32),
    pdf: Pdf,
    catalog_id: Ref,
    page_tree_id: Ref,
    pages: Vec<Ref>,
    next_ref_id: i32,
}

impl CardDocument {
    /// Start a document at `path`, creating its parent directory.
    pub fn open(path: impl AsRef<Path>, page_size: (u32, u32)) -> Result<Self, CardError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CardError::OutputWriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);

        debug!("Opened document {}", path.display());
        Ok(Self {
            path,
            page_size,
            pdf,
            catalog_id,
            page_tree_id,
            pages: Vec::new(),
            next_ref_id: 3,
        })
    }

    fn next_ref(&mut self) -> Ref {
        let r = Ref::new(self.next_ref_id);
        self.next_ref_id += 1;
        r
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append `card` as a new page and return its 1-based page number.
    ///
    /// `row` only labels the error; a failed append leaves the document unchanged.
    pub fn append_page(&mut self, row: usize, card: &RgbImage) -> Result<usize, RowError> {
        let data = flate_compress(card.as_raw()).map_err(|e| RowError::PageAppendFailed {
            row,
            detail: format!("compressing page image: {e}"),
        })?;

        let image_id = self.next_ref();
        let content_id = self.next_ref();
        let page_id = self.next_ref();
        let (pw, ph) = (self.page_size.0 as f32, self.page_size.1 as f32);

        let mut image = self.pdf.image_xobject(image_id, &data);
        image.filter(Filter::FlateDecode);
        image.width(card.width() as i32);
        image.height(card.height() as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        let mut content = Content::new();
        content.save_state();
        content.transform([pw, 0.0, 0.0, ph, 0.0, 0.0]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        self.pdf.stream(content_id, &content.finish());

        let mut page = self.pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, pw, ph));
        page.parent(self.page_tree_id);
        page.contents(content_id);
        page.resources().x_objects().pair(IMAGE_NAME, image_id);
        page.finish();

        self.pages.push(page_id);
        Ok(self.pages.len())
    }

    /// Append a card previously written to disk.
    pub fn append_image_file(&mut self, row: usize, path: &Path) -> Result<usize, RowError> {
        let img = image::open(path).map_err(|e| RowError::PageAppendFailed {
            row,
            detail: format!("{}: {}", path.display(), e),
        })?;
        self.append_page(row, &img.to_rgb8())
    }

    /// Write the page tree and move the finished file into place.
    pub fn finalize(mut self) -> Result<PathBuf, CardError> {
        let count = self.pages.len() as i32;
        self.pdf
            .pages(self.page_tree_id)
            .kids(self.pages.iter().copied())
            .count(count);
        debug!(
            "Finalising document (catalog {:?}, {} pages)",
            self.catalog_id, count
        );
        let bytes = self.pdf.finish();

        let write_err = |source| CardError::DocumentWriteFailed {
            path: self.path.clone(),
            source,
        };
        let tmp_path = self.path.with_extension("pdf.tmp");
        std::fs::write(&tmp_path, &bytes).map_err(write_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        info!(
            "Wrote {} ({} pages, {} bytes)",
            self.path.display(),
            count,
            bytes.len()
        );
        Ok(self.path)
    }
}

fn flate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(r: u8) -> RgbImage {
        RgbImage::from_pixel(60, 100, Rgb([r, 0, 0]))
    }

    #[test]
    fn pages_are_numbered_in_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = CardDocument::open(dir.path().join("out/cards.pdf"), (60, 100)).unwrap();
        assert_eq!(doc.append_page(2, &solid(10)).unwrap(), 1);
        assert_eq!(doc.append_page(3, &solid(20)).unwrap(), 2);
        assert_eq!(doc.page_count(), 2);
        let path = doc.finalize().unwrap();
        assert!(path.ends_with("out/cards.pdf"));

        let pdf = lopdf::Document::load(&path).unwrap();
        assert_eq!(pdf.get_pages().len(), 2);
        assert!(!dir.path().join("out/cards.pdf.tmp").exists());
    }

    #[test]
    fn finalized_file_is_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = CardDocument::open(dir.path().join("cards.pdf"), (60, 100)).unwrap();
        doc.append_page(2, &solid(0)).unwrap();
        let path = doc.finalize().unwrap();
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn page_image_inflates_to_card_pixels() {
        use std::io::Read;

        let dir = tempfile::tempdir().unwrap();
        let card = RgbImage::from_fn(60, 100, |x, y| Rgb([x as u8, y as u8, 7]));
        let mut doc = CardDocument::open(dir.path().join("cards.pdf"), (60, 100)).unwrap();
        doc.append_page(2, &card).unwrap();
        let path = doc.finalize().unwrap();

        let pdf = lopdf::Document::load(&path).unwrap();
        let page_id = pdf.get_pages()[&1];
        let page = pdf.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
        let stream = pdf.get_object(image_id).unwrap().as_stream().unwrap();

        let mut raw = Vec::new();
        flate2::read::ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut raw)
            .unwrap();
        assert_eq!(raw, card.into_raw());
    }

    #[test]
    fn unreadable_card_image_is_a_row_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = CardDocument::open(dir.path().join("cards.pdf"), (60, 100)).unwrap();
        let err = doc
            .append_image_file(4, &dir.path().join("nope.png"))
            .unwrap_err();
        assert!(matches!(err, RowError::PageAppendFailed { row: 4, .. }));
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn persisted_card_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("card.png");
        solid(200).save(&png).unwrap();
        let mut doc = CardDocument::open(dir.path().join("cards.pdf"), (60, 100)).unwrap();
        assert_eq!(doc.append_image_file(2, &png).unwrap(), 1);
    }

    #[test]
    fn unwritable_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let err = CardDocument::open(blocker.join("cards.pdf"), (60, 100))
            .err()
            .unwrap();
        assert!(matches!(err, CardError::OutputWriteFailed { .. }));
    }
}
