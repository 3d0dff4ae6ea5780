//! Asset loading: font and logos, each with a fallback.
//!
//! Assets are loaded once per run. A missing or undecodable asset never stops
//! the run; it is replaced (font) or dropped (logo) and an [`AssetWarning`] is
//! recorded so the caller can surface it.

use crate::error::{AssetWarning, LogoSlot};
use crate::layout::{CardLayout, Rect};
use crate::pipeline::font::{parse_font, FontHandle};
use image::imageops::FilterType;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where to find the font and the two logos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub font: PathBuf,
    pub primary_logo: PathBuf,
    pub secondary_logo: PathBuf,
}

/// Everything the renderer needs besides the record itself.
///
/// Logos are already resized to their slot, so rendering a row never touches
/// the filesystem.
#[derive(Debug, Clone)]
pub struct AssetSet {
    /// Detail lines.
    pub font_large: FontHandle,
    /// Institute label.
    pub font_small: FontHandle,
    pub primary_logo: Option<RgbaImage>,
    pub secondary_logo: Option<RgbaImage>,
    pub warnings: Vec<AssetWarning>,
}

impl AssetSet {
    /// Load every asset for `layout`, substituting fallbacks where needed.
    pub fn load(paths: &AssetPaths, layout: &CardLayout) -> Self {
        let mut loader = AssetLoader::default();
        let (font_large, font_small) =
            loader.load_font(&paths.font, layout.detail_font_px, layout.label_font_px);
        let primary_logo = loader.load_logo(LogoSlot::Primary, &paths.primary_logo, layout.primary_logo);
        let secondary_logo =
            loader.load_logo(LogoSlot::Secondary, &paths.secondary_logo, layout.secondary_logo());
        Self {
            font_large,
            font_small,
            primary_logo,
            secondary_logo,
            warnings: loader.finish(),
        }
    }

    /// Built-in font and no logos; what a run with no assets on disk ends up with.
    pub fn fallback(layout: &CardLayout) -> Self {
        Self {
            font_large: FontHandle::builtin(layout.detail_font_px),
            font_small: FontHandle::builtin(layout.label_font_px),
            primary_logo: None,
            secondary_logo: None,
            warnings: Vec::new(),
        }
    }
}

/// Collects warnings while assets are loaded.
#[derive(Debug, Default)]
pub struct AssetLoader {
    warnings: Vec<AssetWarning>,
}

impl AssetLoader {
    /// Load `path` at two sizes, or the built-in face at both if it cannot be used.
    pub fn load_font(&mut self, path: &Path, large_px: f32, small_px: f32) -> (FontHandle, FontHandle) {
        let parsed = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| parse_font(bytes).ok_or_else(|| "not a TrueType/OpenType font".to_string()));

        match parsed {
            Ok(font) => {
                debug!("Loaded font {}", path.display());
                (
                    FontHandle::truetype(font.clone(), large_px),
                    FontHandle::truetype(font, small_px),
                )
            }
            Err(detail) => {
                self.push(AssetWarning::FontUnavailable {
                    path: path.to_path_buf(),
                    detail,
                });
                (FontHandle::builtin(large_px), FontHandle::builtin(small_px))
            }
        }
    }

    /// Decode a logo and resize it to exactly fill `slot`; `None` if unusable.
    pub fn load_logo(&mut self, slot: LogoSlot, path: &Path, rect: Rect) -> Option<RgbaImage> {
        match image::open(path) {
            Ok(img) => {
                debug!(
                    "Loaded {} logo {} ({}x{} → {}x{})",
                    slot,
                    path.display(),
                    img.width(),
                    img.height(),
                    rect.width,
                    rect.height
                );
                let rgba = img.to_rgba8();
                Some(image::imageops::resize(
                    &rgba,
                    rect.width.max(1),
                    rect.height.max(1),
                    FilterType::CatmullRom,
                ))
            }
            Err(e) => {
                self.push(AssetWarning::LogoUnavailable {
                    slot,
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                });
                None
            }
        }
    }

    fn push(&mut self, warning: AssetWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn finish(self) -> Vec<AssetWarning> {
        self.warnings
    }
}
