//! Text measurement and drawing for card labels.
//!
//! A [`FontHandle`] pairs a face with a pixel size. Two faces exist:
//!
//! * **TrueType**: any `.ttf`/`.otf` parsed by `rusttype`. The size is the
//!   em square in pixels, the same convention desktop imaging libraries use.
//! * **Built-in**: the 5×7 bitmap in [`crate::pipeline::glyphs`], scaled by
//!   a whole number of pixels. Used when the configured font is unavailable.
//!
//! In both cases `(x, y)` passed to [`FontHandle::draw_text`] is the top-left
//! of the line (the ascent line for TrueType faces).

use crate::pipeline::glyphs::{self, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use image::{Rgb, RgbImage};
use rusttype::{point, Font, GlyphId, Scale};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
enum Face {
    TrueType(Arc<Font<'static>>),
    Builtin,
}

/// A face at one pixel size.
#[derive(Clone)]
pub struct FontHandle {
    face: Face,
    px: f32,
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field(
                "face",
                &match self.face {
                    Face::TrueType(_) => "truetype",
                    Face::Builtin => "builtin",
                },
            )
            .field("px", &self.px)
            .finish()
    }
}

/// Parse TrueType/OpenType bytes; `None` if the data is not a usable font.
pub fn parse_font(bytes: Vec<u8>) -> Option<Arc<Font<'static>>> {
    Font::try_from_vec(bytes).map(Arc::new)
}

impl FontHandle {
    pub fn truetype(font: Arc<Font<'static>>, px: f32) -> Self {
        Self {
            face: Face::TrueType(font),
            px,
        }
    }

    pub fn builtin(px: f32) -> Self {
        Self {
            face: Face::Builtin,
            px,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.face, Face::Builtin)
    }

    /// Nominal size in pixels.
    pub fn px(&self) -> f32 {
        self.px
    }

    /// Integer magnification of the 5×7 bitmap for this size.
    fn builtin_scale(&self) -> u32 {
        ((self.px / 14.0).round() as u32).max(1)
    }

    fn rusttype_scale(font: &Font<'static>, px: f32) -> Scale {
        let vm = font.v_metrics_unscaled();
        let upem = f32::from(font.units_per_em().max(1));
        let line = vm.ascent - vm.descent;
        if line <= 0.0 {
            Scale::uniform(px)
        } else {
            Scale::uniform(px * line / upem)
        }
    }

    /// Rendered advance width of `text`, in pixels.
    pub fn text_width(&self, text: &str) -> f32 {
        match &self.face {
            Face::Builtin => {
                (text.chars().count() as u32 * GLYPH_ADVANCE * self.builtin_scale()) as f32
            }
            Face::TrueType(font) => {
                let scale = Self::rusttype_scale(font, self.px);
                let mut width = 0.0;
                let mut last: Option<GlyphId> = None;
                for ch in text.chars() {
                    let g = font.glyph(ch).scaled(scale);
                    if let Some(prev) = last {
                        width += font.pair_kerning(scale, prev, g.id());
                    }
                    width += g.h_metrics().advance_width;
                    last = Some(g.id());
                }
                width
            }
        }
    }

    /// Draw `text` with its top-left at `(x, y)`. Pixels outside the image are clipped.
    pub fn draw_text(&self, img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        match &self.face {
            Face::Builtin => self.draw_builtin(img, x, y, color, text),
            Face::TrueType(font) => Self::draw_truetype(font, self.px, img, x, y, color, text),
        }
    }

    fn draw_builtin(&self, img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        let s = self.builtin_scale() as i32;
        for (i, ch) in text.chars().enumerate() {
            let cx = x + i as i32 * GLYPH_ADVANCE as i32 * s;
            for col in 0..GLYPH_WIDTH {
                for row in 0..GLYPH_HEIGHT {
                    if !glyphs::is_set(ch, col, row) {
                        continue;
                    }
                    let px0 = cx + col as i32 * s;
                    let py0 = y + row as i32 * s;
                    for dy in 0..s {
                        for dx in 0..s {
                            put_pixel_clipped(img, px0 + dx, py0 + dy, color, 1.0);
                        }
                    }
                }
            }
        }
    }

    fn draw_truetype(
        font: &Font<'static>,
        px: f32,
        img: &mut RgbImage,
        x: i32,
        y: i32,
        color: Rgb<u8>,
        text: &str,
    ) {
        let scale = Self::rusttype_scale(font, px);
        let v_metrics = font.v_metrics(scale);
        let baseline_y = y as f32 + v_metrics.ascent;
        let mut caret_x = x as f32;
        let mut last: Option<GlyphId> = None;

        for ch in text.chars() {
            let scaled = font.glyph(ch).scaled(scale);
            if let Some(prev) = last {
                caret_x += font.pair_kerning(scale, prev, scaled.id());
            }
            let advance = scaled.h_metrics().advance_width;
            last = Some(scaled.id());

            let glyph = scaled.positioned(point(caret_x, baseline_y));
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    put_pixel_clipped(
                        img,
                        gx as i32 + bb.min.x,
                        gy as i32 + bb.min.y,
                        color,
                        coverage,
                    );
                });
            }
            caret_x += advance;
        }
    }
}

/// Blend `color` over the pixel at `(x, y)` with the given coverage, ignoring out-of-bounds writes.
fn put_pixel_clipped(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= img.width() || y >= img.height() {
        return;
    }
    let a = coverage.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let inv = 1.0 - a;
    let dst = img.get_pixel_mut(x, y);
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * a + dst.0[c] as f32 * inv).round() as u8;
    }
}
