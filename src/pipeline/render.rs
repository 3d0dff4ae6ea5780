//! Card rendering: one [`InputRecord`] → one RGB canvas.
//!
//! Drawing order is fixed and later elements paint over earlier ones:
//! primary logo, institute label, secondary logo, the four detail lines,
//! QR block, signature box. Element positions come from [`CardLayout`] and
//! never depend on whether a logo was actually present.

use crate::layout::CardLayout;
use crate::pipeline::assets::AssetSet;
use crate::pipeline::normalize::InputRecord;
use crate::pipeline::qr;
use image::{Rgb, RgbImage, RgbaImage};
use thiserror::Error;
use tracing::debug;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Why a single card could not be drawn.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),
}

/// A finished card and the text that went into it.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    pub image: RgbImage,
    /// Exactly what the QR block encodes.
    pub qr_payload: String,
    /// The four `"Label: value"` lines, top to bottom.
    pub detail_lines: [String; 4],
}

/// Draw one card.
pub fn render_card(
    record: &InputRecord,
    assets: &AssetSet,
    layout: &CardLayout,
    institute_label: &str,
) -> Result<RenderedCard, RenderError> {
    let (w, h) = layout.canvas_size();
    let mut card = RgbImage::from_pixel(w, h, WHITE);

    if let Some(logo) = &assets.primary_logo {
        paste_with_alpha(&mut card, logo, layout.primary_logo.x, layout.primary_logo.y);
    }

    let label_width = assets.font_small.text_width(institute_label);
    let label_x = ((w as f32 - label_width) / 2.0).floor() as i32;
    assets
        .font_small
        .draw_text(&mut card, label_x, layout.label_y() as i32, BLACK, institute_label);

    if let Some(logo) = &assets.secondary_logo {
        let slot = layout.secondary_logo();
        paste_with_alpha(&mut card, logo, slot.x, slot.y);
    }

    let detail_lines = record.detail_lines();
    for (i, line) in detail_lines.iter().enumerate() {
        assets.font_large.draw_text(
            &mut card,
            layout.detail_x as i32,
            layout.detail_line_y(i) as i32,
            BLACK,
            line,
        );
    }

    let qr_payload = record.qr_payload();
    let block = layout.qr_block();
    let code = qr::qr_image(&qr_payload, block.width)?;
    image::imageops::replace(&mut card, &code, block.x as i64, block.y as i64);

    draw_hollow_rect(&mut card, layout.signature_box(), layout.signature_stroke, BLACK);

    debug!("Rendered card for '{}'", record.name);
    Ok(RenderedCard {
        image: card,
        qr_payload,
        detail_lines,
    })
}

/// Composite `over` onto `base` at `(x, y)` using its alpha channel. Clipped at the edges.
pub fn paste_with_alpha(base: &mut RgbImage, over: &RgbaImage, x: u32, y: u32) {
    for oy in 0..over.height() {
        for ox in 0..over.width() {
            let p = over.get_pixel(ox, oy);
            let a = p.0[3] as f32 / 255.0;
            if a <= 0.0 {
                continue;
            }
            let bx = x + ox;
            let by = y + oy;
            if bx >= base.width() || by >= base.height() {
                continue;
            }
            let dst = base.get_pixel_mut(bx, by);
            let inv = 1.0 - a;
            for c in 0..3 {
                dst.0[c] = (p.0[c] as f32 * a + dst.0[c] as f32 * inv).round() as u8;
            }
        }
    }
}

/// Outline the inclusive box `(x0, y0, x1, y1)`; the stroke grows inward.
pub fn draw_hollow_rect(img: &mut RgbImage, (x0, y0, x1, y1): (u32, u32, u32, u32), stroke: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    for y in y0..=y1 {
        for x in x0..=x1 {
            if x >= w || y >= h {
                continue;
            }
            let inside = x >= x0 + stroke
                && y >= y0 + stroke
                && x + stroke <= x1
                && y + stroke <= y1;
            if !inside {
                img.put_pixel(x, y, color);
            }
        }
    }
}
