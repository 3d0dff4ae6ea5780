//! Fixed card geometry.
//!
//! Every offset the renderer uses lives in [`CardLayout`], expressed in
//! canonical units on a 600 × 1000 canvas. Positions that depend on other
//! elements (label below the primary logo, secondary logo below the label,
//! detail block below the secondary logo) are derived by the accessor methods
//! from the *nominal* slot of the element above, whether or not that element
//! was actually drawn.
//!
//! ```text
//!  (30,30) ┌──────┐ primary logo 150×50
//!          └──────┘
//!   y=90      sirifort institute of management studies     (centred)
//!  (100,140) ┌──────────────────────────┐ secondary logo 400×120
//!            └──────────────────────────┘
//!  (50,320)  Name: …
//!  (50,380)  Course: …
//!  (50,440)  Year: …
//!  (50,500)  Team: …
//!  (50,750)  ┌────────┐  (300,750) ┌───────────┐
//!            │   QR   │            └───────────┘ (550,800) signature
//!            └────────┘ 200×200
//! ```

use serde::{Deserialize, Serialize};

/// Integer pixel rectangle (`x`, `y` is the top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// The complete layout table for one card design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Top-left logo slot.
    pub primary_logo: Rect,

    /// Gap between the top of the primary logo slot and the label's top line.
    pub label_offset: u32,
    pub label_font_px: f32,

    pub secondary_logo_x: u32,
    /// Gap between the label's top line and the secondary logo.
    pub secondary_logo_gap: u32,
    pub secondary_logo_width: u32,
    pub secondary_logo_height: u32,

    pub detail_x: u32,
    /// Gap between the top of the secondary logo slot and the first detail line.
    pub detail_gap: u32,
    pub detail_line_step: u32,
    pub detail_font_px: f32,

    pub qr_x: u32,
    /// Distance from the bottom edge of the canvas to the top of the QR block.
    pub qr_bottom_offset: u32,
    pub qr_size: u32,

    pub signature_x0: u32,
    pub signature_x1: u32,
    /// Distance from the bottom edge to the box's top edge.
    pub signature_top_offset: u32,
    /// Distance from the bottom edge to the box's bottom edge.
    pub signature_bottom_offset: u32,
    pub signature_stroke: u32,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            canvas_width: 600,
            canvas_height: 1000,
            primary_logo: Rect::new(30, 30, 150, 50),
            label_offset: 60,
            label_font_px: 28.0,
            secondary_logo_x: 100,
            secondary_logo_gap: 50,
            secondary_logo_width: 400,
            secondary_logo_height: 120,
            detail_x: 50,
            detail_gap: 180,
            detail_line_step: 60,
            detail_font_px: 40.0,
            qr_x: 50,
            qr_bottom_offset: 250,
            qr_size: 200,
            signature_x0: 300,
            signature_x1: 550,
            signature_top_offset: 250,
            signature_bottom_offset: 200,
            signature_stroke: 3,
        }
    }
}

/// Smallest and largest accepted scale factors.
pub const SCALE_RANGE: (f32, f32) = (0.25, 4.0);

impl CardLayout {
    /// Canvas (and PDF page) size as `(width, height)`.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Top line of the institute label.
    pub fn label_y(&self) -> u32 {
        self.primary_logo.y + self.label_offset
    }

    /// Nominal slot of the secondary logo.
    pub fn secondary_logo(&self) -> Rect {
        Rect::new(
            self.secondary_logo_x,
            self.label_y() + self.secondary_logo_gap,
            self.secondary_logo_width,
            self.secondary_logo_height,
        )
    }

    /// Top-left of the first detail line, anchored to the secondary logo slot.
    pub fn detail_origin(&self) -> (u32, u32) {
        (self.detail_x, self.secondary_logo().y + self.detail_gap)
    }

    /// Top line of detail line `index` (0 = Name … 3 = Team).
    pub fn detail_line_y(&self, index: usize) -> u32 {
        self.detail_origin().1 + self.detail_line_step * index as u32
    }

    pub fn qr_block(&self) -> Rect {
        Rect::new(
            self.qr_x,
            self.canvas_height.saturating_sub(self.qr_bottom_offset),
            self.qr_size,
            self.qr_size,
        )
    }

    /// Signature box corners `(x0, y0, x1, y1)`, both inclusive.
    pub fn signature_box(&self) -> (u32, u32, u32, u32) {
        (
            self.signature_x0,
            self.canvas_height.saturating_sub(self.signature_top_offset),
            self.signature_x1,
            self.canvas_height.saturating_sub(self.signature_bottom_offset),
        )
    }

    /// Proportionally rescale every offset, size and font size.
    ///
    /// `factor` is clamped to [`SCALE_RANGE`]. Relative ordering and spacing
    /// ratios are preserved; rounding happens per field.
    pub fn scaled(&self, factor: f32) -> Self {
        let f = factor.clamp(SCALE_RANGE.0, SCALE_RANGE.1);
        let s = |v: u32| ((v as f32) * f).round() as u32;
        Self {
            canvas_width: s(self.canvas_width),
            canvas_height: s(self.canvas_height),
            primary_logo: Rect::new(
                s(self.primary_logo.x),
                s(self.primary_logo.y),
                s(self.primary_logo.width),
                s(self.primary_logo.height),
            ),
            label_offset: s(self.label_offset),
            label_font_px: self.label_font_px * f,
            secondary_logo_x: s(self.secondary_logo_x),
            secondary_logo_gap: s(self.secondary_logo_gap),
            secondary_logo_width: s(self.secondary_logo_width),
            secondary_logo_height: s(self.secondary_logo_height),
            detail_x: s(self.detail_x),
            detail_gap: s(self.detail_gap),
            detail_line_step: s(self.detail_line_step),
            detail_font_px: self.detail_font_px * f,
            qr_x: s(self.qr_x),
            qr_bottom_offset: s(self.qr_bottom_offset),
            qr_size: s(self.qr_size),
            signature_x0: s(self.signature_x0),
            signature_x1: s(self.signature_x1),
            signature_top_offset: s(self.signature_top_offset),
            signature_bottom_offset: s(self.signature_bottom_offset),
            signature_stroke: s(self.signature_stroke).max(1),
        }
    }
}
