//! QR block: payload text → square black-on-white image.

use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};

/// Pixels per module before the final resize.
pub const MODULE_PX: u32 = 10;
/// Quiet zone on each side, in modules.
pub const QUIET_ZONE: u32 = 4;

const DARK: Rgb<u8> = Rgb([0, 0, 0]);
const LIGHT: Rgb<u8> = Rgb([255, 255, 255]);

/// Encode `payload` at error-correction level M, using the smallest version that fits.
///
/// The symbol is drawn at [`MODULE_PX`] per module with a [`QUIET_ZONE`]
/// border, then resized with nearest-neighbour sampling to `size`×`size`.
pub fn qr_image(payload: &str, size: u32) -> Result<RgbImage, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)?;
    let modules = code.width() as u32;
    let colors = code.to_colors();

    let side = (modules + 2 * QUIET_ZONE) * MODULE_PX;
    let mut img = RgbImage::from_pixel(side, side, LIGHT);
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = i as u32 % modules + QUIET_ZONE;
        let my = i as u32 / modules + QUIET_ZONE;
        for dy in 0..MODULE_PX {
            for dx in 0..MODULE_PX {
                img.put_pixel(mx * MODULE_PX + dx, my * MODULE_PX + dy, DARK);
            }
        }
    }

    if side == size {
        Ok(img)
    } else {
        Ok(image::imageops::resize(&img, size.max(1), size.max(1), FilterType::Nearest))
    }
}
