use anyhow::{Context, Result};
use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::path::Path;

/// Feedback form shown to clients when their equipment is picked up.
pub const FEEDBACK_FORM_URL: &str =
    "https://docs.google.com/forms/d/e/1FAIpQLSdhZcExx6LSIXxk0ub55mSu-WIh23WYdGG9HY5EZhLDo7P8eA/viewform";

const MODULE_SIZE: u32 = 10;
const QUIET_ZONE: u32 = 4;

pub fn default_filename(request_id: Option<i32>) -> String {
    match request_id {
        Some(id) => format!("qr_code_{id}.png"),
        None => "qr_code_quality_form.png".to_string(),
    }
}

/// Encodes `text` at error-correction level H and paints the module matrix
/// black on white, 10 px per module with a 4-module quiet zone.
pub fn render(text: &str) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H)
        .context("Failed to encode QR code")?;

    let width = code.width() as u32;
    let image_size = (width + QUIET_ZONE * 2) * MODULE_SIZE;
    let mut image = GrayImage::from_pixel(image_size, image_size, Luma([255u8]));

    for (idx, color) in code.to_colors().into_iter().enumerate() {
        if color == Color::Dark {
            let row = idx as u32 / width;
            let col = idx as u32 % width;
            let x0 = (col + QUIET_ZONE) * MODULE_SIZE;
            let y0 = (row + QUIET_ZONE) * MODULE_SIZE;
            for dy in 0..MODULE_SIZE {
                for dx in 0..MODULE_SIZE {
                    image.put_pixel(x0 + dx, y0 + dy, Luma([0u8]));
                }
            }
        }
    }

    Ok(image)
}

pub fn save_png(text: &str, path: &Path) -> Result<()> {
    let image = render(text)?;
    image
        .save(path)
        .with_context(|| format!("Failed to save QR code to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_defaults() {
        assert_eq!(default_filename(Some(123)), "qr_code_123.png");
        assert_eq!(default_filename(None), "qr_code_quality_form.png");
    }

    #[test]
    fn rendered_image_has_module_geometry() {
        let image = render("test").unwrap();
        // Smallest symbol is 21 modules; plus two 4-module quiet zones.
        assert!(image.width() >= (21 + 2 * QUIET_ZONE) * MODULE_SIZE);
        assert_eq!(image.width() % MODULE_SIZE, 0);
        assert_eq!(image.width(), image.height());
    }

    #[test]
    fn quiet_zone_is_white_and_finder_is_black() {
        let image = render(FEEDBACK_FORM_URL).unwrap();
        assert_eq!(image.get_pixel(0, 0).0[0], 255);
        // Top-left finder pattern always starts with a dark module.
        let inside = QUIET_ZONE * MODULE_SIZE + MODULE_SIZE / 2;
        assert_eq!(image.get_pixel(inside, inside).0[0], 0);
    }
}
