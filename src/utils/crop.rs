//! Region cropping for text recognition.

use crate::processors::geometry::BoundingBox;
use image::{imageops, RgbImage};

/// Crops `bbox` out of `image` with `padding` extra pixels on every
/// side, clamped to the image bounds.
///
/// Coordinates are truncated to whole pixels the way the detector's
/// float output is conventionally rasterized. The box invariant
/// guarantees a non-empty region as long as the box overlaps the image
/// at all; a box entirely outside the image yields a 1x1 region at the
/// nearest corner rather than panicking.
pub fn crop_with_padding(image: &RgbImage, bbox: &BoundingBox, padding: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let pad = padding as f32;

    let x1 = ((bbox.x1() - pad).max(0.0) as u32).min(width.saturating_sub(1));
    let y1 = ((bbox.y1() - pad).max(0.0) as u32).min(height.saturating_sub(1));
    let x2 = ((bbox.x2() + pad).max(0.0) as u32).min(width);
    let y2 = ((bbox.y2() + pad).max(0.0) as u32).min(height);

    let crop_width = (x2.saturating_sub(x1)).max(1);
    let crop_height = (y2.saturating_sub(y1)).max(1);

    imageops::crop_imm(image, x1, y1, crop_width, crop_height).to_image()
}

/// Rotates a region 90 degrees clockwise.
///
/// Used before recognizing the chart title, which is printed bottom-up
/// along the y-axis.
pub fn rotate_clockwise(image: &RgbImage) -> RgbImage {
    imageops::rotate90(image)
}
