//! Registry overlay rendering for diagnostics.

use crate::domain::category::Category;
use crate::domain::registry::DetectionRegistry;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Box color for a category overlay.
fn category_color(category: Category) -> Rgb<u8> {
    match category {
        Category::Bar => Rgb([0, 180, 0]),
        Category::Uptail => Rgb([0, 120, 220]),
        Category::Yaxis | Category::Xaxis => Rgb([220, 0, 0]),
        Category::Origin | Category::Ymax => Rgb([220, 140, 0]),
        Category::Label | Category::XGroup => Rgb([140, 0, 200]),
        Category::Legend | Category::LegendGroup => Rgb([120, 120, 120]),
    }
}

/// Draws every registry entity as a hollow rectangle onto a copy of the
/// source image, color-keyed by category. Boxes that fall outside the
/// image are skipped.
pub fn draw_registry_overlay(image: &RgbImage, registry: &DetectionRegistry) -> RgbImage {
    let mut canvas = image.clone();
    let (width, height) = canvas.dimensions();

    for (category, bucket) in registry.all_boxes() {
        let color = category_color(*category);
        for entity in bucket {
            let x = entity.bbox.x1().max(0.0) as i32;
            let y = entity.bbox.y1().max(0.0) as i32;
            let w = entity.bbox.width() as u32;
            let h = entity.bbox.height() as u32;
            if w == 0 || h == 0 || x >= width as i32 || y >= height as i32 {
                continue;
            }
            draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), color);
        }
    }

    canvas
}
