//! The text extraction adapter.
//!
//! Thin translation layer between registry entities and the external
//! recognition engine: it crops the entity's region out of the source
//! image (with padding, clamped to the frame), rotates vertical text
//! upright, invokes the engine in the right mode, and normalizes the
//! output. Whether a numeric result actually converts to a number is
//! the calibration layer's concern, not this one's.

use crate::core::constants::DEFAULT_CROP_PADDING;
use crate::core::errors::ChartResult;
use crate::core::traits::{OcrMode, TextRecognizer};
use crate::processors::geometry::BoundingBox;
use crate::utils::crop::{crop_with_padding, rotate_clockwise};
use image::RgbImage;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;

/// Matches the first decimal or integer token in engine output.
static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d+|\d+").expect("numeric token pattern is valid"));

/// Extracts text from detection regions via a recognition engine.
#[derive(Debug)]
pub struct TextExtractor<R> {
    engine: R,
    padding: u32,
}

impl<R: TextRecognizer> TextExtractor<R> {
    /// Creates an extractor with the default crop padding.
    pub fn new(engine: R) -> Self {
        Self {
            engine,
            padding: DEFAULT_CROP_PADDING,
        }
    }

    /// Overrides the crop padding.
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Reads general text from an entity region.
    ///
    /// With `rotate` set the crop is turned 90 degrees clockwise first,
    /// which puts a bottom-up chart title the right way round.
    pub fn extract_text(
        &self,
        image: &RgbImage,
        bbox: &BoundingBox,
        rotate: bool,
    ) -> ChartResult<String> {
        let mut region = crop_with_padding(image, bbox, self.padding);
        if rotate {
            region = rotate_clockwise(&region);
        }
        let text = self.engine.recognize(&region, OcrMode::GeneralText)?;
        Ok(text.trim().to_string())
    }

    /// Reads a numeric value from an entity region.
    ///
    /// Returns the first integer or decimal token in the engine output,
    /// or the empty string when the engine saw none. No conversion is
    /// attempted here.
    pub fn extract_number(&self, image: &RgbImage, bbox: &BoundingBox) -> ChartResult<String> {
        let region = crop_with_padding(image, bbox, self.padding);
        let text = self.engine.recognize(&region, OcrMode::DigitsOnly)?;
        Ok(NUMERIC_TOKEN
            .find(&text)
            .map(|token| token.as_str().to_string())
            .unwrap_or_default())
    }

    /// Reads general text from several regions, preserving order.
    ///
    /// Engine calls are the only slow operation in the pipeline, so the
    /// regions are recognized in parallel.
    pub fn extract_labels(
        &self,
        image: &RgbImage,
        boxes: &[BoundingBox],
    ) -> ChartResult<Vec<String>> {
        boxes
            .par_iter()
            .map(|bbox| self.extract_text(image, bbox, false))
            .collect()
    }
}
