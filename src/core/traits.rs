//! Trait seams for external collaborators.
//!
//! The analyzer does not run character recognition itself. It talks to an
//! engine through [`TextRecognizer`], which receives an already cropped
//! (and, where needed, rotated) region and returns whatever text the
//! engine read. Implementations are expected to bound their own latency;
//! an engine failure surfaces as a recoverable error and never corrupts
//! registry state.

use crate::core::errors::ChartResult;
use image::RgbImage;

/// Recognition configuration for a single region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Free-form text, e.g. axis titles and group labels.
    GeneralText,
    /// Digits and decimal points only, e.g. the origin and ymax values.
    DigitsOnly,
}

/// A character recognition engine.
///
/// The region handed to `recognize` is a tight crop around one detected
/// element, already padded and rotated upright by the adapter. The
/// returned text is raw engine output; trimming and numeric token
/// extraction happen in the adapter.
pub trait TextRecognizer: Send + Sync {
    /// Reads the text in `region` under the given mode.
    ///
    /// An empty string is a valid result and means the engine saw no
    /// text. Errors are reserved for engine failures (timeouts, broken
    /// sessions) and are recoverable by the caller.
    fn recognize(&self, region: &RgbImage, mode: OcrMode) -> ChartResult<String>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize(&self, region: &RgbImage, mode: OcrMode) -> ChartResult<String> {
        (**self).recognize(region, mode)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, region: &RgbImage, mode: OcrMode) -> ChartResult<String> {
        (**self).recognize(region, mode)
    }
}
