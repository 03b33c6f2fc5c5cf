//! Analyzer configuration.

use crate::core::constants::DEFAULT_CROP_PADDING;
use serde::{Deserialize, Serialize};

/// Configuration for a chart analyzer instance.
///
/// The defaults match the lenient interactive workflow: ingestion accepts
/// whatever the detector produced and completeness is checked on demand,
/// so an operator can repair a partial detection by hand. Strict mode is
/// for batch callers that would rather fail fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// When true, ingestion rejects detection sets whose single-instance
    /// categories (y-axis, x-axis, origin, ymax) are missing or
    /// duplicated, and leaves the previous registry untouched.
    pub strict_ingest: bool,
    /// Pixels of margin added around a box before cropping it for text
    /// recognition. Clamped to image bounds at crop time.
    pub crop_padding: u32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            strict_ingest: false,
            crop_padding: DEFAULT_CROP_PADDING,
        }
    }
}

impl AnalyzerConfig {
    /// Creates a configuration with the default lenient settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables strict ingestion.
    pub fn with_strict_ingest(mut self, strict: bool) -> Self {
        self.strict_ingest = strict;
        self
    }

    /// Overrides the crop padding used by the text extraction adapter.
    pub fn with_crop_padding(mut self, padding: u32) -> Self {
        self.crop_padding = padding;
        self
    }
}
