//! Constants shared across the analysis pipeline.

/// Extra pixels included around a detection box when cropping a region
/// for text recognition. Axis labels are often tight crops and a small
/// margin measurably improves recognition.
pub const DEFAULT_CROP_PADDING: u32 = 4;

/// Prefix used for bar names synthesized when no usable x-axis labels
/// were extracted.
pub const DEFAULT_BAR_NAME_PREFIX: &str = "Bar";
