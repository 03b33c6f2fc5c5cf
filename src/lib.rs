//! # bargauge
//!
//! A Rust library that turns object detections on a bar-chart image into
//! calibrated numeric measurements.
//!
//! An external detector finds the chart elements (bars, axes, the origin
//! and ymax value markers, labels); an external recognition engine reads
//! text out of cropped regions. Everything in between lives here: the
//! registry that organizes raw detections into uniquely identified,
//! editable entities, the calibration derived from the two reference
//! values, and the measurement engine that converts pixel spans into
//! chart units.
//!
//! ## Components
//!
//! - **Detection registry**: categorized buckets with stable ids that
//!   survive coordinate edits, recategorization, additions and removals
//! - **Calibration**: origin/ymax reference values, OCR-read or manually
//!   overridden
//! - **Measurement engine**: readiness-checked linear pixel-to-value
//!   transform
//! - **Text extraction adapter**: crop, rotate, and normalize around a
//!   pluggable recognition engine
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration, and the engine trait seam
//! * [`domain`] - Registry, calibration, measurement, and adapters
//! * [`processors`] - Geometry primitives
//! * [`utils`] - Cropping and diagnostic overlays
//! * [`analyzer`] - The per-session orchestrator and session storage
//!
//! ## Quick start
//!
//! ```
//! use bargauge::prelude::*;
//! use image::RgbImage;
//!
//! // Any recognition engine plugs in through TextRecognizer.
//! struct SilentEngine;
//!
//! impl TextRecognizer for SilentEngine {
//!     fn recognize(&self, _region: &RgbImage, _mode: OcrMode) -> ChartResult<String> {
//!         Ok(String::new())
//!     }
//! }
//!
//! # fn main() -> ChartResult<()> {
//! let mut analyzer = BarChartAnalyzer::new(SilentEngine);
//! let image = RgbImage::new(320, 240);
//! analyzer.ingest(
//!     &image,
//!     vec![
//!         RawDetection::new(20.0, 10.0, 30.0, 210.0, 0.99, 3, "yaxis"),
//!         RawDetection::new(20.0, 200.0, 300.0, 210.0, 0.98, 8, "xaxis"),
//!         RawDetection::new(40.0, 110.0, 70.0, 210.0, 0.97, 4, "bar"),
//!     ],
//! )?;
//!
//! // The engine read nothing, so supply the references by hand.
//! analyzer.set_reference_value(ReferenceField::Origin, "0");
//! analyzer.set_reference_value(ReferenceField::Ymax, "100");
//! assert!(analyzer.component_status().ready);
//!
//! let result = analyzer.calculate_heights()?;
//! assert_eq!(result.charts[""].bar_heights, vec![50.0]);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod core;
pub mod domain;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::errors::{ChartError, ChartResult, ReferenceField};

    // Configuration and the engine seam
    pub use crate::core::config::AnalyzerConfig;
    pub use crate::core::traits::{OcrMode, TextRecognizer};

    // Geometry
    pub use crate::processors::geometry::BoundingBox;

    // Domain types
    pub use crate::domain::adapters::TextExtractor;
    pub use crate::domain::calibration::{CalibrationState, ReferenceValue, ValueSource};
    pub use crate::domain::category::Category;
    pub use crate::domain::entity::{Entity, NewBox, RawDetection};
    pub use crate::domain::measurement::{ChartMeasurements, MeasurementResult};
    pub use crate::domain::registry::{ComponentPresence, ComponentStatus, DetectionRegistry};

    // Orchestration
    pub use crate::analyzer::{BarChartAnalyzer, SessionManager, SessionToken};

    // Image utilities
    pub use crate::utils::{crop_with_padding, draw_registry_overlay, rotate_clockwise};
}
