//! The chart analyzer.
//!
//! [`BarChartAnalyzer`] ties the pieces together for one analysis
//! session: it ingests a detection set, reads the calibration references
//! and labels through the text extraction adapter, applies the
//! operator's edits, and recomputes measurements on demand. Each
//! analyzer is an explicit, self-contained context; nothing here is
//! shared process-wide. Callers that serve multiple clients hand out
//! one analyzer per session (see [`session::SessionManager`]) or guard a
//! shared one with a lock for the whole read-modify-write sequence.

pub mod session;

use crate::core::config::AnalyzerConfig;
use crate::core::errors::{ChartError, ChartResult, ReferenceField};
use crate::core::traits::TextRecognizer;
use crate::domain::adapters::TextExtractor;
use crate::domain::calibration::CalibrationState;
use crate::domain::category::Category;
use crate::domain::entity::{Entity, NewBox, RawDetection};
use crate::domain::measurement::{self, MeasurementResult};
use crate::domain::registry::{ComponentStatus, DetectionRegistry};
use crate::processors::geometry::BoundingBox;
use image::RgbImage;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{info, warn};

pub use session::{SessionManager, SessionToken};

/// Analysis context for a single chart image.
#[derive(Debug)]
pub struct BarChartAnalyzer<R> {
    config: AnalyzerConfig,
    extractor: TextExtractor<R>,
    registry: DetectionRegistry,
    calibration: CalibrationState,
    chart_title: String,
    x_labels: Vec<String>,
}

impl<R: TextRecognizer> BarChartAnalyzer<R> {
    /// Creates an analyzer around a recognition engine with default
    /// configuration.
    pub fn new(engine: R) -> Self {
        Self::with_config(engine, AnalyzerConfig::default())
    }

    /// Creates an analyzer with explicit configuration.
    pub fn with_config(engine: R, config: AnalyzerConfig) -> Self {
        let extractor = TextExtractor::new(engine).with_padding(config.crop_padding);
        Self {
            config,
            extractor,
            registry: DetectionRegistry::new(),
            calibration: CalibrationState::new(),
            chart_title: String::new(),
            x_labels: Vec::new(),
        }
    }

    /// Ingests a fresh detection set for `image`, replacing all prior
    /// state, then reads the calibration references, the x-group
    /// labels, and the chart title from the image.
    ///
    /// Registry replacement is atomic; in strict mode a rejected set
    /// leaves the previous contents in place. Recognition trouble after
    /// the swap never fails the ingestion: an unreadable or unparsable
    /// reference is recorded as a per-field conversion error for the
    /// operator to fix by manual override, and label failures fall back
    /// to synthesized names at measurement time.
    pub fn ingest(&mut self, image: &RgbImage, detections: Vec<RawDetection>) -> ChartResult<()> {
        self.registry.ingest(detections, self.config.strict_ingest)?;
        self.calibration.reset();
        self.chart_title.clear();
        self.x_labels.clear();

        for (field, category) in [
            (ReferenceField::Origin, Category::Origin),
            (ReferenceField::Ymax, Category::Ymax),
        ] {
            let Some(entity) = self.registry.single(category) else {
                continue;
            };
            match self.extractor.extract_number(image, &entity.bbox) {
                Ok(text) => self.calibration.set_detected(field, text),
                Err(err) => {
                    warn!(%field, %err, "reference value recognition failed");
                    self.calibration.set_unreadable(field);
                }
            }
        }

        let group_boxes: Vec<BoundingBox> = self
            .registry
            .bucket(Category::XGroup)
            .iter()
            .map(|entity| entity.bbox)
            .collect();
        if !group_boxes.is_empty() {
            match self.extractor.extract_labels(image, &group_boxes) {
                Ok(labels) => self.x_labels = labels,
                Err(err) => warn!(%err, "x-group label recognition failed"),
            }
        }

        if let Some(label) = self.registry.single(Category::Label) {
            match self.extractor.extract_text(image, &label.bbox, true) {
                Ok(text) => self.chart_title = text,
                Err(err) => warn!(%err, "chart title recognition failed"),
            }
        }

        info!(
            title = %self.chart_title,
            labels = self.x_labels.len(),
            "chart ingested"
        );
        Ok(())
    }

    /// Reports which components required for measurement are available.
    pub fn component_status(&self) -> ComponentStatus {
        self.registry.component_status(&self.calibration)
    }

    /// Moves an entity's box. Invalid coordinates are rejected without
    /// mutation.
    pub fn update_box_coordinates(
        &mut self,
        id: &str,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    ) -> ChartResult<()> {
        self.registry.update_box_coordinates(id, x1, y1, x2, y2)
    }

    /// Moves an entity into another category. The id is preserved.
    pub fn recategorize(&mut self, id: &str, new_category: &str) -> ChartResult<()> {
        let category = Category::from_str(new_category)?;
        self.registry.recategorize(id, category)
    }

    /// Adds a box supplied by the operator and returns its new id.
    pub fn add_box(&mut self, spec: NewBox) -> ChartResult<String> {
        self.registry.add_box(spec)
    }

    /// Removes an entity.
    pub fn remove_box(&mut self, id: &str) -> ChartResult<()> {
        self.registry.remove_box(id)
    }

    /// Looks up an entity by id.
    pub fn get_box(&self, id: &str) -> Option<&Entity> {
        self.registry.get_box(id)
    }

    /// All buckets, category by category in rank order.
    pub fn all_boxes(&self) -> &BTreeMap<Category, Vec<Entity>> {
        self.registry.all_boxes()
    }

    /// The registry itself, for diagnostics and overlays.
    pub fn registry(&self) -> &DetectionRegistry {
        &self.registry
    }

    /// Current calibration state.
    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Overrides a reference value by hand. Manual values take
    /// precedence over detected text and clear any conversion error.
    pub fn set_reference_value(&mut self, field: ReferenceField, text: impl Into<String>) {
        self.calibration.set_manual(field, text);
    }

    /// The extracted chart title ("" when none was detected).
    pub fn chart_title(&self) -> &str {
        &self.chart_title
    }

    /// The current bar name list.
    pub fn x_labels(&self) -> &[String] {
        &self.x_labels
    }

    /// Replaces the bar names.
    ///
    /// Rejected without mutation unless exactly one name per bar is
    /// supplied.
    pub fn update_bar_names(&mut self, names: Vec<String>) -> ChartResult<()> {
        let expected = self.registry.bucket(Category::Bar).len();
        if names.len() != expected {
            return Err(ChartError::BarNameCount {
                expected,
                actual: names.len(),
            });
        }
        self.x_labels = names;
        Ok(())
    }

    /// Recomputes all measurements from current state.
    ///
    /// Fails with `NotReady` when required components are missing and
    /// with `Calibration` when a reference value does not parse; on
    /// success the result reflects exactly the current registry and
    /// calibration, including any synthesized bar names (which are
    /// persisted for subsequent calls).
    pub fn calculate_heights(&mut self) -> ChartResult<MeasurementResult> {
        measurement::calculate_heights(
            &self.registry,
            &self.calibration,
            &self.chart_title,
            &mut self.x_labels,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::OcrMode;
    use image::Rgb;

    /// Engine fake keyed by region size. Ingest tests give each OCR'd
    /// region a unique size so the fake can answer deterministically,
    /// including under parallel label extraction.
    struct SizeKeyedEngine;

    impl TextRecognizer for SizeKeyedEngine {
        fn recognize(&self, region: &RgbImage, mode: OcrMode) -> ChartResult<String> {
            let answer = match (region.dimensions(), mode) {
                ((13, 20), OcrMode::DigitsOnly) => "0",
                ((17, 20), OcrMode::DigitsOnly) => "100",
                ((21, 10), OcrMode::GeneralText) => "west field",
                ((23, 10), OcrMode::GeneralText) => "east field",
                // The title box is 10x60 and arrives rotated.
                ((60, 10), OcrMode::GeneralText) => "Harvest yield",
                _ => "",
            };
            Ok(answer.to_string())
        }
    }

    fn detection(label: &str, x1: f32, y1: f32, x2: f32, y2: f32) -> RawDetection {
        RawDetection::new(x1, y1, x2, y2, 0.9, 0, label)
    }

    fn full_chart() -> Vec<RawDetection> {
        vec![
            detection("yaxis", 30.0, 10.0, 40.0, 210.0),
            detection("xaxis", 30.0, 200.0, 300.0, 210.0),
            detection("origin", 10.0, 195.0, 23.0, 215.0),
            detection("ymax", 10.0, 5.0, 27.0, 25.0),
            detection("bar", 50.0, 110.0, 80.0, 210.0),
            detection("bar", 100.0, 160.0, 130.0, 210.0),
            detection("uptail", 55.0, 90.0, 75.0, 110.0),
            detection("x_group", 50.0, 220.0, 71.0, 230.0),
            detection("x_group", 100.0, 220.0, 123.0, 230.0),
            detection("label", 2.0, 60.0, 12.0, 120.0),
        ]
    }

    fn chart_image() -> RgbImage {
        RgbImage::from_pixel(320, 240, Rgb([255, 255, 255]))
    }

    fn analyzer() -> BarChartAnalyzer<SizeKeyedEngine> {
        let config = AnalyzerConfig::new().with_crop_padding(0);
        let mut analyzer = BarChartAnalyzer::with_config(SizeKeyedEngine, config);
        analyzer.ingest(&chart_image(), full_chart()).unwrap();
        analyzer
    }

    #[test]
    fn test_ingest_reads_references_labels_and_title() {
        let analyzer = analyzer();
        assert_eq!(
            analyzer.calibration().get(ReferenceField::Origin).text(),
            "0"
        );
        assert_eq!(analyzer.calibration().get(ReferenceField::Ymax).text(), "100");
        assert_eq!(analyzer.x_labels(), ["west field", "east field"]);
        assert_eq!(analyzer.chart_title(), "Harvest yield");
    }

    #[test]
    fn test_end_to_end_measurement() {
        let mut analyzer = analyzer();
        let result = analyzer.calculate_heights().unwrap();
        let chart = &result.charts["Harvest yield"];
        assert!((chart.bar_heights[0] - 50.0).abs() < 1e-4);
        assert!((chart.bar_heights[1] - 25.0).abs() < 1e-4);
        assert!((chart.uptail_heights[0] - 10.0).abs() < 1e-4);
        assert_eq!(chart.bar_names, vec!["west field", "east field"]);
    }

    #[test]
    fn test_manual_override_flips_readiness() {
        let mut analyzer = analyzer();
        analyzer.remove_box("origin_1").unwrap();
        // Origin text came from the removed box's region, but a fresh
        // ingest is what clears it; simulate the bad-read case instead.
        analyzer.calibration.set_detected(ReferenceField::Origin, "o");

        let status = analyzer.component_status();
        assert!(!status.ready);
        assert_eq!(status.missing, vec![Category::Origin]);

        analyzer.set_reference_value(ReferenceField::Origin, "0");
        let status = analyzer.component_status();
        assert!(status.ready);
    }

    #[test]
    fn test_update_bar_names_requires_exact_count() {
        let mut analyzer = analyzer();
        let err = analyzer
            .update_bar_names(vec!["just one".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            ChartError::BarNameCount {
                expected: 2,
                actual: 1
            }
        ));
        assert_eq!(analyzer.x_labels(), ["west field", "east field"]);

        let err = analyzer
            .update_bar_names(vec!["a".into(), "b".into(), "c".into()])
            .unwrap_err();
        assert!(matches!(err, ChartError::BarNameCount { actual: 3, .. }));
        assert_eq!(analyzer.x_labels(), ["west field", "east field"]);

        analyzer
            .update_bar_names(vec!["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(analyzer.x_labels(), ["a", "b"]);
    }

    #[test]
    fn test_recategorize_round_trip() {
        let mut analyzer = analyzer();
        let before = analyzer.get_box("label_1").unwrap().bbox;
        analyzer.recategorize("label_1", "x_group").unwrap();

        assert!(analyzer.all_boxes()[&Category::Label].is_empty());
        let moved = analyzer
            .all_boxes()[&Category::XGroup]
            .iter()
            .find(|entity| entity.id == "label_1")
            .unwrap();
        assert_eq!(moved.bbox, before);

        let err = analyzer.recategorize("label_1", "doughnut").unwrap_err();
        assert!(matches!(err, ChartError::UnknownCategory { .. }));
    }

    #[test]
    fn test_reingest_resets_labels_and_title() {
        let mut analyzer = analyzer();
        analyzer
            .ingest(
                &chart_image(),
                vec![detection("bar", 50.0, 110.0, 80.0, 210.0)],
            )
            .unwrap();
        assert_eq!(analyzer.chart_title(), "");
        assert!(analyzer.x_labels().is_empty());
        assert_eq!(analyzer.calibration().get(ReferenceField::Origin).text(), "");
    }

    #[test]
    fn test_engine_failure_marks_reference_unreadable() {
        struct FailingEngine;
        impl TextRecognizer for FailingEngine {
            fn recognize(&self, _region: &RgbImage, _mode: OcrMode) -> ChartResult<String> {
                Err(ChartError::recognition(
                    "region",
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"),
                ))
            }
        }

        let config = AnalyzerConfig::new().with_crop_padding(0);
        let mut analyzer = BarChartAnalyzer::with_config(FailingEngine, config);
        // Ingestion itself succeeds; the failure is recorded per field.
        analyzer.ingest(&chart_image(), full_chart()).unwrap();

        let origin = analyzer.calibration().get(ReferenceField::Origin);
        assert!(origin.conversion_error().unwrap().contains("recognition failed"));
        assert_eq!(analyzer.registry().bucket(Category::Bar).len(), 2);

        // Manual values still unblock measurement.
        analyzer.set_reference_value(ReferenceField::Origin, "0");
        analyzer.set_reference_value(ReferenceField::Ymax, "100");
        let result = analyzer.calculate_heights().unwrap();
        assert_eq!(result.charts[""].bar_names, vec!["Bar 1", "Bar 2"]);
    }

    #[test]
    fn test_strict_ingest_propagates_and_preserves_state() {
        let config = AnalyzerConfig::new()
            .with_crop_padding(0)
            .with_strict_ingest(true);
        let mut analyzer = BarChartAnalyzer::with_config(SizeKeyedEngine, config);
        analyzer.ingest(&chart_image(), full_chart()).unwrap();

        let err = analyzer
            .ingest(
                &chart_image(),
                vec![detection("bar", 50.0, 110.0, 80.0, 210.0)],
            )
            .unwrap_err();
        assert!(matches!(err, ChartError::StrictIngest { .. }));
        // Prior session state survives, including extracted text.
        assert_eq!(analyzer.chart_title(), "Harvest yield");
        assert_eq!(analyzer.registry().bucket(Category::Bar).len(), 2);
    }
}
