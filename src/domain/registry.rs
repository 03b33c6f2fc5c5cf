//! The detection registry.
//!
//! The registry turns the detector's flat, unlabeled output into
//! categorized entities with stable ids, and is the single owner of that
//! state while the operator edits it. Ids are assigned once, at ingestion
//! or addition, and survive coordinate edits and recategorization; the
//! rank embedded in an id reflects ingestion-time ordering and is never
//! recomputed, so an id keeps naming the same box for the whole session.
//!
//! Ingestion is atomic: a candidate state is built first and only swapped
//! in once it is acceptable, so a rejected detection set can never leave
//! half a registry behind.

use crate::core::errors::{ChartError, ChartResult, ReferenceField};
use crate::domain::calibration::CalibrationState;
use crate::domain::category::Category;
use crate::domain::entity::{Entity, NewBox, RawDetection};
use crate::processors::geometry::BoundingBox;
use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::{debug, warn};

/// How a required component is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentPresence {
    /// Entities of the category exist in the registry.
    Detected(usize),
    /// No entity exists but a manual calibration value covers it
    /// (origin and ymax only).
    Manual,
}

impl Serialize for ComponentPresence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ComponentPresence::Detected(count) => serializer.serialize_u64(*count as u64),
            ComponentPresence::Manual => serializer.serialize_str("manual"),
        }
    }
}

/// Snapshot of measurement readiness.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    /// Satisfied required categories and how they are satisfied.
    pub present: BTreeMap<Category, ComponentPresence>,
    /// Required categories that are still missing.
    pub missing: Vec<Category>,
    /// True when nothing is missing.
    pub ready: bool,
}

/// Owns every entity for the chart under analysis.
#[derive(Debug, Serialize)]
pub struct DetectionRegistry {
    /// Category buckets in rank order. Every category always has a
    /// bucket; most are empty most of the time.
    buckets: BTreeMap<Category, Vec<Entity>>,
    /// Ids in raw detection order (additions append). This is the
    /// diagnostics view of the original detection list.
    order: Vec<String>,
    /// Every id handed out since the last ingestion. Never pruned on
    /// removal, so ids are not reused within a generation and a
    /// preserved id cannot alias a later one.
    #[serde(skip)]
    assigned: HashSet<String>,
}

impl Default for DetectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let mut buckets = BTreeMap::new();
        for category in Category::ALL {
            buckets.insert(category, Vec::new());
        }
        Self {
            buckets,
            order: Vec::new(),
            assigned: HashSet::new(),
        }
    }

    /// Replaces the registry contents with a fresh detection set.
    ///
    /// Detections are partitioned by category label; positional
    /// categories (bars, uptails, x-groups) are sorted by ascending
    /// `x1` before rank ids are assigned, the rest keep detector order.
    /// Detections with unknown labels or malformed boxes are dropped
    /// with a warning.
    ///
    /// With `strict` set, a detection set whose single-instance
    /// categories are missing or duplicated is rejected outright and
    /// the previous contents stay in place. The lenient default accepts
    /// anything and defers completeness to [`component_status`].
    ///
    /// [`component_status`]: DetectionRegistry::component_status
    pub fn ingest(&mut self, detections: Vec<RawDetection>, strict: bool) -> ChartResult<()> {
        let total = detections.len();
        let mut partitions: BTreeMap<Category, Vec<(usize, RawDetection, BoundingBox)>> =
            BTreeMap::new();
        for category in Category::ALL {
            partitions.insert(category, Vec::new());
        }

        for (index, detection) in detections.into_iter().enumerate() {
            let category = match Category::from_str(&detection.label) {
                Ok(category) => category,
                Err(_) => {
                    warn!(label = %detection.label, index, "dropping detection with unknown label");
                    continue;
                }
            };
            let bbox = match BoundingBox::new(detection.x1, detection.y1, detection.x2, detection.y2)
            {
                Ok(bbox) => bbox,
                Err(err) => {
                    warn!(%category, index, %err, "dropping detection with malformed box");
                    continue;
                }
            };
            if let Some(bucket) = partitions.get_mut(&category) {
                bucket.push((index, detection, bbox));
            }
        }

        if strict {
            let mut problems = Vec::new();
            for category in Category::ALL.iter().filter(|c| c.is_single_instance()) {
                match partitions[category].len() {
                    0 => problems.push(format!("missing {category}")),
                    1 => {}
                    n => problems.push(format!("{n} {category} detections")),
                }
            }
            if !problems.is_empty() {
                return Err(ChartError::StrictIngest {
                    message: problems.join(", "),
                });
            }
        }

        let mut buckets: BTreeMap<Category, Vec<Entity>> = BTreeMap::new();
        let mut flat: Vec<(usize, String)> = Vec::new();
        let mut assigned = HashSet::new();

        for (category, mut candidates) in partitions {
            if category.is_positional() {
                candidates = candidates
                    .into_iter()
                    .sorted_by(|a, b| {
                        a.2.x1()
                            .partial_cmp(&b.2.x1())
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .collect();
            }
            let mut bucket = Vec::with_capacity(candidates.len());
            for (rank, (index, detection, bbox)) in candidates.into_iter().enumerate() {
                let id = format!("{}_{}", category, rank + 1);
                assigned.insert(id.clone());
                flat.push((index, id.clone()));
                bucket.push(Entity {
                    id,
                    category,
                    bbox,
                    confidence: Some(detection.confidence),
                    class_index: Some(detection.class_index),
                });
            }
            buckets.insert(category, bucket);
        }

        flat.sort_by_key(|(index, _)| *index);

        self.buckets = buckets;
        self.order = flat.into_iter().map(|(_, id)| id).collect();
        self.assigned = assigned;

        debug!(
            total,
            kept = self.order.len(),
            bars = self.buckets[&Category::Bar].len(),
            "ingested detection set"
        );
        Ok(())
    }

    /// The entities of one category, in rank order.
    pub fn bucket(&self, category: Category) -> &[Entity] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first entity of a single-instance category, if any.
    pub fn single(&self, category: Category) -> Option<&Entity> {
        self.bucket(category).first()
    }

    /// All buckets, category by category in rank order.
    pub fn all_boxes(&self) -> &BTreeMap<Category, Vec<Entity>> {
        &self.buckets
    }

    /// Entities in raw detection order (additions last). Diagnostics
    /// view; mutations through the bucket API are visible here.
    pub fn raw_detections(&self) -> Vec<&Entity> {
        self.order.iter().filter_map(|id| self.get_box(id)).collect()
    }

    /// Looks up an entity by id.
    pub fn get_box(&self, id: &str) -> Option<&Entity> {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.iter())
            .find(|entity| entity.id == id)
    }

    fn locate(&self, id: &str) -> Option<(Category, usize)> {
        self.buckets.iter().find_map(|(category, bucket)| {
            bucket
                .iter()
                .position(|entity| entity.id == id)
                .map(|index| (*category, index))
        })
    }

    /// Moves an entity's box.
    ///
    /// Coordinates are validated before anything is touched; a bad
    /// rectangle never mutates state. The entity keeps its id and rank:
    /// ranks reflect ingestion-time ordering, not live position, so an
    /// id stays stable while the operator drags boxes around.
    pub fn update_box_coordinates(
        &mut self,
        id: &str,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    ) -> ChartResult<()> {
        let bbox = BoundingBox::new(x1, y1, x2, y2)?;
        let (category, index) = self.locate(id).ok_or_else(|| ChartError::not_found(id))?;
        if let Some(entity) = self
            .buckets
            .get_mut(&category)
            .and_then(|bucket| bucket.get_mut(index))
        {
            entity.bbox = bbox;
            debug!(id, %category, "updated box coordinates");
        }
        Ok(())
    }

    /// Moves an entity into another category bucket.
    ///
    /// The entity keeps its id (ids are unique across the whole
    /// registry, not per bucket, so a moved id can never collide) and
    /// is appended to the destination bucket.
    pub fn recategorize(&mut self, id: &str, new_category: Category) -> ChartResult<()> {
        let (old_category, index) = self.locate(id).ok_or_else(|| ChartError::not_found(id))?;
        if old_category == new_category {
            return Ok(());
        }
        let mut entity = self
            .buckets
            .get_mut(&old_category)
            .map(|bucket| bucket.remove(index))
            .ok_or_else(|| ChartError::not_found(id))?;
        entity.category = new_category;
        if let Some(bucket) = self.buckets.get_mut(&new_category) {
            bucket.push(entity);
        }
        debug!(id, from = %old_category, to = %new_category, "recategorized entity");
        Ok(())
    }

    /// Adds a box supplied by the operator.
    ///
    /// Requires the four corner coordinates and a known category label;
    /// anything else is rejected without touching state. The new id is
    /// the next rank for that category, skipping ids already handed out
    /// in this generation so removed or moved ids are never aliased.
    ///
    /// # Returns
    ///
    /// The id assigned to the new entity.
    pub fn add_box(&mut self, spec: NewBox) -> ChartResult<String> {
        let x1 = spec.x1.ok_or(ChartError::MissingField { field: "x1" })?;
        let y1 = spec.y1.ok_or(ChartError::MissingField { field: "y1" })?;
        let x2 = spec.x2.ok_or(ChartError::MissingField { field: "x2" })?;
        let y2 = spec.y2.ok_or(ChartError::MissingField { field: "y2" })?;
        let label = spec.label.ok_or(ChartError::MissingField { field: "label" })?;
        let category = Category::from_str(&label)?;
        let bbox = BoundingBox::new(x1, y1, x2, y2)?;

        let id = self.next_id(category);
        self.assigned.insert(id.clone());
        self.order.push(id.clone());
        if let Some(bucket) = self.buckets.get_mut(&category) {
            bucket.push(Entity {
                id: id.clone(),
                category,
                bbox,
                confidence: spec.confidence,
                class_index: spec.class_index,
            });
        }
        debug!(%id, %category, "added box");
        Ok(id)
    }

    /// Removes an entity from its bucket and the detection order.
    pub fn remove_box(&mut self, id: &str) -> ChartResult<()> {
        let (category, index) = self.locate(id).ok_or_else(|| ChartError::not_found(id))?;
        if let Some(bucket) = self.buckets.get_mut(&category) {
            bucket.remove(index);
        }
        self.order.retain(|existing| existing != id);
        debug!(id, %category, "removed box");
        Ok(())
    }

    /// Reports which components required for measurement are available.
    ///
    /// A category is present when its bucket is non-empty; origin and
    /// ymax also count as present when the calibration holds a finite
    /// manual or detected value for them, since the operator can type
    /// the number instead of drawing a box.
    pub fn component_status(&self, calibration: &CalibrationState) -> ComponentStatus {
        let mut present = BTreeMap::new();
        let mut missing = Vec::new();

        for category in Category::REQUIRED_FOR_MEASUREMENT {
            let count = self.bucket(category).len();
            if count > 0 {
                present.insert(category, ComponentPresence::Detected(count));
                continue;
            }
            let covered_by_value = match category {
                Category::Origin => calibration.is_numeric(ReferenceField::Origin),
                Category::Ymax => calibration.is_numeric(ReferenceField::Ymax),
                _ => false,
            };
            if covered_by_value {
                present.insert(category, ComponentPresence::Manual);
            } else {
                missing.push(category);
            }
        }

        let ready = missing.is_empty();
        ComponentStatus {
            present,
            missing,
            ready,
        }
    }

    fn next_id(&self, category: Category) -> String {
        let mut rank = self.bucket(category).len() + 1;
        loop {
            let id = format!("{}_{}", category, rank);
            if !self.assigned.contains(&id) {
                return id;
            }
            rank += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(label: &str, x1: f32, y1: f32, x2: f32, y2: f32) -> RawDetection {
        RawDetection::new(x1, y1, x2, y2, 0.9, 0, label)
    }

    fn sample_set() -> Vec<RawDetection> {
        vec![
            detection("bar", 120.0, 80.0, 150.0, 200.0),
            detection("bar", 40.0, 60.0, 70.0, 200.0),
            detection("bar", 80.0, 100.0, 110.0, 200.0),
            detection("uptail", 125.0, 60.0, 145.0, 80.0),
            detection("yaxis", 20.0, 10.0, 30.0, 210.0),
            detection("xaxis", 20.0, 200.0, 300.0, 210.0),
            detection("origin", 5.0, 195.0, 18.0, 215.0),
            detection("ymax", 5.0, 5.0, 18.0, 25.0),
            detection("label", 2.0, 80.0, 12.0, 140.0),
        ]
    }

    fn ingested() -> DetectionRegistry {
        let mut registry = DetectionRegistry::new();
        registry.ingest(sample_set(), false).unwrap();
        registry
    }

    #[test]
    fn test_bars_ranked_by_x_position() {
        let registry = ingested();
        let bars = registry.bucket(Category::Bar);
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].id, "bar_1");
        assert_eq!(bars[0].bbox.x1(), 40.0);
        assert_eq!(bars[1].id, "bar_2");
        assert_eq!(bars[1].bbox.x1(), 80.0);
        assert_eq!(bars[2].id, "bar_3");
        assert_eq!(bars[2].bbox.x1(), 120.0);
    }

    #[test]
    fn test_unknown_labels_dropped() {
        let mut registry = DetectionRegistry::new();
        let mut detections = sample_set();
        detections.push(detection("watermark", 0.0, 0.0, 5.0, 5.0));
        registry.ingest(detections, false).unwrap();
        assert_eq!(registry.raw_detections().len(), 9);
        let total: usize = registry.all_boxes().values().map(Vec::len).sum();
        assert_eq!(total, 9);
    }

    #[test]
    fn test_malformed_boxes_dropped() {
        let mut registry = DetectionRegistry::new();
        let mut detections = sample_set();
        detections.push(detection("bar", 200.0, 50.0, 180.0, 40.0));
        registry.ingest(detections, false).unwrap();
        assert_eq!(registry.bucket(Category::Bar).len(), 3);
    }

    #[test]
    fn test_lenient_ingest_accepts_incomplete_sets() {
        let mut registry = DetectionRegistry::new();
        registry
            .ingest(vec![detection("bar", 0.0, 0.0, 10.0, 10.0)], false)
            .unwrap();
        assert_eq!(registry.bucket(Category::Bar).len(), 1);
        assert!(registry.single(Category::Yaxis).is_none());
    }

    #[test]
    fn test_strict_ingest_rejects_and_preserves_state() {
        let mut registry = ingested();
        let err = registry
            .ingest(vec![detection("bar", 0.0, 0.0, 10.0, 10.0)], true)
            .unwrap_err();
        assert!(matches!(err, ChartError::StrictIngest { .. }));
        // Previous contents intact.
        assert_eq!(registry.bucket(Category::Bar).len(), 3);
        assert!(registry.single(Category::Yaxis).is_some());
    }

    #[test]
    fn test_strict_ingest_rejects_duplicates() {
        let mut registry = DetectionRegistry::new();
        let mut detections = sample_set();
        detections.push(detection("yaxis", 250.0, 10.0, 260.0, 210.0));
        let err = registry.ingest(detections, true).unwrap_err();
        assert!(err.to_string().contains("2 yaxis"));
    }

    #[test]
    fn test_reingest_replaces_everything() {
        let mut registry = ingested();
        registry
            .ingest(vec![detection("bar", 0.0, 0.0, 10.0, 10.0)], false)
            .unwrap();
        assert_eq!(registry.bucket(Category::Bar).len(), 1);
        assert_eq!(registry.bucket(Category::Bar)[0].id, "bar_1");
        assert!(registry.single(Category::Origin).is_none());
        assert_eq!(registry.raw_detections().len(), 1);
    }

    #[test]
    fn test_update_box_coordinates() {
        let mut registry = ingested();
        registry
            .update_box_coordinates("bar_1", 41.0, 61.0, 71.0, 201.0)
            .unwrap();
        let bar = registry.get_box("bar_1").unwrap();
        assert_eq!(bar.bbox.x1(), 41.0);
        assert_eq!(bar.bbox.y2(), 201.0);
        // Rank order unchanged even though the box moved.
        assert_eq!(registry.bucket(Category::Bar)[0].id, "bar_1");
    }

    #[test]
    fn test_update_with_invalid_coordinates_leaves_state() {
        let mut registry = ingested();
        let before = registry.get_box("bar_1").unwrap().bbox;
        let err = registry
            .update_box_coordinates("bar_1", 71.0, 61.0, 41.0, 201.0)
            .unwrap_err();
        assert!(matches!(err, ChartError::InvalidBox { .. }));
        assert_eq!(registry.get_box("bar_1").unwrap().bbox, before);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut registry = ingested();
        let err = registry
            .update_box_coordinates("bar_9", 0.0, 0.0, 1.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, ChartError::NotFound { .. }));
    }

    #[test]
    fn test_recategorize_moves_between_buckets() {
        let mut registry = ingested();
        let before = registry.get_box("label_1").unwrap().bbox;
        registry.recategorize("label_1", Category::XGroup).unwrap();

        assert!(registry.bucket(Category::Label).is_empty());
        let moved = registry
            .bucket(Category::XGroup)
            .iter()
            .find(|e| e.id == "label_1")
            .expect("moved entity keeps its id");
        assert_eq!(moved.category, Category::XGroup);
        assert_eq!(moved.bbox, before);
    }

    #[test]
    fn test_recategorize_then_add_never_aliases() {
        let mut registry = ingested();
        // bar_3 moves into uptails and keeps its id.
        registry.recategorize("bar_3", Category::Uptail).unwrap();
        // Adding a bar must not re-issue bar_3.
        let id = registry
            .add_box(NewBox::new(Category::Bar, 160.0, 90.0, 190.0, 200.0))
            .unwrap();
        assert_eq!(id, "bar_4");
        assert!(registry.get_box("bar_3").is_some());
        assert_eq!(registry.get_box("bar_3").unwrap().category, Category::Uptail);
    }

    #[test]
    fn test_add_box_round_trip() {
        let mut registry = ingested();
        let id = registry
            .add_box(NewBox::new(Category::Legend, 250.0, 20.0, 290.0, 40.0))
            .unwrap();
        assert_eq!(id, "legend_1");
        let entity = registry.get_box(&id).unwrap();
        assert_eq!(entity.category, Category::Legend);
        assert_eq!(entity.bbox.x1(), 250.0);
        assert!(registry.raw_detections().iter().any(|e| e.id == id));

        registry.remove_box(&id).unwrap();
        assert!(registry.get_box(&id).is_none());
        assert!(registry.raw_detections().iter().all(|e| e.id != id));
    }

    #[test]
    fn test_add_box_missing_fields() {
        let mut registry = DetectionRegistry::new();
        let err = registry
            .add_box(NewBox {
                x1: Some(0.0),
                y1: Some(0.0),
                x2: Some(10.0),
                y2: None,
                label: Some("bar".to_string()),
                ..NewBox::default()
            })
            .unwrap_err();
        assert!(matches!(err, ChartError::MissingField { field: "y2" }));

        let err = registry
            .add_box(NewBox {
                x1: Some(0.0),
                y1: Some(0.0),
                x2: Some(10.0),
                y2: Some(10.0),
                label: Some("pie_slice".to_string()),
                ..NewBox::default()
            })
            .unwrap_err();
        assert!(matches!(err, ChartError::UnknownCategory { .. }));
    }

    #[test]
    fn test_removed_ids_are_not_reused() {
        let mut registry = ingested();
        registry.remove_box("bar_2").unwrap();
        let id = registry
            .add_box(NewBox::new(Category::Bar, 160.0, 90.0, 190.0, 200.0))
            .unwrap();
        // Two bars remain, but bar_3 is still live, so the next id skips
        // both the removed bar_2 and the live bar_3.
        assert_eq!(id, "bar_4");
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut registry = ingested();
        assert!(matches!(
            registry.remove_box("uptail_7").unwrap_err(),
            ChartError::NotFound { .. }
        ));
    }

    #[test]
    fn test_component_status_ready_after_full_ingest() {
        let registry = ingested();
        let status = registry.component_status(&CalibrationState::new());
        assert!(status.ready);
        assert!(status.missing.is_empty());
        assert_eq!(
            status.present.get(&Category::Bar),
            Some(&ComponentPresence::Detected(3))
        );
    }

    #[test]
    fn test_component_status_manual_value_covers_origin() {
        let mut registry = ingested();
        registry.remove_box("origin_1").unwrap();

        let mut calibration = CalibrationState::new();
        calibration.set_detected(ReferenceField::Origin, "not a number");
        let status = registry.component_status(&calibration);
        assert!(!status.ready);
        assert_eq!(status.missing, vec![Category::Origin]);

        calibration.set_manual(ReferenceField::Origin, "0");
        let status = registry.component_status(&calibration);
        assert!(status.ready);
        assert_eq!(
            status.present.get(&Category::Origin),
            Some(&ComponentPresence::Manual)
        );
    }

    #[test]
    fn test_component_status_serializes_counts_and_manual() {
        let mut registry = ingested();
        registry.remove_box("ymax_1").unwrap();
        let mut calibration = CalibrationState::new();
        calibration.set_manual(ReferenceField::Ymax, "100");

        let status = registry.component_status(&calibration);
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["present"]["bar"], 3);
        assert_eq!(value["present"]["ymax"], "manual");
        assert_eq!(value["ready"], true);
    }
}
