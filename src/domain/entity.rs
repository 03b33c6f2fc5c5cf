//! Detection entities.
//!
//! A [`RawDetection`] is what the object detector hands over: corner
//! coordinates, a confidence score, the model class index, and a category
//! label that may or may not be one this crate knows. An [`Entity`] is a
//! detection the registry has accepted: validated box, parsed category,
//! and a registry-wide unique id.

use crate::domain::category::Category;
use crate::processors::geometry::BoundingBox;
use serde::{Deserialize, Serialize};

/// One unprocessed detection from the object detector.
///
/// Field names on the wire mirror the detector output (`conf`, `class`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    /// Left edge in image pixels.
    pub x1: f32,
    /// Top edge in image pixels.
    pub y1: f32,
    /// Right edge in image pixels.
    pub x2: f32,
    /// Bottom edge in image pixels.
    pub y2: f32,
    /// Detection confidence in `[0, 1]`.
    #[serde(rename = "conf")]
    pub confidence: f32,
    /// Model class index behind `label`.
    #[serde(rename = "class")]
    pub class_index: u32,
    /// Category label as emitted by the detector. Labels outside the
    /// fixed category set are dropped at ingestion.
    pub label: String,
}

impl RawDetection {
    /// Creates a detection with the given geometry and label.
    pub fn new(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        confidence: f32,
        class_index: u32,
        label: impl Into<String>,
    ) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_index,
            label: label.into(),
        }
    }
}

/// A categorized, uniquely identified bounding box owned by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Registry-wide unique id, shaped `<category>_<rank>`.
    pub id: String,
    /// Current category. Updated in place on recategorization.
    #[serde(rename = "label")]
    pub category: Category,
    /// The validated rectangle.
    #[serde(flatten)]
    pub bbox: BoundingBox,
    /// Detection confidence, absent for boxes added by hand.
    #[serde(rename = "conf", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Model class index, absent for boxes added by hand.
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_index: Option<u32>,
}

/// Payload for adding a box by hand.
///
/// Deserialized straight from a request body, so every field is optional
/// and presence is validated by the registry (coordinates and `label` are
/// required, confidence and class index are not).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBox {
    /// Left edge.
    pub x1: Option<f32>,
    /// Top edge.
    pub y1: Option<f32>,
    /// Right edge.
    pub x2: Option<f32>,
    /// Bottom edge.
    pub y2: Option<f32>,
    /// Category name from the fixed set.
    pub label: Option<String>,
    /// Optional confidence to record on the entity.
    #[serde(default, rename = "conf")]
    pub confidence: Option<f32>,
    /// Optional class index to record on the entity.
    #[serde(default, rename = "class")]
    pub class_index: Option<u32>,
}

impl NewBox {
    /// Creates a complete payload for the given category and corners.
    pub fn new(category: Category, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: Some(x1),
            y1: Some(y1),
            x2: Some(x2),
            y2: Some(y2),
            label: Some(category.as_str().to_string()),
            confidence: None,
            class_index: None,
        }
    }
}
