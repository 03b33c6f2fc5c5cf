//! Geometric primitives for detection handling.
//!
//! Detections arrive as axis-aligned rectangles in image space: the
//! origin is the top-left corner of the image and y grows downward, so
//! `y1` is always the top edge and `y2` the bottom edge of a box. The
//! constructor enforces strict corner ordering; a box that exists is
//! always well-formed.

use crate::core::errors::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};

/// A validated axis-aligned rectangle in image coordinates.
///
/// Invariant: `x1 < x2` and `y1 < y2`. Construction and every update go
/// through [`BoundingBox::new`], so code holding a `BoundingBox` never
/// has to re-check the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CornerCoords")]
pub struct BoundingBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

/// Unvalidated corner coordinates, used as the serde wire shape.
#[derive(Debug, Clone, Copy, Deserialize)]
struct CornerCoords {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl TryFrom<CornerCoords> for BoundingBox {
    type Error = ChartError;

    fn try_from(c: CornerCoords) -> ChartResult<Self> {
        BoundingBox::new(c.x1, c.y1, c.x2, c.y2)
    }
}

impl BoundingBox {
    /// Creates a rectangle from its top-left and bottom-right corners.
    ///
    /// # Arguments
    ///
    /// * `x1` - Left edge.
    /// * `y1` - Top edge.
    /// * `x2` - Right edge.
    /// * `y2` - Bottom edge.
    ///
    /// # Returns
    ///
    /// * `Ok(BoundingBox)` - When `x1 < x2` and `y1 < y2`.
    /// * `Err(ChartError::InvalidBox)` - Otherwise.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> ChartResult<Self> {
        if x1 >= x2 || y1 >= y2 {
            return Err(ChartError::invalid_box(x1, y1, x2, y2));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Left edge.
    #[inline]
    pub fn x1(&self) -> f32 {
        self.x1
    }

    /// Top edge.
    #[inline]
    pub fn y1(&self) -> f32 {
        self.y1
    }

    /// Right edge.
    #[inline]
    pub fn x2(&self) -> f32 {
        self.x2
    }

    /// Bottom edge.
    #[inline]
    pub fn y2(&self) -> f32 {
        self.y2
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Vertical pixel span, independent of edge roles.
    ///
    /// Measurement math uses this instead of a signed difference so it
    /// can never flip sign on a detector that swaps edge conventions.
    #[inline]
    pub fn vertical_span(&self) -> f32 {
        (self.y2 - self.y1).abs()
    }
}
