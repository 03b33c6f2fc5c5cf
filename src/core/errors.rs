//! Error types for chart analysis.
//!
//! This module defines the error taxonomy shared by the registry, the
//! calibration engine, and the text extraction adapter, along with utility
//! constructors for building errors with context. Every error here is
//! recoverable at the request boundary: failed operations leave analyzer
//! state unchanged.

use thiserror::Error;

/// The two scalar reference values a chart calibration is derived from.
///
/// Used by [`ChartError::Calibration`] to identify which value failed to
/// convert to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceField {
    /// The value printed at the chart origin (y-axis baseline).
    Origin,
    /// The value printed at the top of the y-axis.
    Ymax,
}

impl std::fmt::Display for ReferenceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceField::Origin => write!(f, "origin"),
            ReferenceField::Ymax => write!(f, "ymax"),
        }
    }
}

/// Enum representing the failures that can occur while organizing
/// detections or deriving measurements from them.
#[derive(Error, Debug)]
pub enum ChartError {
    /// A rectangle whose corners are not strictly ordered.
    #[error("invalid box coordinates: ({x1}, {y1})..({x2}, {y2}) requires x1 < x2 and y1 < y2")]
    InvalidBox {
        /// Left edge as supplied.
        x1: f32,
        /// Top edge as supplied.
        y1: f32,
        /// Right edge as supplied.
        x2: f32,
        /// Bottom edge as supplied.
        y2: f32,
    },

    /// A category label outside the fixed set.
    #[error("unknown category: '{name}'")]
    UnknownCategory {
        /// The label as supplied.
        name: String,
    },

    /// A required field was absent from an add-box payload.
    #[error("missing required field: '{field}'")]
    MissingField {
        /// The name of the absent field.
        field: &'static str,
    },

    /// An operation referenced an id the registry does not hold.
    #[error("no entity with id '{id}'")]
    NotFound {
        /// The id as supplied.
        id: String,
    },

    /// Strict-mode ingestion rejected a detection set. The previous
    /// registry contents are left untouched.
    #[error("strict ingestion rejected detection set: {message}")]
    StrictIngest {
        /// What was missing or duplicated.
        message: String,
    },

    /// Measurement was requested before every required component was
    /// available.
    #[error("measurement not ready: missing components: {}", .missing.join(", "))]
    NotReady {
        /// Names of the required components that are still absent.
        missing: Vec<String>,
    },

    /// A bar rename whose name list does not line up with the bars.
    #[error("bar name count mismatch: {actual} names for {expected} bars")]
    BarNameCount {
        /// Number of bars currently in the registry.
        expected: usize,
        /// Number of names supplied.
        actual: usize,
    },

    /// A reference value that does not convert to a finite number.
    #[error("calibration value for {field} is not numeric: '{text}'")]
    Calibration {
        /// Which reference value failed.
        field: ReferenceField,
        /// The raw text that failed to convert.
        text: String,
    },

    /// The text recognition engine failed on a cropped region.
    #[error("text recognition failed: {context}")]
    Recognition {
        /// What was being recognized when the engine failed.
        context: String,
        /// The underlying engine error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred while loading or decoding an image.
    #[error("image load")]
    ImageLoad(#[from] image::ImageError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl ChartError {
    /// Creates an error for a rectangle with unordered corners.
    pub fn invalid_box(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::InvalidBox { x1, y1, x2, y2 }
    }

    /// Creates an error for a category label outside the fixed set.
    pub fn unknown_category(name: impl Into<String>) -> Self {
        Self::UnknownCategory { name: name.into() }
    }

    /// Creates an error for an id the registry does not hold.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an error for a recognition engine failure, naming the
    /// region that was being read.
    pub fn recognition(
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Recognition {
            context: context.into(),
            source: Box::new(error),
        }
    }
}

/// Result alias used throughout the crate.
pub type ChartResult<T> = Result<T, ChartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_lists_components() {
        let err = ChartError::NotReady {
            missing: vec!["yaxis".to_string(), "origin".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "measurement not ready: missing components: yaxis, origin"
        );
    }

    #[test]
    fn test_calibration_names_field_and_text() {
        let err = ChartError::Calibration {
            field: ReferenceField::Ymax,
            text: "1OO".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "calibration value for ymax is not numeric: '1OO'"
        );
    }

    #[test]
    fn test_invalid_box_display() {
        let err = ChartError::invalid_box(10.0, 5.0, 10.0, 20.0);
        assert!(err.to_string().contains("x1 < x2"));
    }
}
