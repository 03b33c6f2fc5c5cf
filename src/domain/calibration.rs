//! Calibration reference values.
//!
//! Pixel geometry only becomes a measurement once two reference values
//! are known: the number printed at the chart origin and the number
//! printed at the top of the y-axis. Both start out as OCR text and may
//! be overridden by hand at any time; a manual override always wins and
//! clears any recorded conversion error.

use crate::core::errors::{ChartError, ChartResult, ReferenceField};
use serde::Serialize;

/// Where a reference value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Read from the chart image by the recognition engine.
    #[default]
    Detected,
    /// Supplied by the operator.
    Manual,
}

/// One reference value: the raw text, its provenance, and the
/// conversion error recorded when detected text did not parse.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceValue {
    text: String,
    source: ValueSource,
    conversion_error: Option<String>,
}

impl ReferenceValue {
    /// The raw text as read or supplied.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the value was detected or manually supplied.
    pub fn source(&self) -> ValueSource {
        self.source
    }

    /// The conversion error recorded for unparsable detected text, if
    /// any. Cleared by a manual override.
    pub fn conversion_error(&self) -> Option<&str> {
        self.conversion_error.as_deref()
    }

    /// Parses the text as a finite number.
    pub fn parse(&self) -> Option<f32> {
        self.text
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Whether the text parses as a finite number.
    pub fn is_numeric(&self) -> bool {
        self.parse().is_some()
    }
}

/// The pair of reference values for the current chart.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CalibrationState {
    origin: ReferenceValue,
    ymax: ReferenceValue,
}

impl CalibrationState {
    /// Creates an empty calibration (both values blank, detected).
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference value for `field`.
    pub fn get(&self, field: ReferenceField) -> &ReferenceValue {
        match field {
            ReferenceField::Origin => &self.origin,
            ReferenceField::Ymax => &self.ymax,
        }
    }

    fn get_mut(&mut self, field: ReferenceField) -> &mut ReferenceValue {
        match field {
            ReferenceField::Origin => &mut self.origin,
            ReferenceField::Ymax => &mut self.ymax,
        }
    }

    /// Records text read from the chart for `field`.
    ///
    /// Non-empty text that does not parse as a number gets a conversion
    /// error message so the caller can prompt for manual input; empty
    /// text simply leaves the field unsatisfied.
    pub fn set_detected(&mut self, field: ReferenceField, text: impl Into<String>) {
        let text = text.into();
        let conversion_error = if !text.trim().is_empty() && text.trim().parse::<f32>().is_err() {
            Some(format!("Manual input needed for {field} value: '{text}'"))
        } else {
            None
        };
        *self.get_mut(field) = ReferenceValue {
            text,
            source: ValueSource::Detected,
            conversion_error,
        };
    }

    /// Records that the detected region for `field` could not be read
    /// at all (engine failure rather than unparsable text).
    ///
    /// Leaves the text empty and stores a conversion error so status
    /// displays prompt for manual input, the same way unparsable text
    /// does.
    pub fn set_unreadable(&mut self, field: ReferenceField) {
        *self.get_mut(field) = ReferenceValue {
            text: String::new(),
            source: ValueSource::Detected,
            conversion_error: Some(format!(
                "Manual input needed for {field} value: recognition failed"
            )),
        };
    }

    /// Overrides `field` with an operator-supplied value.
    ///
    /// Manual values take precedence over detected ones and clear any
    /// conversion error. The text is not required to be numeric here;
    /// readiness checks and measurement validate it where it matters.
    pub fn set_manual(&mut self, field: ReferenceField, text: impl Into<String>) {
        *self.get_mut(field) = ReferenceValue {
            text: text.into(),
            source: ValueSource::Manual,
            conversion_error: None,
        };
    }

    /// Clears both values, e.g. when a new chart is ingested.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The numeric value of `field`.
    ///
    /// # Returns
    ///
    /// * `Ok(f32)` - When the stored text parses as a finite number.
    /// * `Err(ChartError::Calibration)` - Naming the field and the raw
    ///   text otherwise.
    pub fn value(&self, field: ReferenceField) -> ChartResult<f32> {
        self.get(field).parse().ok_or_else(|| ChartError::Calibration {
            field,
            text: self.get(field).text.clone(),
        })
    }

    /// Whether `field` currently holds a finite numeric value.
    pub fn is_numeric(&self, field: ReferenceField) -> bool {
        self.get(field).is_numeric()
    }
}
