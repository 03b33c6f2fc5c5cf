//! Height computation.
//!
//! Converts the pixel geometry held by the registry into real chart
//! units using a linear calibration derived from the origin and ymax
//! reference values.
//!
//! Vertical convention: boxes store `y1` as the top edge and `y2` as the
//! bottom edge (image y grows downward), and every span is taken as an
//! absolute value, so the math is insensitive to a detector that swaps
//! the two. The scale factor is `(ymax - origin) / yaxis_span` with a
//! positive pixel span; a bar spanning the full y-axis therefore reads
//! exactly `ymax`.

use crate::core::constants::DEFAULT_BAR_NAME_PREFIX;
use crate::core::errors::{ChartError, ChartResult, ReferenceField};
use crate::domain::calibration::CalibrationState;
use crate::domain::category::Category;
use crate::domain::registry::DetectionRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Measurements derived for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartMeasurements {
    /// Bar heights in chart units, in rank order.
    pub bar_heights: Vec<f32>,
    /// Error-bar spans in chart units, in rank order. Relative spans,
    /// not absolute positions.
    pub uptail_heights: Vec<f32>,
    /// One name per bar, extracted or synthesized.
    pub bar_names: Vec<String>,
    /// The origin reference value used for this computation.
    pub origin_value: f32,
    /// The ymax reference value used for this computation.
    pub ymax_value: f32,
}

/// All measurements for the current image, keyed by chart title text
/// (the empty string when no title was detected).
///
/// Recomputed whole on every request; never patched in place.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MeasurementResult {
    /// Per-chart measurements.
    #[serde(flatten)]
    pub charts: BTreeMap<String, ChartMeasurements>,
}

/// Computes bar and uptail heights from current registry state.
///
/// Fails with [`ChartError::NotReady`] when any required component is
/// missing (the error carries the missing list) and with
/// [`ChartError::Calibration`] when a reference value does not parse.
/// Never substitutes defaults for missing pieces.
///
/// `x_labels` is the extracted x-group label list. When it holds at
/// least one name per bar it is truncated to the bar count; otherwise
/// default names are synthesized and written back so later calls and
/// renames see the same list.
pub fn calculate_heights(
    registry: &DetectionRegistry,
    calibration: &CalibrationState,
    chart_title: &str,
    x_labels: &mut Vec<String>,
) -> ChartResult<MeasurementResult> {
    let status = registry.component_status(calibration);
    if !status.ready {
        return Err(ChartError::NotReady {
            missing: status
                .missing
                .iter()
                .map(|category| category.as_str().to_string())
                .collect(),
        });
    }

    let origin_value = calibration.value(ReferenceField::Origin)?;
    let ymax_value = calibration.value(ReferenceField::Ymax)?;

    // Readiness guarantees the bucket is non-empty.
    let yaxis = registry
        .single(Category::Yaxis)
        .ok_or_else(|| ChartError::NotReady {
            missing: vec![Category::Yaxis.as_str().to_string()],
        })?;
    let yaxis_span = yaxis.bbox.vertical_span();
    let scale_factor = (ymax_value - origin_value) / yaxis_span;
    debug!(yaxis_span, scale_factor, "derived calibration scale");

    let bar_heights: Vec<f32> = registry
        .bucket(Category::Bar)
        .iter()
        .map(|bar| bar.bbox.vertical_span() * scale_factor + origin_value)
        .collect();

    let uptail_heights: Vec<f32> = registry
        .bucket(Category::Uptail)
        .iter()
        .map(|uptail| uptail.bbox.vertical_span() * scale_factor)
        .collect();

    let num_bars = bar_heights.len();
    let bar_names: Vec<String> = if x_labels.len() >= num_bars {
        x_labels[..num_bars].to_vec()
    } else {
        let names: Vec<String> = (1..=num_bars)
            .map(|i| format!("{DEFAULT_BAR_NAME_PREFIX} {i}"))
            .collect();
        *x_labels = names.clone();
        names
    };

    debug!(
        bars = num_bars,
        uptails = uptail_heights.len(),
        title = chart_title,
        "calculated heights"
    );

    let mut charts = BTreeMap::new();
    charts.insert(
        chart_title.to_string(),
        ChartMeasurements {
            bar_heights,
            uptail_heights,
            bar_names,
            origin_value,
            ymax_value,
        },
    );
    Ok(MeasurementResult { charts })
}
