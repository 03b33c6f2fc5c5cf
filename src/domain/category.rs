//! The closed set of chart element categories.
//!
//! Every detection is classified as exactly one of these roles. The set
//! is fixed: labels outside it are not representable, which is what lets
//! the registry key its buckets on an enum instead of scanning string
//! maps.

use crate::core::errors::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Semantic role of a detected chart element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A data bar.
    Bar,
    /// An error-bar whisker above a bar.
    Uptail,
    /// The y-axis line.
    Yaxis,
    /// The x-axis line.
    Xaxis,
    /// The marker carrying the value printed at the axis origin.
    Origin,
    /// The marker carrying the value printed at the top of the y-axis.
    Ymax,
    /// The chart title, usually printed vertically beside the y-axis.
    Label,
    /// A group label under the x-axis.
    XGroup,
    /// A legend entry.
    Legend,
    /// A legend block grouping several entries.
    LegendGroup,
}

impl Category {
    /// Every category, in bucket order.
    pub const ALL: [Category; 10] = [
        Category::Bar,
        Category::Uptail,
        Category::Yaxis,
        Category::Xaxis,
        Category::Origin,
        Category::Ymax,
        Category::Label,
        Category::XGroup,
        Category::Legend,
        Category::LegendGroup,
    ];

    /// Categories that must be available before heights can be computed.
    pub const REQUIRED_FOR_MEASUREMENT: [Category; 5] = [
        Category::Yaxis,
        Category::Xaxis,
        Category::Bar,
        Category::Ymax,
        Category::Origin,
    ];

    /// The snake_case name used in detector labels, ids, and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bar => "bar",
            Category::Uptail => "uptail",
            Category::Yaxis => "yaxis",
            Category::Xaxis => "xaxis",
            Category::Origin => "origin",
            Category::Ymax => "ymax",
            Category::Label => "label",
            Category::XGroup => "x_group",
            Category::Legend => "legend",
            Category::LegendGroup => "legend_group",
        }
    }

    /// Whether entities of this category are ranked by horizontal
    /// position at ingestion. Bars, uptails, and x-groups read left to
    /// right; everything else keeps detector order.
    pub fn is_positional(&self) -> bool {
        matches!(self, Category::Bar | Category::Uptail | Category::XGroup)
    }

    /// Whether the measurement path requires at most one entity of this
    /// category.
    pub fn is_single_instance(&self) -> bool {
        matches!(
            self,
            Category::Yaxis | Category::Xaxis | Category::Origin | Category::Ymax
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ChartError;

    fn from_str(s: &str) -> ChartResult<Self> {
        match s {
            "bar" => Ok(Category::Bar),
            "uptail" => Ok(Category::Uptail),
            "yaxis" => Ok(Category::Yaxis),
            "xaxis" => Ok(Category::Xaxis),
            "origin" => Ok(Category::Origin),
            "ymax" => Ok(Category::Ymax),
            "label" => Ok(Category::Label),
            "x_group" => Ok(Category::XGroup),
            "legend" => Ok(Category::Legend),
            "legend_group" => Ok(Category::LegendGroup),
            other => Err(ChartError::unknown_category(other)),
        }
    }
}
