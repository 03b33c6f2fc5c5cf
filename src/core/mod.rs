//! Core building blocks of the analyzer.
//!
//! This module contains the pieces shared by every other module:
//! - Error handling
//! - Configuration
//! - Constants
//! - The trait seam to the external text recognition engine
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod constants;
pub mod errors;
pub mod traits;

pub use config::AnalyzerConfig;
pub use constants::*;
pub use errors::{ChartError, ChartResult, ReferenceField};
pub use traits::{OcrMode, TextRecognizer};

/// Initializes the tracing subscriber for logging.
///
/// This sets up an environment-filtered formatting subscriber. Binaries
/// and test harnesses call it once at startup; the library itself only
/// emits events.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
