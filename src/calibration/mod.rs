//! Weight calibration module
//!
//! Periodically re-weights indicators from the outcomes of resolved trades

mod calibrator;
mod store;

pub use calibrator::{CalibrationReport, CalibrationSample, Calibrator, IndicatorStats};
pub use store::{WeightState, WeightStore, WEIGHTS_FILE};

use thiserror::Error;

/// Calibration errors
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// Nothing resolved yet
    #[error("No resolved trades to calibrate from")]
    NoSamples,
    /// Weight file could not be read or written
    #[error("Weight store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Weight file is not valid JSON
    #[error("Weight store is corrupt: {0}")]
    Decode(#[from] serde_json::Error),
}
