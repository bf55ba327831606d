//! Persisted weights

use super::CalibrationError;
use crate::signal::Weights;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the weight state inside the state directory
pub const WEIGHTS_FILE: &str = "weights.json";

/// Weights together with the time they were last calibrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightState {
    pub weights: Weights,
    /// `None` until the first calibration
    pub calibrated_at: Option<DateTime<Utc>>,
}

impl WeightState {
    /// Whether a recalibration is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>, interval_days: i64) -> bool {
        match self.calibrated_at {
            Some(at) => now - at >= Duration::days(interval_days),
            None => true,
        }
    }
}

/// JSON file store for [`WeightState`]
#[derive(Debug, Clone)]
pub struct WeightStore {
    path: PathBuf,
}

impl WeightStore {
    /// Store at `{state_dir}/weights.json`
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(WEIGHTS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted weights, falling back to `initial` when none exist yet
    pub async fn load_or(&self, initial: Weights) -> Result<WeightState, CalibrationError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No calibrated weights yet, using configured weights");
                Ok(WeightState {
                    weights: initial.normalized(),
                    calibrated_at: None,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist weights via write-then-rename
    pub async fn save(&self, state: &WeightState) -> Result<(), CalibrationError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(state)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "Weights saved");
        Ok(())
    }
}
