//! Telemetry module
//!
//! Structured logging and Prometheus metrics. A batch run has no scrape
//! endpoint, so the exposition is written to a textfile when the run ends.

mod logging;
mod metrics;

pub use self::metrics::{
    increment, record_latency, record_outcome, set_gauge, set_indicator_weight, CounterMetric,
    GaugeMetric, LatencyMetric,
};
pub use logging::init_logging;

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::{Path, PathBuf};

/// Guard that flushes metrics on drop
pub struct TelemetryGuard {
    handle: Option<PrometheusHandle>,
    textfile: Option<PathBuf>,
}

impl TelemetryGuard {
    /// Write the current exposition to the configured textfile
    pub fn flush(&self) -> anyhow::Result<()> {
        match (&self.handle, &self.textfile) {
            (Some(handle), Some(path)) => write_textfile(handle, path),
            _ => Ok(()),
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "Failed to write metrics textfile");
        }
    }
}

fn write_textfile(handle: &PrometheusHandle, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, handle.render())?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), "Metrics textfile written");
    Ok(())
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    let handle = match config.metrics_textfile {
        Some(_) => Some(PrometheusBuilder::new().install_recorder()?),
        None => None,
    };

    Ok(TelemetryGuard {
        handle,
        textfile: config.metrics_textfile.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_textfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics").join("signal_bot.prom");
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            increment(CounterMetric::Calibrations, 1);
        });
        write_textfile(&handle, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("signalbot_calibrations_total 1"));
    }

    #[test]
    fn test_guard_without_textfile_is_noop() {
        let guard = TelemetryGuard {
            handle: None,
            textfile: None,
        };
        assert!(guard.flush().is_ok());
    }
}
