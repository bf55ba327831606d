//! Prometheus metrics

use crate::indicators::IndicatorKind;
use crate::positions::Outcome;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One provider request
    Fetch,
    /// A whole pipeline run
    Run,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Symbols scored
    SignalsScored,
    /// Symbols whose data could not be fetched
    FetchFailures,
    /// Positions opened
    PositionsOpened,
    /// Tickers picked up from notifications
    AlertsIngested,
    /// Ledger rows inserted or updated
    LedgerRowsWritten,
    /// Completed calibration passes
    Calibrations,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Positions still open after the run
    OpenPositions,
    /// Won / resolved over the whole ledger
    WinRate,
    /// Mean return of resolved trades
    AvgReturn,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Fetch => "signalbot_fetch_latency_ms",
        LatencyMetric::Run => "signalbot_run_duration_ms",
    };
    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter
pub fn increment(metric: CounterMetric, value: u64) {
    let metric_name = match metric {
        CounterMetric::SignalsScored => "signalbot_signals_scored_total",
        CounterMetric::FetchFailures => "signalbot_fetch_failures_total",
        CounterMetric::PositionsOpened => "signalbot_positions_opened_total",
        CounterMetric::AlertsIngested => "signalbot_alerts_ingested_total",
        CounterMetric::LedgerRowsWritten => "signalbot_ledger_rows_written_total",
        CounterMetric::Calibrations => "signalbot_calibrations_total",
    };
    metrics::counter!(metric_name).increment(value);
}

/// Count a resolved position by outcome
pub fn record_outcome(outcome: Outcome) {
    let label = match outcome {
        Outcome::Won => "won",
        Outcome::Lost => "lost",
    };
    metrics::counter!("signalbot_positions_resolved_total", "outcome" => label).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: Decimal) {
    let metric_name = match metric {
        GaugeMetric::OpenPositions => "signalbot_open_positions",
        GaugeMetric::WinRate => "signalbot_win_rate",
        GaugeMetric::AvgReturn => "signalbot_avg_return",
    };
    metrics::gauge!(metric_name).set(value.to_f64().unwrap_or_default());
}

/// Publish the current weight of an indicator
pub fn set_indicator_weight(kind: IndicatorKind, weight: Decimal) {
    metrics::gauge!("signalbot_indicator_weight", "indicator" => kind.as_str())
        .set(weight.to_f64().unwrap_or_default());
}
