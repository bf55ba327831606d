//! Configuration types for signal-bot

use crate::indicators::IndicatorKind;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A period of zero bars
    #[error("Indicator period `{0}` must be positive")]
    ZeroPeriod(&'static str),
    /// Fast average not faster than slow average
    #[error("`{fast}` must be shorter than `{slow}`")]
    PeriodOrder {
        fast: &'static str,
        slow: &'static str,
    },
    /// Threshold outside (0, 1]
    #[error("Threshold `{0}` must be in (0, 1], got {1}")]
    ThresholdOutOfRange(&'static str, Decimal),
    /// Learning rate outside (0, 1]
    #[error("Learning rate must be in (0, 1], got {0}")]
    LearningRateOutOfRange(Decimal),
    /// Weight bounds inverted or negative
    #[error("Invalid weight bounds: min={min}, max={max}")]
    WeightBounds { min: Decimal, max: Decimal },
    /// Negative initial weight
    #[error("Initial weight for {0} must not be negative")]
    NegativeWeight(IndicatorKind),
    /// Exit rule that can never trigger
    #[error("`{0}` must be positive")]
    NonPositiveExit(&'static str),
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub watchlist: WatchlistConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub positions: PositionConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub inbox: InboxConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Symbols scanned on every run
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistConfig {
    pub symbols: Vec<String>,
}

/// Market-data provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    /// Calendar days of daily candles to request
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}
fn default_lookback_days() -> u32 {
    120
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            lookback_days: default_lookback_days(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Indicator periods
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub momentum_period: usize,
    pub bollinger_period: usize,
    pub bollinger_width: Decimal,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            sma_fast: 10,
            sma_slow: 30,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            momentum_period: 10,
            bollinger_period: 20,
            bollinger_width: dec!(2),
        }
    }
}

/// Decision thresholds for the composite score
#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Score at or above which a long position is opened
    #[serde(default = "default_threshold")]
    pub long_threshold: Decimal,
    /// Score at or below the negative of which a short position is opened
    #[serde(default = "default_threshold")]
    pub short_threshold: Decimal,
    /// Minimum number of available indicators to act on a score
    #[serde(default = "default_min_indicators")]
    pub min_indicators: usize,
}

fn default_threshold() -> Decimal {
    Decimal::new(25, 2) // 0.25
}
fn default_min_indicators() -> usize {
    3
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            long_threshold: default_threshold(),
            short_threshold: default_threshold(),
            min_indicators: default_min_indicators(),
        }
    }
}

/// Initial indicator weights, used until the first calibration
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct WeightsConfig(pub BTreeMap<IndicatorKind, Decimal>);

impl Default for WeightsConfig {
    fn default() -> Self {
        Self(
            IndicatorKind::ALL
                .iter()
                .map(|kind| (*kind, Decimal::ONE))
                .collect(),
        )
    }
}

/// Weight recalibration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    /// Days between recalibrations
    #[serde(default = "default_interval_days")]
    pub interval_days: i64,
    /// Step size of the multiplicative update
    #[serde(default = "default_learning_rate")]
    pub learning_rate: Decimal,
    /// Votes an indicator needs before its weight moves
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    #[serde(default = "default_min_weight")]
    pub min_weight: Decimal,
    #[serde(default = "default_max_weight")]
    pub max_weight: Decimal,
    /// Most recent resolved trades considered
    #[serde(default = "default_window")]
    pub window: usize,
    /// Readings with magnitude at or below this abstain
    #[serde(default = "default_neutral_band")]
    pub neutral_band: Decimal,
}

fn default_interval_days() -> i64 {
    7
}
fn default_learning_rate() -> Decimal {
    Decimal::new(5, 1) // 0.5
}
fn default_min_samples() -> usize {
    5
}
fn default_min_weight() -> Decimal {
    Decimal::new(5, 2) // 0.05
}
fn default_max_weight() -> Decimal {
    Decimal::new(6, 1) // 0.6
}
fn default_window() -> usize {
    200
}
fn default_neutral_band() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            interval_days: default_interval_days(),
            learning_rate: default_learning_rate(),
            min_samples: default_min_samples(),
            min_weight: default_min_weight(),
            max_weight: default_max_weight(),
            window: default_window(),
            neutral_band: default_neutral_band(),
        }
    }
}

/// Exit rules for open positions
#[derive(Debug, Clone, Deserialize)]
pub struct PositionConfig {
    #[serde(default = "default_take_profit")]
    pub take_profit_pct: Decimal,
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pct: Decimal,
    #[serde(default = "default_max_hold_days")]
    pub max_hold_days: i64,
}

fn default_take_profit() -> Decimal {
    Decimal::new(5, 2) // 0.05 = 5%
}
fn default_stop_loss() -> Decimal {
    Decimal::new(3, 2) // 0.03 = 3%
}
fn default_max_hold_days() -> i64 {
    10
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            take_profit_pct: default_take_profit(),
            stop_loss_pct: default_stop_loss(),
            max_hold_days: default_max_hold_days(),
        }
    }
}

/// Trade ledger location
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("./state/ledger.json")
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

/// Persistent state directory (calibrated weights)
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./state")
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
        }
    }
}

/// Notification intake from the mail spool
#[derive(Debug, Clone, Deserialize)]
pub struct InboxConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,
}

fn default_spool_dir() -> PathBuf {
    PathBuf::from("./spool")
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spool_dir: default_spool_dir(),
        }
    }
}

/// Digest delivery
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
}

fn default_outbox_dir() -> PathBuf {
    PathBuf::from("./outbox")
}
fn default_from() -> String {
    "signal-bot@localhost".to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            outbox_dir: default_outbox_dir(),
            from: default_from(),
            to: Vec::new(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exposition written here at the end of a run
    #[serde(default)]
    pub metrics_textfile: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_textfile: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot act on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        for (name, period) in [
            ("rsi_period", ind.rsi_period),
            ("sma_fast", ind.sma_fast),
            ("macd_fast", ind.macd_fast),
            ("macd_signal", ind.macd_signal),
            ("momentum_period", ind.momentum_period),
            ("bollinger_period", ind.bollinger_period),
        ] {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod(name));
            }
        }
        if ind.sma_fast >= ind.sma_slow {
            return Err(ConfigError::PeriodOrder {
                fast: "sma_fast",
                slow: "sma_slow",
            });
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::PeriodOrder {
                fast: "macd_fast",
                slow: "macd_slow",
            });
        }

        for (name, value) in [
            ("long_threshold", self.signal.long_threshold),
            ("short_threshold", self.signal.short_threshold),
        ] {
            if value <= dec!(0) || value > dec!(1) {
                return Err(ConfigError::ThresholdOutOfRange(name, value));
            }
        }

        let cal = &self.calibration;
        if cal.learning_rate <= dec!(0) || cal.learning_rate > dec!(1) {
            return Err(ConfigError::LearningRateOutOfRange(cal.learning_rate));
        }
        if cal.min_weight < dec!(0) || cal.min_weight > cal.max_weight {
            return Err(ConfigError::WeightBounds {
                min: cal.min_weight,
                max: cal.max_weight,
            });
        }
        if let Some((kind, _)) = self.weights.0.iter().find(|(_, w)| **w < dec!(0)) {
            return Err(ConfigError::NegativeWeight(*kind));
        }

        if self.positions.take_profit_pct <= dec!(0) {
            return Err(ConfigError::NonPositiveExit("take_profit_pct"));
        }
        if self.positions.stop_loss_pct <= dec!(0) {
            return Err(ConfigError::NonPositiveExit("stop_loss_pct"));
        }
        if self.positions.max_hold_days <= 0 {
            return Err(ConfigError::NonPositiveExit("max_hold_days"));
        }

        Ok(())
    }
}
