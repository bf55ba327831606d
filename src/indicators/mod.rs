//! Technical indicators
//!
//! Raw indicator math over daily closes (oldest first) plus normalization of
//! each indicator into a directional signal in `[-1, 1]`, where positive
//! values lean long and negative values lean short.

mod oscillators;
mod trend;

pub use oscillators::{percent_b, rate_of_change, rsi};
pub use trend::{ema_series, macd, sma, sma_spread, Macd};

use crate::config::IndicatorConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scale at which an SMA spread saturates the signal (5%)
const SMA_SPREAD_SCALE: Decimal = dec!(0.05);
/// Scale at which a price-relative MACD histogram saturates the signal (1%)
const MACD_HIST_SCALE: Decimal = dec!(0.01);
/// Scale at which rate of change saturates the signal (10%)
const MOMENTUM_SCALE: Decimal = dec!(0.10);

/// Indicators contributing to the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Rsi,
    SmaCross,
    Macd,
    Momentum,
    Bollinger,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 5] = [
        IndicatorKind::Rsi,
        IndicatorKind::SmaCross,
        IndicatorKind::Macd,
        IndicatorKind::Momentum,
        IndicatorKind::Bollinger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::SmaCross => "sma_cross",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Momentum => "momentum",
            IndicatorKind::Bollinger => "bollinger",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Normalized indicator signals keyed by kind
///
/// Indicators without enough history are absent rather than zero.
pub type Readings = BTreeMap<IndicatorKind, Decimal>;

/// Clamp `value / scale` into `[-1, 1]`
///
/// A non-positive scale carries no information and yields 0.
pub fn normalize(value: Decimal, scale: Decimal) -> Decimal {
    if scale <= dec!(0) {
        return dec!(0);
    }
    (value / scale).clamp(dec!(-1), dec!(1))
}

/// RSI below 50 is oversold and leans long
pub fn rsi_signal(rsi: Decimal) -> Decimal {
    normalize(dec!(50) - rsi, dec!(50))
}

/// Price below the lower band (%B < 0) leans long
pub fn bollinger_signal(percent_b: Decimal) -> Decimal {
    (Decimal::ONE - dec!(2) * percent_b).clamp(dec!(-1), dec!(1))
}

/// Compute every available normalized signal for a close series
pub fn compute_readings(closes: &[Decimal], config: &IndicatorConfig) -> Readings {
    let mut readings = Readings::new();

    if let Some(value) = rsi(closes, config.rsi_period) {
        readings.insert(IndicatorKind::Rsi, rsi_signal(value));
    }

    if let Some(spread) = sma_spread(closes, config.sma_fast, config.sma_slow) {
        readings.insert(IndicatorKind::SmaCross, normalize(spread, SMA_SPREAD_SCALE));
    }

    if let (Some(m), Some(last)) = (
        macd(closes, config.macd_fast, config.macd_slow, config.macd_signal),
        closes.last(),
    ) {
        if !last.is_zero() {
            readings.insert(
                IndicatorKind::Macd,
                normalize(m.histogram / *last, MACD_HIST_SCALE),
            );
        }
    }

    if let Some(roc) = rate_of_change(closes, config.momentum_period) {
        readings.insert(IndicatorKind::Momentum, normalize(roc, MOMENTUM_SCALE));
    }

    if let Some(pb) = percent_b(closes, config.bollinger_period, config.bollinger_width) {
        readings.insert(IndicatorKind::Bollinger, bollinger_signal(pb));
    }

    readings
}
