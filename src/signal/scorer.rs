//! Weighted composite scoring

use super::{Decision, Direction, HoldReason, Signal, Weights};
use crate::config::{IndicatorConfig, SignalConfig};
use crate::indicators::{compute_readings, Readings};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Weighted average of the available readings
///
/// Indicators missing from `readings` drop out and the remaining weights are
/// renormalized. Returns `None` when no weight mass covers the readings.
pub fn score(readings: &Readings, weights: &Weights) -> Option<Decimal> {
    let mut weight_sum = dec!(0);
    let mut weighted = dec!(0);
    for (kind, value) in readings {
        let weight = weights.get(*kind);
        weight_sum += weight;
        weighted += weight * *value;
    }
    if weight_sum <= dec!(0) {
        return None;
    }
    Some((weighted / weight_sum).clamp(dec!(-1), dec!(1)))
}

/// Turns price history into trade decisions
pub struct SignalScorer {
    indicators: IndicatorConfig,
    thresholds: SignalConfig,
    weights: Weights,
}

impl SignalScorer {
    /// Create a new scorer
    pub fn new(indicators: IndicatorConfig, thresholds: SignalConfig, weights: Weights) -> Self {
        Self {
            indicators,
            thresholds,
            weights,
        }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Apply thresholds to a composite score
    pub fn decide(&self, score: Decimal, available: usize) -> Decision {
        if available < self.thresholds.min_indicators {
            return Decision::Hold(HoldReason::InsufficientData);
        }
        if score >= self.thresholds.long_threshold {
            Decision::Enter(Direction::Long)
        } else if score <= -self.thresholds.short_threshold {
            Decision::Enter(Direction::Short)
        } else {
            Decision::Hold(HoldReason::BelowThreshold)
        }
    }

    /// Score a symbol from its closes, oldest first
    ///
    /// Returns `None` for an empty close series.
    pub fn evaluate(&self, symbol: &str, date: NaiveDate, closes: &[Decimal]) -> Option<Signal> {
        let price = *closes.last()?;
        let readings = compute_readings(closes, &self.indicators);

        let (score, decision) = match score(&readings, &self.weights) {
            Some(s) => (s, self.decide(s, readings.len())),
            None => (dec!(0), Decision::Hold(HoldReason::InsufficientData)),
        };

        tracing::debug!(
            symbol,
            %score,
            indicators = readings.len(),
            decision = %decision,
            "Scored symbol"
        );

        Some(Signal {
            symbol: symbol.to_string(),
            date,
            price,
            readings,
            score,
            decision,
            confidence: score.abs(),
        })
    }
}
