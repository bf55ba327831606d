//! Outcome-driven weight updates

use super::CalibrationError;
use crate::config::CalibrationConfig;
use crate::indicators::{IndicatorKind, Readings};
use crate::positions::{ClosedPosition, Outcome};
use crate::signal::{Direction, Weights};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One resolved trade as seen by the calibrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub readings: Readings,
    pub direction: Direction,
    pub outcome: Outcome,
}

impl CalibrationSample {
    /// Direction the market actually went
    pub fn realized_direction(&self) -> Direction {
        match self.outcome {
            Outcome::Won => self.direction,
            Outcome::Lost => self.direction.opposite(),
        }
    }
}

impl From<&ClosedPosition> for CalibrationSample {
    fn from(closed: &ClosedPosition) -> Self {
        Self {
            readings: closed.position.readings.clone(),
            direction: closed.position.direction,
            outcome: closed.resolution.outcome,
        }
    }
}

/// Per-indicator hit statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndicatorStats {
    /// Samples where the indicator leaned one way
    pub votes: usize,
    /// Votes matching the realized direction
    pub hits: usize,
}

impl IndicatorStats {
    pub fn hit_rate(&self) -> Option<Decimal> {
        if self.votes == 0 {
            return None;
        }
        Some(Decimal::from(self.hits as u64) / Decimal::from(self.votes as u64))
    }
}

/// Result of one calibration pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub before: Weights,
    pub after: Weights,
    pub stats: BTreeMap<IndicatorKind, IndicatorStats>,
    pub samples_used: usize,
}

impl CalibrationReport {
    /// Whether any weight moved
    pub fn changed(&self) -> bool {
        self.before.normalized() != self.after
    }
}

/// Adjusts weights from the hit rates of resolved trades
///
/// Each indicator votes with the sign of its reading at entry, abstaining
/// inside the neutral band. An indicator with at least `min_samples` votes
/// has its weight scaled by `1 + learning_rate * 2 * (hit_rate - 0.5)`, so a
/// coin-flip record leaves it unchanged. Weights are then held inside
/// `[min_weight, max_weight]` and renormalized to sum to one.
#[derive(Debug, Clone)]
pub struct Calibrator {
    config: CalibrationConfig,
}

impl Calibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    /// Count votes and hits over the most recent `window` samples
    pub fn tally(&self, samples: &[CalibrationSample]) -> BTreeMap<IndicatorKind, IndicatorStats> {
        let start = samples.len().saturating_sub(self.config.window);
        let mut stats: BTreeMap<IndicatorKind, IndicatorStats> = BTreeMap::new();

        for sample in &samples[start..] {
            let realized = sample.realized_direction();
            for (kind, reading) in &sample.readings {
                if reading.abs() <= self.config.neutral_band {
                    continue;
                }
                let entry = stats.entry(*kind).or_default();
                entry.votes += 1;
                if (*reading > dec!(0)) == (realized == Direction::Long) {
                    entry.hits += 1;
                }
            }
        }
        stats
    }

    /// Produce updated weights
    pub fn calibrate(
        &self,
        current: &Weights,
        samples: &[CalibrationSample],
    ) -> Result<CalibrationReport, CalibrationError> {
        if samples.is_empty() {
            return Err(CalibrationError::NoSamples);
        }
        let stats = self.tally(samples);
        let samples_used = samples.len().min(self.config.window);

        let mut updated = current.normalized();
        for kind in IndicatorKind::ALL {
            let Some(stat) = stats.get(&kind) else {
                continue;
            };
            if stat.votes < self.config.min_samples {
                continue;
            }
            let Some(hit_rate) = stat.hit_rate() else {
                continue;
            };
            let factor =
                Decimal::ONE + self.config.learning_rate * dec!(2) * (hit_rate - dec!(0.5));
            let weight = updated.get(kind);
            if weight.is_zero() {
                continue;
            }
            updated.set(kind, weight * factor);

            tracing::debug!(
                indicator = %kind,
                votes = stat.votes,
                hits = stat.hits,
                %hit_rate,
                %factor,
                "Indicator weight updated"
            );
        }

        let after = self.bound(updated.normalized());
        Ok(CalibrationReport {
            before: current.clone(),
            after,
            stats,
            samples_used,
        })
    }

    /// Hold weights inside the configured bounds while keeping their sum at one
    ///
    /// Weights breaking a bound are pinned to it and the remaining mass is
    /// shared among the others in proportion to their current weight. Upper
    /// violations are pinned before lower ones. When no assignment can
    /// satisfy the bounds, the weights are only normalized.
    fn bound(&self, weights: Weights) -> Weights {
        let (min, max) = (self.config.min_weight, self.config.max_weight);
        let entries: Vec<(IndicatorKind, Decimal)> = weights.iter().collect();
        let n = Decimal::from(entries.len() as u64);
        if entries.is_empty() || max * n < Decimal::ONE || min * n > Decimal::ONE {
            tracing::debug!(%min, %max, indicators = entries.len(), "Weight bounds infeasible, normalizing only");
            return weights.normalized();
        }
        let mut pinned: BTreeMap<IndicatorKind, Decimal> = BTreeMap::new();

        for _ in 0..=entries.len() {
            let free: Vec<(IndicatorKind, Decimal)> = entries
                .iter()
                .copied()
                .filter(|(kind, _)| !pinned.contains_key(kind))
                .collect();
            if free.is_empty() {
                break;
            }

            let remaining = (Decimal::ONE - pinned.values().sum::<Decimal>()).max(dec!(0));
            let free_total: Decimal = free.iter().map(|(_, w)| *w).sum();
            let shared: Vec<(IndicatorKind, Decimal)> = free
                .iter()
                .map(|(kind, w)| {
                    let share = if free_total > dec!(0) {
                        *w * remaining / free_total
                    } else {
                        remaining / Decimal::from(free.len() as u64)
                    };
                    (*kind, share.round_dp(6))
                })
                .collect();

            let mut violators: Vec<(IndicatorKind, Decimal)> =
                shared.iter().copied().filter(|(_, w)| *w > max).collect();
            if violators.is_empty() {
                violators = shared.iter().copied().filter(|(_, w)| *w < min).collect();
            }
            if violators.is_empty() {
                pinned.extend(shared);
                return Weights::new(pinned);
            }
            for (kind, w) in violators {
                pinned.insert(kind, w.clamp(min, max));
            }
        }

        // Bounds cannot hold for this many indicators
        Weights::new(pinned).normalized()
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}
