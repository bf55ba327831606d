//! Indicator weights

use crate::indicators::IndicatorKind;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Non-negative weight per indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(BTreeMap<IndicatorKind, Decimal>);

impl Weights {
    /// Build weights, dropping negative entries
    pub fn new(weights: BTreeMap<IndicatorKind, Decimal>) -> Self {
        Self(
            weights
                .into_iter()
                .filter(|(_, w)| *w >= dec!(0))
                .collect(),
        )
    }

    /// Equal weight over every indicator
    pub fn equal() -> Self {
        let share = Decimal::ONE / Decimal::from(IndicatorKind::ALL.len() as u64);
        Self(IndicatorKind::ALL.iter().map(|k| (*k, share)).collect())
    }

    /// Weight of one indicator, zero when absent
    pub fn get(&self, kind: IndicatorKind) -> Decimal {
        self.0.get(&kind).copied().unwrap_or_default()
    }

    pub fn set(&mut self, kind: IndicatorKind, weight: Decimal) {
        self.0.insert(kind, weight.max(dec!(0)));
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorKind, Decimal)> + '_ {
        self.0.iter().map(|(k, w)| (*k, *w))
    }

    pub fn total(&self) -> Decimal {
        self.0.values().sum()
    }

    /// Scale so the weights sum to one
    ///
    /// All-zero weights carry no preference and become equal weights.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= dec!(0) {
            return Self::equal();
        }
        Self(
            self.0
                .iter()
                .map(|(k, w)| (*k, (*w / total).round_dp(6)))
                .collect(),
        )
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::equal()
    }
}

impl From<BTreeMap<IndicatorKind, Decimal>> for Weights {
    fn from(map: BTreeMap<IndicatorKind, Decimal>) -> Self {
        Self::new(map)
    }
}
