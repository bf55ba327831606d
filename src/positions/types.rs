//! Position types

use crate::indicators::Readings;
use crate::signal::{Direction, Signal};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade identifier: `{SYMBOL}-{YYYYMMDD}`
///
/// Derived from the symbol and entry date so a rerun on the same day maps to
/// the same trade.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(String);

impl TradeId {
    pub fn new(symbol: &str, date: NaiveDate) -> Self {
        Self(format!(
            "{}-{}",
            symbol.to_uppercase(),
            date.format("%Y%m%d")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TradeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Final result of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Lost,
}

/// Lifecycle state of a trade as recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Won,
    Lost,
}

impl From<Outcome> for TradeStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Won => TradeStatus::Won,
            Outcome::Lost => TradeStatus::Lost,
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => f.pad("open"),
            TradeStatus::Won => f.pad("won"),
            TradeStatus::Lost => f.pad("lost"),
        }
    }
}

/// An open paper position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Trade identifier
    pub id: TradeId,
    /// Ticker symbol
    pub symbol: String,
    /// Trade direction
    pub direction: Direction,
    /// Close on the entry date
    pub entry_price: Decimal,
    /// Entry date
    pub opened_on: NaiveDate,
    /// Composite score at entry
    pub score: Decimal,
    /// Indicator readings at entry, used for calibration
    pub readings: Readings,
}

impl Position {
    /// Open a position from an actionable signal
    pub fn from_signal(signal: &Signal) -> Option<Self> {
        let direction = signal.decision.direction()?;
        Some(Self {
            id: TradeId::new(&signal.symbol, signal.date),
            symbol: signal.symbol.clone(),
            direction,
            entry_price: signal.price,
            opened_on: signal.date,
            score: signal.score,
            readings: signal.readings.clone(),
        })
    }

    /// Return in the position's favor at `price`
    pub fn directional_return(&self, price: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        (price - self.entry_price) / self.entry_price * self.direction.sign()
    }
}

/// How and when a position closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: Outcome,
    pub exit_price: Decimal,
    pub closed_on: NaiveDate,
    /// Directional return at exit
    pub return_pct: Decimal,
}

/// A position together with its resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub position: Position,
    pub resolution: Resolution,
}
