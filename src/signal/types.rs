//! Signal types

use crate::indicators::Readings;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Profits when price rises
    Long,
    /// Profits when price falls
    Short,
}

impl Direction {
    /// The other direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// +1 for long, -1 for short
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.pad("long"),
            Direction::Short => f.pad("short"),
        }
    }
}

/// Why a signal did not turn into a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldReason {
    /// Composite score inside the thresholds
    BelowThreshold,
    /// Too few indicators had enough history
    InsufficientData,
}

/// Outcome of scoring a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Open a position in the given direction
    Enter(Direction),
    /// Do nothing
    Hold(HoldReason),
}

impl Decision {
    /// Direction to trade, if any
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Decision::Enter(direction) => Some(*direction),
            Decision::Hold(_) => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Enter(direction) => write!(f, "{}", direction),
            Decision::Hold(HoldReason::BelowThreshold) => f.write_str("hold"),
            Decision::Hold(HoldReason::InsufficientData) => f.write_str("hold (insufficient data)"),
        }
    }
}

/// A scored symbol for one trading day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Ticker symbol
    pub symbol: String,
    /// Date of the last candle used
    pub date: NaiveDate,
    /// Last close
    pub price: Decimal,
    /// Normalized indicator signals
    pub readings: Readings,
    /// Weighted composite score in [-1, 1]
    pub score: Decimal,
    /// Trade decision
    pub decision: Decision,
    /// Magnitude of the score
    pub confidence: Decimal,
}
