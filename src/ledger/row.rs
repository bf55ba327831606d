//! Ledger rows and upsert semantics

use crate::calibration::CalibrationSample;
use crate::indicators::Readings;
use crate::positions::{ClosedPosition, Outcome, Position, TradeId, TradeStatus};
use crate::signal::Direction;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One trade as recorded in the ledger sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub trade_id: TradeId,
    pub symbol: String,
    pub direction: Direction,
    pub status: TradeStatus,
    pub opened_on: NaiveDate,
    pub entry_price: Decimal,
    pub score: Decimal,
    #[serde(default)]
    pub readings: Readings,
    #[serde(default)]
    pub closed_on: Option<NaiveDate>,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    #[serde(default)]
    pub return_pct: Option<Decimal>,
}

impl LedgerRow {
    /// Row for a freshly opened position
    pub fn open(position: &Position) -> Self {
        Self {
            trade_id: position.id.clone(),
            symbol: position.symbol.clone(),
            direction: position.direction,
            status: TradeStatus::Open,
            opened_on: position.opened_on,
            entry_price: position.entry_price,
            score: position.score,
            readings: position.readings.clone(),
            closed_on: None,
            exit_price: None,
            return_pct: None,
        }
    }

    /// Row for a resolved position
    pub fn closed(closed: &ClosedPosition) -> Self {
        let mut row = Self::open(&closed.position);
        row.status = closed.resolution.outcome.into();
        row.closed_on = Some(closed.resolution.closed_on);
        row.exit_price = Some(closed.resolution.exit_price);
        row.return_pct = Some(closed.resolution.return_pct);
        row
    }

    /// Rebuild the open position this row records
    pub fn to_position(&self) -> Option<Position> {
        if self.status != TradeStatus::Open {
            return None;
        }
        Some(Position {
            id: self.trade_id.clone(),
            symbol: self.symbol.clone(),
            direction: self.direction,
            entry_price: self.entry_price,
            opened_on: self.opened_on,
            score: self.score,
            readings: self.readings.clone(),
        })
    }

    /// Calibration sample for a resolved row
    pub fn to_sample(&self) -> Option<CalibrationSample> {
        let outcome = match self.status {
            TradeStatus::Open => return None,
            TradeStatus::Won => Outcome::Won,
            TradeStatus::Lost => Outcome::Lost,
        };
        Some(CalibrationSample {
            readings: self.readings.clone(),
            direction: self.direction,
            outcome,
        })
    }
}

/// Counts from one upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Identical row already present
    pub unchanged: usize,
}

/// Merge `batch` into `table` keyed by trade id
///
/// Existing ids are replaced in place, new ids are appended in the order
/// they first appear in the batch, and repeated ids inside the batch collapse
/// to their last occurrence.
pub fn upsert_rows(table: &mut Vec<LedgerRow>, batch: Vec<LedgerRow>) -> UpsertSummary {
    let mut deduped: Vec<LedgerRow> = Vec::with_capacity(batch.len());
    let mut batch_index: HashMap<TradeId, usize> = HashMap::new();
    for row in batch {
        match batch_index.get(&row.trade_id).copied() {
            Some(i) => deduped[i] = row,
            None => {
                batch_index.insert(row.trade_id.clone(), deduped.len());
                deduped.push(row);
            }
        }
    }

    let mut index: HashMap<TradeId, usize> = table
        .iter()
        .enumerate()
        .map(|(i, row)| (row.trade_id.clone(), i))
        .collect();

    let mut summary = UpsertSummary::default();
    for row in deduped {
        match index.get(&row.trade_id).copied() {
            Some(i) if table[i] == row => summary.unchanged += 1,
            Some(i) => {
                table[i] = row;
                summary.updated += 1;
            }
            None => {
                index.insert(row.trade_id.clone(), table.len());
                table.push(row);
                summary.inserted += 1;
            }
        }
    }
    summary
}
