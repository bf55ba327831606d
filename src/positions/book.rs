//! Position book

use super::{ClosedPosition, OutcomeResolver, Position, TradeId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Tracks open positions and the ones closed during this run
#[derive(Debug, Default)]
pub struct PositionBook {
    /// Open positions by ID
    pub open_positions: HashMap<TradeId, Position>,
    /// Positions closed since the book was built
    pub closed_positions: Vec<ClosedPosition>,
}

impl PositionBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the book with positions carried over from earlier runs
    pub fn with_open(positions: impl IntoIterator<Item = Position>) -> Self {
        Self {
            open_positions: positions.into_iter().map(|p| (p.id.clone(), p)).collect(),
            closed_positions: Vec::new(),
        }
    }

    /// Whether a symbol already has an open position
    pub fn has_open(&self, symbol: &str) -> bool {
        self.open_positions.values().any(|p| p.symbol == symbol)
    }

    /// Add a position
    ///
    /// Refused when the trade id is already open or the symbol already has an
    /// open position.
    pub fn open(&mut self, position: Position) -> bool {
        if self.open_positions.contains_key(&position.id) || self.has_open(&position.symbol) {
            return false;
        }
        self.open_positions.insert(position.id.clone(), position);
        true
    }

    /// Resolve every open position that has a latest price
    ///
    /// Returns the positions closed by this call.
    pub fn resolve_all(
        &mut self,
        resolver: &OutcomeResolver,
        latest_prices: &HashMap<String, Decimal>,
        today: NaiveDate,
    ) -> Vec<ClosedPosition> {
        let mut ids: Vec<TradeId> = self.open_positions.keys().cloned().collect();
        ids.sort();

        let mut closed = Vec::new();
        for id in ids {
            let Some(position) = self.open_positions.get(&id) else {
                continue;
            };
            let Some(price) = latest_prices.get(&position.symbol) else {
                tracing::warn!(trade_id = %id, symbol = %position.symbol, "No latest price, leaving open");
                continue;
            };
            let Some(resolution) = resolver.resolve(position, *price, today) else {
                continue;
            };
            if let Some(position) = self.open_positions.remove(&id) {
                tracing::info!(
                    trade_id = %id,
                    outcome = ?resolution.outcome,
                    return_pct = %resolution.return_pct,
                    "Position resolved"
                );
                closed.push(ClosedPosition {
                    position,
                    resolution,
                });
            }
        }

        self.closed_positions.extend(closed.iter().cloned());
        closed
    }

    /// Number of open positions
    pub fn open_count(&self) -> usize {
        self.open_positions.len()
    }
}
