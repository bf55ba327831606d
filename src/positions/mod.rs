//! Paper positions and outcome resolution
//!
//! Positions are opened from actionable signals and later resolved as won or
//! lost against the latest close.

mod book;
mod resolver;
mod types;

pub use book::PositionBook;
pub use resolver::OutcomeResolver;
pub use types::{ClosedPosition, Outcome, Position, Resolution, TradeId, TradeStatus};
