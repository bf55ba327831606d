//! Signal scoring module
//!
//! Combines normalized indicator readings into a weighted composite score
//! and turns it into a trade decision

mod scorer;
mod types;
mod weights;

pub use scorer::{score, SignalScorer};
pub use types::{Decision, Direction, HoldReason, Signal};
pub use weights::Weights;
