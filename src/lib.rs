//! signal-bot: daily trading-signal batch bot
//!
//! This library provides the core components for:
//! - Daily candles from a chart API
//! - Technical indicators normalized into directional signals
//! - Weighted composite scoring with long/short thresholds
//! - Paper positions resolved by take-profit, stop-loss or expiry
//! - Outcome-driven recalibration of indicator weights
//! - An idempotent trade ledger keyed by trade id
//! - Ticker intake from notification mail and run digests
//! - Structured logging and Prometheus metrics

pub mod calibration;
pub mod cli;
pub mod config;
pub mod inbox;
pub mod indicators;
pub mod ledger;
pub mod market;
pub mod notify;
pub mod pipeline;
pub mod positions;
pub mod signal;
pub mod telemetry;
