//! CLI interface for signal-bot
//!
//! Provides subcommands for:
//! - `run`: Full daily run (score, open, resolve, calibrate, record, notify)
//! - `scan`: Score symbols without recording anything
//! - `resolve`: Resolve open positions only
//! - `calibrate`: Recalibrate indicator weights
//! - `status`: Show ledger statistics and current weights
//! - `config`: Show the effective configuration

mod calibrate;
mod run;
mod scan;
mod status;

pub use calibrate::CalibrateArgs;
pub use run::{ResolveArgs, RunArgs};
pub use scan::ScanArgs;
pub use status::{print_config, print_status};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "signal-bot")]
#[command(about = "Daily trading-signal bot with outcome-driven weight calibration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Full daily run
    Run(RunArgs),
    /// Score symbols without recording anything
    Scan(ScanArgs),
    /// Resolve open positions only
    Resolve(ResolveArgs),
    /// Recalibrate indicator weights
    Calibrate(CalibrateArgs),
    /// Show ledger statistics and current weights
    Status,
    /// Show configuration
    Config,
}

/// Run date, defaulting to the local calendar date
pub(crate) fn run_date(date: Option<chrono::NaiveDate>) -> chrono::NaiveDate {
    date.unwrap_or_else(|| chrono::Local::now().date_naive())
}
