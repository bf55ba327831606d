//! Status and config command output

use crate::config::Config;
use crate::ledger::LedgerSummary;
use crate::pipeline::Pipeline;
use rust_decimal_macros::dec;

/// Print ledger statistics and the weights in use
pub async fn print_status(pipeline: &Pipeline) -> anyhow::Result<()> {
    let config = pipeline.config();
    let rows = pipeline.ledger().rows().await?;
    let summary = LedgerSummary::from_rows(&rows);

    println!("signal-bot status");
    println!("  Ledger: {}", config.ledger.path.display());
    println!("{}", summary.format_table());

    let state = pipeline.weight_state().await?;
    match state.calibrated_at {
        Some(at) => println!("Weights (calibrated {}):", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("Weights (configured, never calibrated):"),
    }
    for (kind, weight) in state.weights.iter() {
        println!("  {:<10} {:.4}", kind, weight);
    }
    Ok(())
}

/// Print the effective configuration
pub fn print_config(config: &Config) {
    println!("Current configuration:");
    println!("  Watchlist: {}", config.watchlist.symbols.join(", "));
    println!(
        "  Provider: {} ({} days lookback)",
        config.provider.base_url, config.provider.lookback_days
    );
    println!(
        "  Thresholds: long>={}, short<=-{}, min indicators={}",
        config.signal.long_threshold, config.signal.short_threshold, config.signal.min_indicators
    );
    println!(
        "  Exits: TP={}%, SL={}%, max hold={}d",
        config.positions.take_profit_pct * dec!(100),
        config.positions.stop_loss_pct * dec!(100),
        config.positions.max_hold_days
    );
    println!(
        "  Calibration: every {}d, lr={}, bounds=[{}, {}]",
        config.calibration.interval_days,
        config.calibration.learning_rate,
        config.calibration.min_weight,
        config.calibration.max_weight
    );
    println!("  Ledger: {}", config.ledger.path.display());
    println!(
        "  Inbox: {}",
        if config.inbox.enabled {
            config.inbox.spool_dir.display().to_string()
        } else {
            "disabled".to_string()
        }
    );
    println!(
        "  Notify: {}",
        if config.notify.enabled {
            config.notify.to.join(", ")
        } else {
            "log only".to_string()
        }
    );
}
