//! Scan command implementation

use crate::pipeline::Pipeline;
use chrono::NaiveDate;
use clap::Args;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Symbols to score, defaults to the watchlist
    pub symbols: Vec<String>,

    /// Score as of this date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl ScanArgs {
    pub async fn execute(&self, pipeline: &Pipeline) -> anyhow::Result<()> {
        let symbols = if self.symbols.is_empty() {
            pipeline.config().watchlist.symbols.clone()
        } else {
            self.symbols.clone()
        };
        let result = pipeline.scan(&symbols, super::run_date(self.date)).await?;

        println!("{:<8} {:>10} {:>8}  {}", "SYMBOL", "PRICE", "SCORE", "DECISION");
        for signal in &result.signals {
            println!(
                "{:<8} {:>10} {:>+8.3}  {}",
                signal.symbol, signal.price, signal.score, signal.decision
            );
        }
        for (symbol, reason) in &result.failures {
            println!("{:<8} error: {}", symbol, reason);
        }
        Ok(())
    }
}
