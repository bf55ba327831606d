//! Run and resolve command implementations

use crate::pipeline::Pipeline;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal_macros::dec;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Compute everything but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub async fn execute(&self, pipeline: &Pipeline) -> anyhow::Result<()> {
        let today = super::run_date(self.date);
        let report = pipeline.run(today, self.dry_run).await?;

        if self.dry_run {
            println!("Dry run: nothing was recorded");
        } else {
            println!(
                "Ledger: {} inserted, {} updated, {} unchanged",
                report.upsert.inserted, report.upsert.updated, report.upsert.unchanged
            );
        }
        println!("{}", report.digest().render_text());
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Resolution date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Report resolutions without recording them
    #[arg(long)]
    pub dry_run: bool,
}

impl ResolveArgs {
    pub async fn execute(&self, pipeline: &Pipeline) -> anyhow::Result<()> {
        let today = super::run_date(self.date);
        let resolved = pipeline.resolve(today, self.dry_run).await?;

        if resolved.is_empty() {
            println!("No positions resolved");
            return Ok(());
        }
        println!("{:<16} {:<6} {:<5} {:>10} {:>10} {:>8}", "TRADE", "DIR", "RESULT", "ENTRY", "EXIT", "RETURN");
        for closed in &resolved {
            println!(
                "{:<16} {:<6} {:<5} {:>10} {:>10} {:>7.2}%",
                closed.position.id.as_str(),
                closed.position.direction,
                crate::positions::TradeStatus::from(closed.resolution.outcome),
                closed.position.entry_price,
                closed.resolution.exit_price,
                closed.resolution.return_pct * dec!(100),
            );
        }
        Ok(())
    }
}
