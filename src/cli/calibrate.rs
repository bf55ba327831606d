//! Calibrate command implementation

use crate::pipeline::Pipeline;
use chrono::NaiveDate;
use clap::Args;

#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Calibration date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Calibrate even if the interval has not elapsed
    #[arg(long)]
    pub force: bool,

    /// Show the new weights without saving them
    #[arg(long)]
    pub dry_run: bool,
}

impl CalibrateArgs {
    pub async fn execute(&self, pipeline: &Pipeline) -> anyhow::Result<()> {
        let today = super::run_date(self.date);
        let Some(report) = pipeline.calibrate(today, self.force, self.dry_run).await? else {
            println!("Calibration skipped (not due or no resolved trades)");
            return Ok(());
        };

        println!("Calibrated from {} resolved trades", report.samples_used);
        println!("{:<10} {:>6} {:>6} {:>8} {:>8}", "INDICATOR", "VOTES", "HITS", "BEFORE", "AFTER");
        let before = report.before.normalized();
        for (kind, after) in report.after.iter() {
            let stats = report.stats.get(&kind).copied().unwrap_or_default();
            println!(
                "{:<10} {:>6} {:>6} {:>8.4} {:>8.4}",
                kind,
                stats.votes,
                stats.hits,
                before.get(kind),
                after
            );
        }
        if self.dry_run {
            println!("Dry run: weights not saved");
        }
        Ok(())
    }
}
