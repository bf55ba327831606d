//! Run digest

use crate::calibration::CalibrationReport;
use crate::inbox::Alert;
use crate::ledger::LedgerSummary;
use crate::positions::{ClosedPosition, Outcome, Position};
use crate::signal::Signal;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal_macros::dec;
use std::fmt::Write;
use uuid::Uuid;

/// Everything worth telling a human about one run
#[derive(Debug, Clone)]
pub struct Digest {
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    /// Tickers picked up from notifications
    pub alerts: Vec<Alert>,
    /// Every scored symbol
    pub signals: Vec<Signal>,
    /// Positions opened this run
    pub opened: Vec<Position>,
    /// Positions resolved this run
    pub resolved: Vec<ClosedPosition>,
    pub calibration: Option<CalibrationReport>,
    pub summary: LedgerSummary,
    /// Symbols that could not be processed, with the reason
    pub failures: Vec<(String, String)>,
}

impl Digest {
    /// Nothing traded, resolved or recalibrated
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.resolved.is_empty() && self.calibration.is_none()
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.resolved
            .iter()
            .filter(|c| c.resolution.outcome == outcome)
            .count()
    }

    pub fn subject(&self) -> String {
        format!(
            "signal-bot {}: {} opened, {} won, {} lost",
            self.run_date,
            self.opened.len(),
            self.count(Outcome::Won),
            self.count(Outcome::Lost),
        )
    }

    /// Plain-text body
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Run {} for {}", self.run_id, self.run_date);
        let _ = writeln!(out);

        if !self.opened.is_empty() {
            let _ = writeln!(out, "OPENED");
            for p in &self.opened {
                let _ = writeln!(
                    out,
                    "  {:<8} {:<5} @ {:>10}  score {:+.3}",
                    p.symbol, p.direction, p.entry_price, p.score
                );
            }
            let _ = writeln!(out);
        }

        if !self.resolved.is_empty() {
            let _ = writeln!(out, "RESOLVED");
            for c in &self.resolved {
                let outcome = match c.resolution.outcome {
                    Outcome::Won => "WON",
                    Outcome::Lost => "LOST",
                };
                let _ = writeln!(
                    out,
                    "  {:<8} {:<5} {:<4} {:>10} -> {:<10} {:+.2}%",
                    c.position.symbol,
                    c.position.direction,
                    outcome,
                    c.position.entry_price,
                    c.resolution.exit_price,
                    c.resolution.return_pct * dec!(100),
                );
            }
            let _ = writeln!(out);
        }

        if !self.signals.is_empty() {
            let _ = writeln!(out, "SIGNALS");
            for s in &self.signals {
                let _ = writeln!(
                    out,
                    "  {:<8} {:+.3}  {}",
                    s.symbol, s.score, s.decision
                );
            }
            let _ = writeln!(out);
        }

        if !self.alerts.is_empty() {
            let _ = writeln!(out, "ALERTS");
            for alert in &self.alerts {
                let hint = alert.hint.map_or_else(|| "-".to_string(), |d| d.to_string());
                let scored = self
                    .signals
                    .iter()
                    .find(|s| s.symbol == alert.symbol)
                    .map_or_else(|| "not scored".to_string(), |s| s.decision.to_string());
                let _ = writeln!(out, "  {:<8} hint {:<5}  scored {}", alert.symbol, hint, scored);
            }
            let _ = writeln!(out);
        }

        if let Some(report) = &self.calibration {
            let _ = writeln!(out, "CALIBRATION ({} samples)", report.samples_used);
            for (kind, after) in report.after.iter() {
                let _ = writeln!(
                    out,
                    "  {:<10} {:.3} -> {:.3}",
                    kind.as_str(),
                    report.before.normalized().get(kind),
                    after
                );
            }
            let _ = writeln!(out);
        }

        if !self.failures.is_empty() {
            let _ = writeln!(out, "FAILURES");
            for (symbol, reason) in &self.failures {
                let _ = writeln!(out, "  {:<8} {}", symbol, reason);
            }
            let _ = writeln!(out);
        }

        out.push_str(&self.summary.format_table());
        out
    }
}
