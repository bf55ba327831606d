//! Ledger performance summary

use super::LedgerRow;
use crate::positions::TradeStatus;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Aggregate statistics over the ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    /// Total number of trades
    pub total_trades: usize,
    /// Still open
    pub open: usize,
    pub won: usize,
    pub lost: usize,
    /// Won / resolved, zero when nothing resolved
    pub win_rate: Decimal,
    /// Mean directional return of resolved trades
    pub avg_return: Decimal,
    /// Sum of winning returns over the absolute sum of losing returns
    pub profit_factor: Option<Decimal>,
}

impl LedgerSummary {
    /// Summarize ledger rows
    pub fn from_rows(rows: &[LedgerRow]) -> Self {
        let mut summary = LedgerSummary {
            total_trades: rows.len(),
            ..Default::default()
        };

        let mut gross_win = dec!(0);
        let mut gross_loss = dec!(0);
        let mut return_sum = dec!(0);
        for row in rows {
            match row.status {
                TradeStatus::Open => summary.open += 1,
                TradeStatus::Won => summary.won += 1,
                TradeStatus::Lost => summary.lost += 1,
            }
            if let Some(ret) = row.return_pct.filter(|_| row.status != TradeStatus::Open) {
                return_sum += ret;
                if ret > dec!(0) {
                    gross_win += ret;
                } else {
                    gross_loss -= ret;
                }
            }
        }

        let resolved = summary.resolved();
        if resolved > 0 {
            let n = Decimal::from(resolved as u64);
            summary.win_rate = (Decimal::from(summary.won as u64) / n).round_dp(4);
            summary.avg_return = (return_sum / n).round_dp(6);
        }
        if gross_loss > dec!(0) {
            summary.profit_factor = Some((gross_win / gross_loss).round_dp(2));
        }
        summary
    }

    /// Won plus lost
    pub fn resolved(&self) -> usize {
        self.won + self.lost
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let profit_factor = self
            .profit_factor
            .map(|pf| format!("{:.2}", pf))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            r#"
══════════════════════════════════════════════════════
               TRADE LEDGER
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Win Rate:         {:.1}%
Avg Return:       {:+.2}%
Profit Factor:    {}

ACTIVITY
───────────────────────────────────────────────────────
Total Trades:     {}
Open:             {}
Won / Lost:       {} / {}
══════════════════════════════════════════════════════
"#,
            self.win_rate * dec!(100),
            self.avg_return * dec!(100),
            profit_factor,
            self.total_trades,
            self.open,
            self.won,
            self.lost,
        )
    }
}
