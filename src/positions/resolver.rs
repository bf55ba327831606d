//! Outcome resolution for open positions

use super::{Outcome, Position, Resolution};
use crate::config::PositionConfig;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Marks open positions won or lost against the latest price
///
/// Take-profit and stop-loss are checked first. A position held for
/// `max_hold_days` or longer is then settled by the sign of its return,
/// with a flat return counted as a loss.
#[derive(Debug, Clone)]
pub struct OutcomeResolver {
    take_profit: Decimal,
    stop_loss: Decimal,
    max_hold_days: i64,
}

impl OutcomeResolver {
    pub fn new(config: &PositionConfig) -> Self {
        Self {
            take_profit: config.take_profit_pct,
            stop_loss: config.stop_loss_pct,
            max_hold_days: config.max_hold_days,
        }
    }

    /// Resolve a position, or `None` if it stays open
    ///
    /// A position opened after `today` always stays open.
    pub fn resolve(
        &self,
        position: &Position,
        latest_price: Decimal,
        today: NaiveDate,
    ) -> Option<Resolution> {
        if today < position.opened_on {
            return None;
        }
        let ret = position.directional_return(latest_price);
        let held_days = (today - position.opened_on).num_days();

        let outcome = if ret >= self.take_profit {
            Outcome::Won
        } else if ret <= -self.stop_loss {
            Outcome::Lost
        } else if held_days >= self.max_hold_days {
            if ret > dec!(0) {
                Outcome::Won
            } else {
                Outcome::Lost
            }
        } else {
            return None;
        };

        Some(Resolution {
            outcome,
            exit_price: latest_price,
            closed_on: today,
            return_pct: ret.round_dp(6),
        })
    }
}

impl Default for OutcomeResolver {
    fn default() -> Self {
        Self::new(&PositionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Readings;
    use crate::positions::TradeId;
    use crate::signal::Direction;
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap() + Duration::days(n)
    }

    fn position(direction: Direction) -> Position {
        Position {
            id: TradeId::new("SPY", day(0)),
            symbol: "SPY".to_string(),
            direction,
            entry_price: dec!(100),
            opened_on: day(0),
            score: dec!(0.5),
            readings: Readings::new(),
        }
    }

    #[test]
    fn test_long_take_profit() {
        let resolver = OutcomeResolver::default();
        let res = resolver.resolve(&position(Direction::Long), dec!(105), day(2)).unwrap();
        assert_eq!(res.outcome, Outcome::Won);
        assert_eq!(res.exit_price, dec!(105));
        assert_eq!(res.closed_on, day(2));
        assert_eq!(res.return_pct, dec!(0.05));
    }

    #[test]
    fn test_long_stop_loss() {
        let resolver = OutcomeResolver::default();
        let res = resolver.resolve(&position(Direction::Long), dec!(97), day(1)).unwrap();
        assert_eq!(res.outcome, Outcome::Lost);
        assert_eq!(res.return_pct, dec!(-0.03));
    }

    #[test]
    fn test_short_wins_when_price_falls() {
        let resolver = OutcomeResolver::default();
        let res = resolver.resolve(&position(Direction::Short), dec!(94), day(1)).unwrap();
        assert_eq!(res.outcome, Outcome::Won);
        assert_eq!(res.return_pct, dec!(0.06));
    }

    #[test]
    fn test_short_stopped_when_price_rises() {
        let resolver = OutcomeResolver::default();
        let res = resolver.resolve(&position(Direction::Short), dec!(104), day(1)).unwrap();
        assert_eq!(res.outcome, Outcome::Lost);
    }

    #[test]
    fn test_inside_band_stays_open() {
        let resolver = OutcomeResolver::default();
        assert!(resolver.resolve(&position(Direction::Long), dec!(102), day(3)).is_none());
    }

    #[test]
    fn test_expiry_settles_by_sign() {
        let resolver = OutcomeResolver::default();
        let won = resolver.resolve(&position(Direction::Long), dec!(101), day(10)).unwrap();
        assert_eq!(won.outcome, Outcome::Won);
        let lost = resolver.resolve(&position(Direction::Long), dec!(99), day(10)).unwrap();
        assert_eq!(lost.outcome, Outcome::Lost);
    }

    #[test]
    fn test_flat_at_expiry_is_lost() {
        let resolver = OutcomeResolver::default();
        let res = resolver.resolve(&position(Direction::Long), dec!(100), day(12)).unwrap();
        assert_eq!(res.outcome, Outcome::Lost);
        assert_eq!(res.return_pct, dec!(0));
    }

    #[test]
    fn test_opened_after_today_stays_open() {
        let resolver = OutcomeResolver::default();
        let mut position = position(Direction::Long);
        position.opened_on = day(5);
        // Far past stop-loss and expiry, but the trade did not exist yet
        assert!(resolver.resolve(&position, dec!(50), day(4)).is_none());
        assert!(resolver.resolve(&position, dec!(50), day(5)).is_some());
    }

    #[test]
    fn test_one_day_before_expiry_stays_open() {
        let resolver = OutcomeResolver::default();
        assert!(resolver.resolve(&position(Direction::Long), dec!(101), day(9)).is_none());
    }
}
