//! Fixed in-memory price provider

use super::{Candle, PriceProvider, ProviderError};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Serves preloaded candles, for dry runs and tests
///
/// Requests are answered from the preloaded bars inside the requested window.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    candles: HashMap<String, Vec<Candle>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add candles for a symbol, kept sorted oldest first
    pub fn with_candles(mut self, symbol: impl Into<String>, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.date);
        self.candles.insert(symbol.into(), candles);
        self
    }

    /// Add one flat candle per day from closes, ending on `last_date`
    pub fn with_closes(self, symbol: impl Into<String>, last_date: NaiveDate, closes: &[Decimal]) -> Self {
        let n = closes.len() as i64;
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, close)| Candle {
                date: last_date - Duration::days(n - 1 - i as i64),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: 0,
            })
            .collect();
        self.with_candles(symbol, candles)
    }
}

#[async_trait]
impl PriceProvider for StaticProvider {
    async fn daily_candles(
        &self,
        symbol: &str,
        end: NaiveDate,
        lookback_days: u32,
    ) -> Result<Vec<Candle>, ProviderError> {
        let start = end - Duration::days(i64::from(lookback_days));
        let candles: Vec<Candle> = self
            .candles
            .get(symbol)
            .map(|all| {
                all.iter()
                    .filter(|c| c.date >= start && c.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if candles.is_empty() {
            return Err(ProviderError::NoData(symbol.to_string()));
        }
        Ok(candles)
    }
}
