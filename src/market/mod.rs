//! Market data module
//!
//! Daily candles from a market-data provider

mod chart;
mod fixed;

pub use chart::{parse_chart, ChartClient, ChartConfig, ChartResponse, CHART_API_URL};
pub use fixed::StaticProvider;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Days requested when only the latest close is needed
const LATEST_LOOKBACK_DAYS: u32 = 10;

/// One daily bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Market data errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure or undecodable body
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success status
    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Error object in an otherwise successful response
    #[error("Provider error {code}: {description}")]
    Api { code: String, description: String },
    /// No usable bars
    #[error("No price data for {0}")]
    NoData(String),
}

/// Trait for market data providers
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily candles for the `lookback_days` calendar days ending on `end`,
    /// oldest first
    async fn daily_candles(
        &self,
        symbol: &str,
        end: NaiveDate,
        lookback_days: u32,
    ) -> Result<Vec<Candle>, ProviderError>;

    /// Most recent close on or before `end`
    async fn latest_close(&self, symbol: &str, end: NaiveDate) -> Result<Decimal, ProviderError> {
        let candles = self.daily_candles(symbol, end, LATEST_LOOKBACK_DAYS).await?;
        candles
            .last()
            .map(|c| c.close)
            .ok_or_else(|| ProviderError::NoData(symbol.to_string()))
    }
}
