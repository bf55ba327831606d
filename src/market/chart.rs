//! Chart API client for daily candles
//!
//! Speaks the Yahoo-style `v8/finance/chart` endpoint: one request per symbol
//! returning parallel arrays of timestamps and OHLCV quotes.

use super::{Candle, PriceProvider, ProviderError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Chart API base URL
pub const CHART_API_URL: &str = "https://query1.finance.yahoo.com";

/// Configuration for the chart client
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Base URL for the chart API
    pub base_url: String,
    /// Request timeout
    pub timeout: std::time::Duration,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            base_url: CHART_API_URL.to_string(),
            timeout: std::time::Duration::from_secs(10),
        }
    }
}

impl From<&crate::config::ProviderConfig> for ChartConfig {
    fn from(config: &crate::config::ProviderConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Client for the chart API
pub struct ChartClient {
    config: ChartConfig,
    client: Client,
}

impl ChartClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(ChartConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ChartConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("signal-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.config.base_url, symbol)
    }
}

/// Query window for daily bars up to and including `end`
///
/// `period2` is midnight UTC after `end` so the bar for `end` itself is
/// returned.
fn chart_query(end: NaiveDate, lookback_days: u32) -> [(&'static str, String); 3] {
    let midnight = |date: NaiveDate| date.and_time(NaiveTime::MIN).and_utc().timestamp();
    let start = end - Duration::days(i64::from(lookback_days));
    [
        ("period1", midnight(start).to_string()),
        ("period2", midnight(end + Duration::days(1)).to_string()),
        ("interval", "1d".to_string()),
    ]
}

#[async_trait]
impl PriceProvider for ChartClient {
    async fn daily_candles(
        &self,
        symbol: &str,
        end: NaiveDate,
        lookback_days: u32,
    ) -> Result<Vec<Candle>, ProviderError> {
        let url = self.chart_url(symbol);

        tracing::debug!(url = %url, symbol, %end, lookback_days, "Fetching daily candles");

        let response = self
            .client
            .get(&url)
            .query(&chart_query(end, lookback_days))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let chart: ChartResponse = response.json().await?;
        let candles = parse_chart(symbol, chart)?;

        tracing::debug!(symbol, candles = candles.len(), "Fetched daily candles");
        Ok(candles)
    }
}

/// Raw chart response
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Convert a chart response into oldest-first candles
///
/// Bars with any missing OHLC value are skipped. Volume defaults to zero.
pub fn parse_chart(symbol: &str, response: ChartResponse) -> Result<Vec<Candle>, ProviderError> {
    if let Some(err) = response.chart.error {
        return Err(ProviderError::Api {
            code: err.code,
            description: err.description.unwrap_or_default(),
        });
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::NoData(symbol.to_string()))?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |series: &[Option<f64>]| -> Option<Decimal> {
            let value = series.get(i).copied().flatten()?;
            Decimal::try_from(value).ok().map(|d| d.round_dp(4))
        };
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        candles.push(Candle {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    candles.sort_by_key(|c| c.date);
    candles.dedup_by_key(|c| c.date);

    if candles.is_empty() {
        return Err(ProviderError::NoData(symbol.to_string()));
    }
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn parse(json: &str) -> Result<Vec<Candle>, ProviderError> {
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        parse_chart("AAPL", response)
    }

    #[test]
    fn test_parse_chart() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL"},
                    "timestamp": [1704378600, 1704465000],
                    "indicators": {
                        "quote": [{
                            "open": [182.15, 181.99],
                            "high": [183.09, 182.76],
                            "low": [180.88, 180.17],
                            "close": [181.91, 181.18],
                            "volume": [62303300, null]
                        }]
                    }
                }],
                "error": null
            }
        }"#;

        let candles = parse(json).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(candles[0].close, dec!(181.91));
        assert_eq!(candles[0].volume, 62303300);
        assert_eq!(candles[1].volume, 0);
    }

    #[test]
    fn test_parse_chart_skips_incomplete_bars() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704378600, 1704465000],
                    "indicators": {
                        "quote": [{
                            "open": [182.15, null],
                            "high": [183.09, 182.76],
                            "low": [180.88, 180.17],
                            "close": [181.91, 181.18]
                        }]
                    }
                }]
            }
        }"#;

        let candles = parse(json).unwrap();
        assert_eq!(candles.len(), 1);
    }

    #[test]
    fn test_parse_chart_api_error() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;

        match parse(json) {
            Err(ProviderError::Api { code, .. }) => assert_eq!(code, "Not Found"),
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_chart_empty_result() {
        let json = r#"{"chart": {"result": [], "error": null}}"#;
        assert!(matches!(parse(json), Err(ProviderError::NoData(_))));
    }

    #[test]
    fn test_chart_url() {
        let client = ChartClient::with_config(ChartConfig {
            base_url: "http://localhost:9999".to_string(),
            timeout: std::time::Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(
            client.chart_url("MSFT"),
            "http://localhost:9999/v8/finance/chart/MSFT"
        );
    }

    #[test]
    fn test_chart_query_window_ends_after_end_date() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let query = chart_query(end, 10);
        // 2024-03-05T00:00:00Z
        assert_eq!(query[0], ("period1", "1709596800".to_string()));
        // 2024-03-16T00:00:00Z
        assert_eq!(query[1], ("period2", "1710547200".to_string()));
        assert_eq!(query[2], ("interval", "1d".to_string()));
    }

    #[test]
    fn test_chart_query_follows_end_date_not_clock() {
        let recent = chart_query(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 120);
        let older = chart_query(NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(), 120);
        let period2 = |q: &[(&str, String); 3]| q[1].1.parse::<i64>().unwrap();
        assert_eq!(period2(&recent) - period2(&older), 366 * 86_400);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let client = ChartClient::with_config(ChartConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: std::time::Duration::from_secs(2),
        })
        .unwrap();
        let result = client
            .daily_candles("MSFT", NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 30)
            .await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }
}
