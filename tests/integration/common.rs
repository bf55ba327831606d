//! Shared fixtures

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_bot::config::Config;
use signal_bot::ledger::Ledger;
use signal_bot::market::StaticProvider;
use signal_bot::notify::{Digest, Notifier};
use signal_bot::pipeline::Pipeline;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

/// Config rooted in `dir`, scoring on trend indicators only
pub fn config(dir: &Path, symbols: &[&str]) -> Config {
    let symbols: Vec<String> = symbols.iter().map(|s| format!("\"{}\"", s)).collect();
    let toml = format!(
        r#"
[watchlist]
symbols = [{symbols}]

[weights]
rsi = 0
sma_cross = 1
macd = 0
momentum = 1
bollinger = 0

[ledger]
path = '{ledger}'

[state]
dir = '{state}'
"#,
        symbols = symbols.join(", "),
        ledger = dir.join("ledger.json").display(),
        state = dir.join("state").display(),
    );
    let config: Config = toml::from_str(&toml).unwrap();
    config.validate().unwrap();
    config
}

/// 60 closes rising by one per day from 100 to 159
pub fn uptrend() -> Vec<Decimal> {
    (0..60).map(|i| dec!(100) + Decimal::from(i)).collect()
}

/// 60 closes falling by one per day from 200 to 141
pub fn downtrend() -> Vec<Decimal> {
    (0..60).map(|i| dec!(200) - Decimal::from(i)).collect()
}

/// `series` followed by one more close
pub fn then(series: Vec<Decimal>, next: Decimal) -> Vec<Decimal> {
    let mut closes = series;
    closes.push(next);
    closes
}

/// Records every digest it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub subjects: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, digest: &Digest) -> anyhow::Result<()> {
        self.subjects.lock().await.push(digest.subject());
        Ok(())
    }
}

pub fn pipeline(
    config: Config,
    provider: StaticProvider,
    ledger: Arc<dyn Ledger>,
    notifier: Arc<RecordingNotifier>,
) -> Pipeline {
    Pipeline::new(config, Arc::new(provider), ledger, notifier)
}
