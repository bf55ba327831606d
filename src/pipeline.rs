//! Daily batch pipeline
//!
//! One run ingests notification alerts, scores the watchlist, opens paper
//! positions on actionable signals, resolves open positions against the
//! latest closes, recalibrates indicator weights when due and records every
//! touched trade in the ledger. Reruns for the same day are idempotent.

use crate::calibration::{CalibrationReport, CalibrationSample, Calibrator, WeightState, WeightStore};
use crate::config::Config;
use crate::inbox::{parse_alerts, Alert, MailSource, SpoolDirSource};
use crate::ledger::{upsert_rows, JsonFileLedger, Ledger, LedgerRow, LedgerSummary, UpsertSummary};
use crate::market::{ChartClient, ChartConfig, PriceProvider};
use crate::notify::{Digest, LogNotifier, Notifier, OutboxNotifier};
use crate::positions::{ClosedPosition, OutcomeResolver, Position, PositionBook, TradeId};
use crate::signal::{Signal, SignalScorer, Weights};
use crate::telemetry::{self, CounterMetric, GaugeMetric, LatencyMetric};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Everything a run did
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub date: NaiveDate,
    /// Tickers picked up from notifications
    pub alerts: Vec<Alert>,
    /// Every scored symbol
    pub signals: Vec<Signal>,
    /// Positions opened this run
    pub opened: Vec<Position>,
    /// Positions resolved this run
    pub resolved: Vec<ClosedPosition>,
    /// Present when weights were recalibrated
    pub calibration: Option<CalibrationReport>,
    /// Ledger write result, zero on a dry run
    pub upsert: UpsertSummary,
    /// Ledger statistics after the run
    pub summary: LedgerSummary,
    /// Symbols that could not be processed, with the reason
    pub failures: Vec<(String, String)>,
}

impl RunReport {
    /// Digest for notification
    pub fn digest(&self) -> Digest {
        Digest {
            run_id: self.run_id,
            run_date: self.date,
            generated_at: Utc::now(),
            alerts: self.alerts.clone(),
            signals: self.signals.clone(),
            opened: self.opened.clone(),
            resolved: self.resolved.clone(),
            calibration: self.calibration.clone(),
            summary: self.summary.clone(),
            failures: self.failures.clone(),
        }
    }
}

/// Result of scoring a symbol list
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub signals: Vec<Signal>,
    /// Last close per scored symbol
    pub prices: HashMap<String, Decimal>,
    pub failures: Vec<(String, String)>,
}

/// Wires providers and stores together for one batch run
pub struct Pipeline {
    config: Config,
    provider: Arc<dyn PriceProvider>,
    ledger: Arc<dyn Ledger>,
    inbox: Option<Arc<dyn MailSource>>,
    notifier: Arc<dyn Notifier>,
    weights: WeightStore,
}

impl Pipeline {
    pub fn new(
        config: Config,
        provider: Arc<dyn PriceProvider>,
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let weights = WeightStore::new(&config.state.dir);
        Self {
            config,
            provider,
            ledger,
            inbox: None,
            notifier,
            weights,
        }
    }

    /// Build the production pipeline described by `config`
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let provider = ChartClient::with_config(ChartConfig::from(&config.provider))?;
        let ledger = JsonFileLedger::new(&config.ledger.path);
        let notifier: Arc<dyn Notifier> = if config.notify.enabled {
            Arc::new(OutboxNotifier::from_config(&config.notify))
        } else {
            Arc::new(LogNotifier)
        };
        let inbox = config
            .inbox
            .enabled
            .then(|| SpoolDirSource::new(&config.inbox.spool_dir));

        let mut pipeline = Self::new(config, Arc::new(provider), Arc::new(ledger), notifier);
        if let Some(inbox) = inbox {
            pipeline = pipeline.with_inbox(Arc::new(inbox));
        }
        Ok(pipeline)
    }

    /// Read tickers from a notification source on every run
    pub fn with_inbox(mut self, inbox: Arc<dyn MailSource>) -> Self {
        self.inbox = Some(inbox);
        self
    }

    /// Override where calibrated weights are kept
    pub fn with_weight_store(mut self, store: WeightStore) -> Self {
        self.weights = store;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    /// Current weights and their calibration time
    pub async fn weight_state(&self) -> anyhow::Result<WeightState> {
        let initial = Weights::new(self.config.weights.0.clone());
        Ok(self.weights.load_or(initial).await?)
    }

    /// Execute a full run for `today`
    ///
    /// A dry run computes everything but writes nothing: no ledger upsert, no
    /// weight file, no notification and no messages marked processed.
    pub async fn run(&self, today: NaiveDate, dry_run: bool) -> anyhow::Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id, %today, dry_run);
        let started = Instant::now();

        let report = self.run_inner(run_id, today, dry_run).instrument(span).await?;

        telemetry::record_latency(LatencyMetric::Run, started.elapsed());
        Ok(report)
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        today: NaiveDate,
        dry_run: bool,
    ) -> anyhow::Result<RunReport> {
        // 1. Intake; messages are marked processed once the run is recorded
        let (alerts, message_ids) = self.intake().await?;
        let mut symbols = self.watchlist();
        for alert in &alerts {
            if !symbols.contains(&alert.symbol) {
                symbols.push(alert.symbol.clone());
            }
        }

        // 2. Fetch and score
        let state = self.weight_state().await?;
        let scan = self.scan_with(&symbols, today, &state.weights).await;
        for alert in &alerts {
            if let Some(signal) = scan.signals.iter().find(|s| s.symbol == alert.symbol) {
                tracing::info!(
                    symbol = %alert.symbol,
                    hint = ?alert.hint,
                    decision = %signal.decision,
                    agrees = alert.agrees_with(signal.decision.direction()),
                    "Alert scored"
                );
            }
        }

        // 3. Open
        let rows = self.ledger.rows().await?;
        let known: HashSet<TradeId> = rows.iter().map(|r| r.trade_id.clone()).collect();
        let mut book = PositionBook::with_open(rows.iter().filter_map(LedgerRow::to_position));

        let mut opened = Vec::new();
        for signal in &scan.signals {
            let Some(position) = Position::from_signal(signal) else {
                continue;
            };
            if known.contains(&position.id) {
                tracing::debug!(trade_id = %position.id, "Trade already recorded");
                continue;
            }
            if book.open(position.clone()) {
                tracing::info!(
                    trade_id = %position.id,
                    direction = %position.direction,
                    entry_price = %position.entry_price,
                    score = %position.score,
                    "Position opened"
                );
                opened.push(position);
            } else {
                tracing::debug!(symbol = %position.symbol, "Symbol already has an open position");
            }
        }

        // 4. Resolve
        let prices = self.latest_prices(&book, scan.prices.clone(), today).await;
        let resolver = OutcomeResolver::new(&self.config.positions);
        let resolved = book.resolve_all(&resolver, &prices, today);

        // 5. Ledger rows for this run, applied to a local copy first so
        //    calibration sees this run's outcomes
        let batch: Vec<LedgerRow> = opened
            .iter()
            .map(LedgerRow::open)
            .chain(resolved.iter().map(LedgerRow::closed))
            .collect();
        let mut table = rows;
        upsert_rows(&mut table, batch.clone());

        // 6. Calibrate if due
        let calibration = self
            .calibrate_if_due(state, &table, at_midnight(today), false, dry_run)
            .await?;

        // 7. Record
        let upsert = if dry_run {
            UpsertSummary::default()
        } else {
            let summary = self.ledger.upsert(batch).await?;
            telemetry::increment(
                CounterMetric::LedgerRowsWritten,
                (summary.inserted + summary.updated) as u64,
            );
            summary
        };
        if !dry_run {
            self.mark_processed(&message_ids).await;
        }

        let summary = LedgerSummary::from_rows(&table);
        telemetry::set_gauge(GaugeMetric::OpenPositions, Decimal::from(book.open_count() as u64));
        telemetry::set_gauge(GaugeMetric::WinRate, summary.win_rate);
        telemetry::set_gauge(GaugeMetric::AvgReturn, summary.avg_return);
        telemetry::increment(CounterMetric::PositionsOpened, opened.len() as u64);
        for closed in &resolved {
            telemetry::record_outcome(closed.resolution.outcome);
        }

        let report = RunReport {
            run_id,
            date: today,
            alerts,
            signals: scan.signals,
            opened,
            resolved,
            calibration,
            upsert,
            summary,
            failures: scan.failures,
        };

        // 8. Notify
        let digest = report.digest();
        if dry_run {
            tracing::debug!("Dry run, digest not sent");
        } else if digest.is_empty() {
            tracing::info!("Nothing opened, resolved or calibrated, digest not sent");
        } else if let Err(e) = self.notifier.send(&digest).await {
            tracing::warn!(error = %e, "Failed to send digest");
        }

        tracing::info!(
            signals = report.signals.len(),
            opened = report.opened.len(),
            resolved = report.resolved.len(),
            calibrated = report.calibration.is_some(),
            failures = report.failures.len(),
            "Run complete"
        );
        Ok(report)
    }

    /// Score `symbols` without touching any state
    pub async fn scan(&self, symbols: &[String], today: NaiveDate) -> anyhow::Result<ScanResult> {
        let state = self.weight_state().await?;
        let symbols: Vec<String> = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
        Ok(self.scan_with(&symbols, today, &state.weights).await)
    }

    /// Resolve open positions only, without scoring or opening anything
    pub async fn resolve(&self, today: NaiveDate, dry_run: bool) -> anyhow::Result<Vec<ClosedPosition>> {
        let rows = self.ledger.rows().await?;
        let mut book = PositionBook::with_open(rows.iter().filter_map(LedgerRow::to_position));
        let prices = self.latest_prices(&book, HashMap::new(), today).await;
        let resolver = OutcomeResolver::new(&self.config.positions);
        let resolved = book.resolve_all(&resolver, &prices, today);

        if !dry_run && !resolved.is_empty() {
            let summary = self
                .ledger
                .upsert(resolved.iter().map(LedgerRow::closed).collect())
                .await?;
            telemetry::increment(CounterMetric::LedgerRowsWritten, summary.updated as u64);
        }
        for closed in &resolved {
            telemetry::record_outcome(closed.resolution.outcome);
        }
        Ok(resolved)
    }

    /// Recalibrate from the ledger, when due on `today` or when forced
    ///
    /// Uses the same clock as [`Pipeline::run`]: midnight UTC of `today`.
    pub async fn calibrate(
        &self,
        today: NaiveDate,
        force: bool,
        dry_run: bool,
    ) -> anyhow::Result<Option<CalibrationReport>> {
        let state = self.weight_state().await?;
        let rows = self.ledger.rows().await?;
        self.calibrate_if_due(state, &rows, at_midnight(today), force, dry_run)
            .await
    }

    fn watchlist(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for symbol in &self.config.watchlist.symbols {
            let symbol = symbol.trim().to_uppercase();
            if !symbol.is_empty() && !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        symbols
    }

    /// Alerts from unread notifications, with the ids of the messages read
    async fn intake(&self) -> anyhow::Result<(Vec<Alert>, Vec<String>)> {
        let Some(inbox) = &self.inbox else {
            return Ok((Vec::new(), Vec::new()));
        };

        let messages = inbox.fetch_unread().await?;
        let mut alerts: Vec<Alert> = Vec::new();
        for message in &messages {
            let found = parse_alerts(message);
            tracing::info!(message_id = %message.id, alerts = found.len(), "Notification read");
            for alert in found {
                if !alerts.iter().any(|a| a.symbol == alert.symbol) {
                    alerts.push(alert);
                }
            }
        }

        telemetry::increment(CounterMetric::AlertsIngested, alerts.len() as u64);
        let ids = messages.into_iter().map(|m| m.id).collect();
        Ok((alerts, ids))
    }

    async fn mark_processed(&self, ids: &[String]) {
        let Some(inbox) = &self.inbox else {
            return;
        };
        for id in ids {
            if let Err(e) = inbox.mark_processed(id).await {
                tracing::warn!(message_id = %id, error = %e, "Failed to mark message processed");
            }
        }
    }

    async fn scan_with(&self, symbols: &[String], today: NaiveDate, weights: &Weights) -> ScanResult {
        let scorer = SignalScorer::new(
            self.config.indicators.clone(),
            self.config.signal.clone(),
            weights.clone(),
        );
        let mut result = ScanResult::default();

        for symbol in symbols {
            let started = Instant::now();
            let fetched = self
                .provider
                .daily_candles(symbol, today, self.config.provider.lookback_days)
                .await;
            telemetry::record_latency(LatencyMetric::Fetch, started.elapsed());

            let candles = match fetched {
                Ok(candles) => candles,
                Err(e) => {
                    tracing::warn!(%symbol, error = %e, "Failed to fetch candles");
                    telemetry::increment(CounterMetric::FetchFailures, 1);
                    result.failures.push((symbol.clone(), e.to_string()));
                    continue;
                }
            };

            // Bars after the run date are ignored so back-dated runs see the
            // market as it was
            let candles: Vec<_> = candles.into_iter().filter(|c| c.date <= today).collect();
            let Some(last) = candles.last() else {
                result
                    .failures
                    .push((symbol.clone(), format!("No price data for {} up to {}", symbol, today)));
                continue;
            };
            let date = last.date;
            let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();

            if let Some(signal) = scorer.evaluate(symbol, date, &closes) {
                result.prices.insert(symbol.clone(), signal.price);
                result.signals.push(signal);
                telemetry::increment(CounterMetric::SignalsScored, 1);
            }
        }

        result
    }

    /// Latest close for every open symbol, reusing prices already fetched
    async fn latest_prices(
        &self,
        book: &PositionBook,
        mut prices: HashMap<String, Decimal>,
        today: NaiveDate,
    ) -> HashMap<String, Decimal> {
        let mut missing: Vec<String> = book
            .open_positions
            .values()
            .map(|p| p.symbol.clone())
            .filter(|s| !prices.contains_key(s))
            .collect();
        missing.sort();
        missing.dedup();

        for symbol in missing {
            match self
                .provider
                .daily_candles(&symbol, today, self.config.provider.lookback_days)
                .await
            {
                Ok(candles) => {
                    if let Some(last) = candles.iter().filter(|c| c.date <= today).last() {
                        prices.insert(symbol, last.close);
                    }
                }
                Err(e) => {
                    tracing::warn!(%symbol, error = %e, "Failed to fetch latest price");
                    telemetry::increment(CounterMetric::FetchFailures, 1);
                }
            }
        }
        prices
    }

    async fn calibrate_if_due(
        &self,
        state: WeightState,
        rows: &[LedgerRow],
        now: DateTime<Utc>,
        force: bool,
        dry_run: bool,
    ) -> anyhow::Result<Option<CalibrationReport>> {
        if !force && !state.is_due(now, self.config.calibration.interval_days) {
            tracing::debug!(calibrated_at = ?state.calibrated_at, "Calibration not due");
            return Ok(None);
        }

        let samples = resolved_samples(rows);
        if samples.is_empty() {
            tracing::info!("No resolved trades yet, skipping calibration");
            return Ok(None);
        }

        let calibrator = Calibrator::new(self.config.calibration.clone());
        let report = calibrator.calibrate(&state.weights, &samples)?;
        tracing::info!(
            samples = report.samples_used,
            changed = report.changed(),
            "Weights calibrated"
        );
        for (kind, weight) in report.after.iter() {
            telemetry::set_indicator_weight(kind, weight);
        }
        telemetry::increment(CounterMetric::Calibrations, 1);

        if !dry_run {
            self.weights
                .save(&WeightState {
                    weights: report.after.clone(),
                    calibrated_at: Some(now),
                })
                .await?;
        }
        Ok(Some(report))
    }
}

/// Calibration samples from resolved rows, oldest resolution first
fn resolved_samples(rows: &[LedgerRow]) -> Vec<CalibrationSample> {
    let mut resolved: Vec<&LedgerRow> = rows.iter().filter(|r| r.closed_on.is_some()).collect();
    resolved.sort_by_key(|r| (r.closed_on, r.opened_on));
    resolved.into_iter().filter_map(LedgerRow::to_sample).collect()
}

fn at_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}
