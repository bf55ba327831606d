//! End-to-end pipeline runs against fixed prices

use crate::common::{config, day, downtrend, pipeline, then, uptrend, RecordingNotifier};
use rust_decimal_macros::dec;
use signal_bot::calibration::WeightStore;
use signal_bot::indicators::{IndicatorKind, Readings};
use signal_bot::inbox::SpoolDirSource;
use signal_bot::ledger::{JsonFileLedger, Ledger, LedgerRow, MemoryLedger};
use signal_bot::market::StaticProvider;
use signal_bot::positions::{Outcome, TradeId, TradeStatus};
use signal_bot::signal::{Decision, Direction};
use std::sync::Arc;

#[tokio::test]
async fn test_run_opens_long_position() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(MemoryLedger::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let provider = StaticProvider::new().with_closes("AAPL", day(15), &uptrend());
    let pipeline = pipeline(config(dir.path(), &["aapl"]), provider, ledger.clone(), notifier.clone());

    let report = pipeline.run(day(15), false).await.unwrap();

    assert_eq!(report.signals.len(), 1);
    assert_eq!(report.signals[0].decision, Decision::Enter(Direction::Long));
    assert_eq!(report.opened.len(), 1);
    assert_eq!(report.opened[0].id, TradeId::new("AAPL", day(15)));
    assert_eq!(report.opened[0].entry_price, dec!(159));
    assert_eq!(report.upsert.inserted, 1);

    let rows = ledger.rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, TradeStatus::Open);
    assert_eq!(
        notifier.subjects.lock().await.as_slice(),
        ["signal-bot 2024-03-15: 1 opened, 0 won, 0 lost"]
    );
}

#[tokio::test]
async fn test_rerun_same_day_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.json");
    let provider = StaticProvider::new()
        .with_closes("AAPL", day(15), &uptrend())
        .with_closes("TSLA", day(15), &downtrend());

    let first = pipeline(
        config(dir.path(), &["AAPL", "TSLA"]),
        provider.clone(),
        Arc::new(JsonFileLedger::new(&ledger_path)),
        Arc::new(RecordingNotifier::default()),
    )
    .run(day(15), false)
    .await
    .unwrap();
    assert_eq!(first.upsert.inserted, 2);
    let after_first = std::fs::read_to_string(&ledger_path).unwrap();

    let second = pipeline(
        config(dir.path(), &["AAPL", "TSLA"]),
        provider,
        Arc::new(JsonFileLedger::new(&ledger_path)),
        Arc::new(RecordingNotifier::default()),
    )
    .run(day(15), false)
    .await
    .unwrap();

    assert!(second.opened.is_empty());
    assert_eq!(second.upsert.inserted, 0);
    assert_eq!(second.upsert.updated, 0);
    assert_eq!(std::fs::read_to_string(&ledger_path).unwrap(), after_first);
}

#[tokio::test]
async fn test_next_day_take_profit_resolves_won() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(MemoryLedger::new());
    let provider = StaticProvider::new().with_closes("AAPL", day(16), &then(uptrend(), dec!(169)));
    let pipeline = pipeline(
        config(dir.path(), &["AAPL"]),
        provider,
        ledger.clone(),
        Arc::new(RecordingNotifier::default()),
    );

    let first = pipeline.run(day(15), false).await.unwrap();
    assert_eq!(first.opened.len(), 1);
    // Nothing resolved yet, so nothing to calibrate from
    assert!(first.calibration.is_none());

    let second = pipeline.run(day(16), false).await.unwrap();
    // Still holding AAPL when the new signal arrives
    assert!(second.opened.is_empty());
    assert_eq!(second.resolved.len(), 1);
    let closed = &second.resolved[0];
    assert_eq!(closed.resolution.outcome, Outcome::Won);
    assert_eq!(closed.resolution.exit_price, dec!(169));
    assert_eq!(closed.resolution.closed_on, day(16));

    let calibration = second.calibration.as_ref().unwrap();
    assert_eq!(calibration.samples_used, 1);
    let state = pipeline.weight_state().await.unwrap();
    assert!(state.calibrated_at.is_some());
    assert_eq!(state.weights, calibration.after);

    let rows = ledger.rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, TradeStatus::Won);
    assert_eq!(rows[0].exit_price, Some(dec!(169)));
    assert_eq!(second.summary.won, 1);
    assert_eq!(second.summary.open, 0);
}

#[tokio::test]
async fn test_short_position_wins_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(MemoryLedger::new());
    let provider = StaticProvider::new().with_closes("TSLA", day(16), &then(downtrend(), dec!(130)));
    let pipeline = pipeline(
        config(dir.path(), &["TSLA"]),
        provider,
        ledger.clone(),
        Arc::new(RecordingNotifier::default()),
    );

    let first = pipeline.run(day(15), false).await.unwrap();
    assert_eq!(first.opened[0].direction, Direction::Short);
    assert_eq!(first.opened[0].entry_price, dec!(141));

    let second = pipeline.run(day(16), false).await.unwrap();
    assert_eq!(second.resolved.len(), 1);
    assert_eq!(second.resolved[0].resolution.outcome, Outcome::Won);
    assert!(second.resolved[0].resolution.return_pct > dec!(0));
}

#[tokio::test]
async fn test_fetch_failure_does_not_abort_run() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new().with_closes("AAPL", day(15), &uptrend());
    let pipeline = pipeline(
        config(dir.path(), &["ZZZZ", "AAPL"]),
        provider,
        Arc::new(MemoryLedger::new()),
        Arc::new(RecordingNotifier::default()),
    );

    let report = pipeline.run(day(15), false).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "ZZZZ");
    assert_eq!(report.opened.len(), 1);
    assert_eq!(report.opened[0].symbol, "AAPL");
}

#[tokio::test]
async fn test_short_history_holds() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new().with_closes("IPO", day(15), &[dec!(20), dec!(21), dec!(22)]);
    let pipeline = pipeline(
        config(dir.path(), &["IPO"]),
        provider,
        Arc::new(MemoryLedger::new()),
        Arc::new(RecordingNotifier::default()),
    );

    let report = pipeline.run(day(15), false).await.unwrap();
    assert_eq!(report.signals.len(), 1);
    assert!(report.signals[0].decision.direction().is_none());
    assert!(report.opened.is_empty());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.json");
    let notifier = Arc::new(RecordingNotifier::default());
    let provider = StaticProvider::new().with_closes("AAPL", day(15), &uptrend());
    let pipeline = pipeline(
        config(dir.path(), &["AAPL"]),
        provider,
        Arc::new(JsonFileLedger::new(&ledger_path)),
        notifier.clone(),
    );

    let report = pipeline.run(day(15), true).await.unwrap();

    assert_eq!(report.opened.len(), 1);
    assert_eq!(report.upsert.inserted, 0);
    assert!(!ledger_path.exists());
    assert!(notifier.subjects.lock().await.is_empty());
}

#[tokio::test]
async fn test_backdated_run_ignores_later_bars() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StaticProvider::new().with_closes("AAPL", day(16), &then(uptrend(), dec!(169)));
    let pipeline = pipeline(
        config(dir.path(), &["AAPL"]),
        provider,
        Arc::new(MemoryLedger::new()),
        Arc::new(RecordingNotifier::default()),
    );

    let scan = pipeline.scan(&["aapl".to_string()], day(15)).await.unwrap();
    assert_eq!(scan.signals[0].date, day(15));
    assert_eq!(scan.signals[0].price, dec!(159));
}

#[tokio::test]
async fn test_backdated_run_leaves_later_trades_open() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(MemoryLedger::new());
    let provider = StaticProvider::new().with_closes("AAPL", day(15), &uptrend());
    let pipeline = pipeline(
        config(dir.path(), &["AAPL"]),
        provider,
        ledger.clone(),
        Arc::new(RecordingNotifier::default()),
    );

    let current = pipeline.run(day(15), false).await.unwrap();
    assert_eq!(current.opened[0].entry_price, dec!(159));

    // Close on the 5th is 149, past the stop-loss for a trade opened at 159
    let replay = pipeline.run(day(5), false).await.unwrap();
    assert!(replay.resolved.is_empty());
    // AAPL still holds the later position
    assert!(replay.opened.is_empty());

    let rows = ledger.rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].trade_id, TradeId::new("AAPL", day(15)));
    assert_eq!(rows[0].status, TradeStatus::Open);
    assert_eq!(rows[0].closed_on, None);
}

#[tokio::test]
async fn test_inbox_alert_joins_watchlist() {
    let dir = tempfile::tempdir().unwrap();
    let spool = dir.path().join("spool");
    std::fs::create_dir_all(&spool).unwrap();
    std::fs::write(
        spool.join("001.eml"),
        "From: alerts@broker.example\nSubject: Breakout watch: $NVDA\n\nNVDA cleared resistance.\n",
    )
    .unwrap();

    let provider = StaticProvider::new()
        .with_closes("AAPL", day(15), &uptrend())
        .with_closes("NVDA", day(15), &uptrend());
    let pipeline = pipeline(
        config(dir.path(), &["AAPL"]),
        provider,
        Arc::new(MemoryLedger::new()),
        Arc::new(RecordingNotifier::default()),
    )
    .with_inbox(Arc::new(SpoolDirSource::new(&spool)));

    let report = pipeline.run(day(15), false).await.unwrap();

    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].symbol, "NVDA");
    assert_eq!(report.alerts[0].hint, Some(Direction::Long));
    let symbols: Vec<&str> = report.signals.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "NVDA"]);
    assert!(spool.join("processed").join("001.eml").exists());
    assert!(!spool.join("001.eml").exists());
}

#[tokio::test]
async fn test_failed_run_leaves_notifications_unread() {
    let dir = tempfile::tempdir().unwrap();
    let spool = dir.path().join("spool");
    std::fs::create_dir_all(&spool).unwrap();
    std::fs::write(spool.join("001.eml"), "Subject: Upgrade $NVDA\n\nAnalyst upgrade.\n").unwrap();
    let state = dir.path().join("state");
    std::fs::create_dir_all(&state).unwrap();
    std::fs::write(state.join("weights.json"), "{ not json").unwrap();

    let provider = StaticProvider::new().with_closes("NVDA", day(15), &uptrend());
    let pipeline = pipeline(
        config(dir.path(), &["AAPL"]),
        provider,
        Arc::new(MemoryLedger::new()),
        Arc::new(RecordingNotifier::default()),
    )
    .with_inbox(Arc::new(SpoolDirSource::new(&spool)));

    assert!(pipeline.run(day(15), false).await.is_err());
    assert!(spool.join("001.eml").exists());
    assert!(!spool.join("processed").join("001.eml").exists());

    // Once the state is readable again the message is picked up
    std::fs::remove_file(state.join("weights.json")).unwrap();
    let report = pipeline.run(day(15), false).await.unwrap();
    assert_eq!(report.alerts[0].symbol, "NVDA");
    assert!(spool.join("processed").join("001.eml").exists());
}

fn resolved_row(symbol: &str, opened: u32, readings: Readings, status: TradeStatus) -> LedgerRow {
    LedgerRow {
        trade_id: TradeId::new(symbol, day(opened)),
        symbol: symbol.to_string(),
        direction: Direction::Long,
        status,
        opened_on: day(opened),
        entry_price: dec!(100),
        score: dec!(0.4),
        readings,
        closed_on: Some(day(opened + 3)),
        exit_price: Some(dec!(106)),
        return_pct: Some(dec!(0.06)),
    }
}

#[tokio::test]
async fn test_forced_calibration_rewards_accurate_indicator() {
    let dir = tempfile::tempdir().unwrap();
    let readings: Readings = [
        (IndicatorKind::Rsi, dec!(0.5)),
        (IndicatorKind::Bollinger, dec!(-0.5)),
    ]
    .into_iter()
    .collect();
    let rows: Vec<LedgerRow> = (1..=6)
        .map(|d| resolved_row(&format!("T{}", (b'A' + d as u8) as char), d, readings.clone(), TradeStatus::Won))
        .collect();

    let mut config = config(dir.path(), &["AAPL"]);
    config.weights.0 = IndicatorKind::ALL.iter().map(|k| (*k, dec!(1))).collect();
    let store = WeightStore::new(dir.path().join("weights"));
    let pipeline = pipeline(
        config,
        StaticProvider::new(),
        Arc::new(MemoryLedger::with_rows(rows)),
        Arc::new(RecordingNotifier::default()),
    )
    .with_weight_store(store.clone());

    let report = pipeline.calibrate(day(20), true, false).await.unwrap().unwrap();

    assert_eq!(report.samples_used, 6);
    assert_eq!(report.stats[&IndicatorKind::Rsi].hits, 6);
    assert_eq!(report.stats[&IndicatorKind::Bollinger].hits, 0);
    assert!(report.after.get(IndicatorKind::Rsi) > dec!(0.2));
    assert!(report.after.get(IndicatorKind::Bollinger) < dec!(0.2));
    assert!(store.path().exists());

    // Just calibrated, so an unforced pass is not due
    assert!(pipeline.calibrate(day(20), false, false).await.unwrap().is_none());
}

#[tokio::test]
async fn test_calibrate_then_run_a_week_later_recalibrates() {
    let dir = tempfile::tempdir().unwrap();
    let readings: Readings = [(IndicatorKind::Momentum, dec!(0.5))].into_iter().collect();
    let rows: Vec<LedgerRow> = (1..=3)
        .map(|d| resolved_row(&format!("T{}", (b'A' + d as u8) as char), d, readings.clone(), TradeStatus::Won))
        .collect();
    let pipeline = pipeline(
        config(dir.path(), &["AAPL"]),
        StaticProvider::new(),
        Arc::new(MemoryLedger::with_rows(rows)),
        Arc::new(RecordingNotifier::default()),
    );

    assert!(pipeline.calibrate(day(10), true, false).await.unwrap().is_some());
    let state = pipeline.weight_state().await.unwrap();
    assert_eq!(
        state.calibrated_at.map(|at| at.to_rfc3339()),
        Some("2024-03-10T00:00:00+00:00".to_string())
    );

    let six_days = pipeline.run(day(16), false).await.unwrap();
    assert!(six_days.calibration.is_none());

    let seven_days = pipeline.run(day(17), false).await.unwrap();
    assert!(seven_days.calibration.is_some());
}

#[tokio::test]
async fn test_resolve_only_hits_stop_loss() {
    let dir = tempfile::tempdir().unwrap();
    let mut open = resolved_row("AAPL", 10, Readings::new(), TradeStatus::Open);
    open.closed_on = None;
    open.exit_price = None;
    open.return_pct = None;
    let ledger = Arc::new(MemoryLedger::with_rows(vec![open]));
    let provider = StaticProvider::new().with_closes("AAPL", day(15), &[dec!(99), dec!(96)]);
    let pipeline = pipeline(
        config(dir.path(), &["AAPL"]),
        provider,
        ledger.clone(),
        Arc::new(RecordingNotifier::default()),
    );

    let resolved = pipeline.resolve(day(15), false).await.unwrap();

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].resolution.outcome, Outcome::Lost);
    assert_eq!(resolved[0].resolution.return_pct, dec!(-0.04));
    let rows = ledger.rows().await.unwrap();
    assert_eq!(rows[0].status, TradeStatus::Lost);
    assert_eq!(rows[0].closed_on, Some(day(15)));
}
