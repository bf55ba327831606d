//! Configuration loading

use signal_bot::config::{Config, ConfigError, LogFormat};

#[test]
fn test_load_example_config() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example")).unwrap();
    assert_eq!(config.indicators.rsi_period, 14);
    assert_eq!(config.calibration.interval_days, 7);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert!(config.watchlist.symbols.contains(&"AAPL".to_string()));
}

#[test]
fn test_load_missing_file_fails() {
    assert!(Config::load("/nonexistent/signal-bot.toml").is_err());
}

#[test]
fn test_load_rejects_invalid_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[watchlist]\nsymbols = [\"AAPL\"]\n\n[signal]\nlong_threshold = 1.5\n",
    )
    .unwrap();

    let err = Config::load(&path).unwrap_err();
    let config_err = err.downcast_ref::<ConfigError>().unwrap();
    assert!(matches!(config_err, ConfigError::ThresholdOutOfRange("long_threshold", _)));
}

#[test]
fn test_minimal_config_uses_defaults() {
    let config: Config = toml::from_str("[watchlist]\nsymbols = [\"SPY\"]\n").unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.positions.max_hold_days, 10);
    assert!(!config.inbox.enabled);
    assert!(!config.notify.enabled);
}
