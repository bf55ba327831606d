//! Trend-following indicators: moving averages and MACD

use rust_decimal::Decimal;

/// Simple moving average of the last `period` values
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let sum: Decimal = window.iter().sum();
    Some(sum / Decimal::from(period as u64))
}

/// Exponential moving average series, seeded with the first value
///
/// The returned series has the same length as the input.
pub fn ema_series(values: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }
    let multiplier = Decimal::from(2u64) / Decimal::from(period as u64 + 1);

    let mut out = Vec::with_capacity(values.len());
    let mut current = values[0];
    out.push(current);
    for value in &values[1..] {
        current = (*value - current) * multiplier + current;
        out.push(current);
    }
    out
}

/// Relative spread between a fast and a slow SMA: `(fast - slow) / slow`
pub fn sma_spread(values: &[Decimal], fast: usize, slow: usize) -> Option<Decimal> {
    if fast >= slow {
        return None;
    }
    let fast_avg = sma(values, fast)?;
    let slow_avg = sma(values, slow)?;
    if slow_avg.is_zero() {
        return None;
    }
    Some((fast_avg - slow_avg) / slow_avg)
}

/// MACD line, signal line and histogram at the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macd {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// Compute MACD at the latest bar
///
/// Requires at least `slow + signal` values so the slow EMA and the signal
/// line have both had time to settle.
pub fn macd(values: &[Decimal], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || signal == 0 || fast >= slow || values.len() < slow + signal {
        return None;
    }

    let fast_ema = ema_series(values, fast);
    let slow_ema = ema_series(values, slow);
    let macd_line: Vec<Decimal> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| *f - *s)
        .collect();
    let signal_line = ema_series(&macd_line[slow - 1..], signal);

    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;
    Some(Macd {
        macd,
        signal,
        histogram: macd - signal,
    })
}
