//! Oscillators: RSI, rate of change and Bollinger %B

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Relative strength index with Wilder smoothing
///
/// Needs `period + 1` closes. Returns a value in `[0, 100]`.
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let n = Decimal::from(period as u64);

    let mut avg_gain = dec!(0);
    let mut avg_loss = dec!(0);
    for pair in closes[..=period].windows(2) {
        let change = pair[1] - pair[0];
        if change > dec!(0) {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= n;
    avg_loss /= n;

    for pair in closes[period..].windows(2) {
        let change = pair[1] - pair[0];
        let (gain, loss) = if change > dec!(0) {
            (change, dec!(0))
        } else {
            (dec!(0), -change)
        };
        avg_gain = (avg_gain * (n - Decimal::ONE) + gain) / n;
        avg_loss = (avg_loss * (n - Decimal::ONE) + loss) / n;
    }

    if avg_loss.is_zero() {
        return Some(if avg_gain.is_zero() { dec!(50) } else { dec!(100) });
    }
    let rs = avg_gain / avg_loss;
    Some(dec!(100) - dec!(100) / (Decimal::ONE + rs))
}

/// Rate of change over `period` bars: `(last - base) / base`
pub fn rate_of_change(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let last = *closes.last()?;
    let base = closes[closes.len() - 1 - period];
    if base.is_zero() {
        return None;
    }
    Some((last - base) / base)
}

/// Bollinger %B: position of the last close inside the band
///
/// 0 at the lower band, 1 at the upper band. A zero-width band yields 0.5.
pub fn percent_b(closes: &[Decimal], period: usize, width: Decimal) -> Option<Decimal> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    let n = period as f64;
    let values: Vec<f64> = window
        .iter()
        .map(|d| f64::try_from(*d).unwrap_or(0.0))
        .collect();
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let width: f64 = width.try_into().unwrap_or(2.0);
    let band = 2.0 * width * std_dev;
    if band <= f64::EPSILON {
        return Some(dec!(0.5));
    }
    let lower = mean - width * std_dev;
    let last = values[values.len() - 1];
    Decimal::try_from((last - lower) / band).ok()
}
