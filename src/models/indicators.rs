//! Technical indicators used by the pattern engine
//!
//! All functions are pure and return series aligned with their input:
//! element `i` of the output belongs to element `i` of the input.
//!
//! ## Seeding
//! EMAs are seeded from the first observation (no SMA warm-up and no
//! truncation), so early values are noisier but every index has a value.
//! The reversal scan skips the leading samples for that reason.

/// Calculate Simple Moving Average for a given period
///
/// # Arguments
/// * `values` - Input series (prices or volumes)
/// * `period` - Period for the moving average (e.g., 20)
///
/// # Returns
/// * Vector of MA values aligned with input (early values are 0.0)
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut ma_values = vec![0.0; values.len()];

    if period == 0 || values.len() < period {
        return ma_values;
    }

    for i in (period - 1)..values.len() {
        let start_idx = i + 1 - period;
        let sum: f64 = values[start_idx..=i].iter().sum();
        ma_values[i] = sum / period as f64;
    }

    ma_values
}

/// Calculate Exponential Moving Average with smoothing factor `2 / (period + 1)`
///
/// Uses the incremental form `prev + alpha * (x - prev)` so that a constant
/// input is reproduced exactly.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());

    let mut prev: Option<f64> = None;
    for &value in values {
        let next = match prev {
            Some(p) => p + alpha * (value - p),
            None => value,
        };
        out.push(next);
        prev = Some(next);
    }

    out
}

/// MACD line, signal line and histogram, aligned with the close series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Single MACD observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl MacdSeries {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<MacdPoint> {
        Some(MacdPoint {
            macd: *self.macd.get(index)?,
            signal: *self.signal.get(index)?,
            histogram: *self.histogram.get(index)?,
        })
    }

    pub fn last(&self) -> Option<MacdPoint> {
        self.len().checked_sub(1).and_then(|i| self.point(i))
    }
}

/// Calculate MACD (fast EMA - slow EMA), its signal EMA and the histogram
///
/// # Arguments
/// * `closes` - Closing prices in chronological order
/// * `fast` - Fast EMA period (e.g., 12)
/// * `slow` - Slow EMA period (e.g., 26)
/// * `signal` - Signal EMA period (e.g., 9)
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = calculate_ema(&macd, signal);
    let histogram = macd
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_sma() {
        let values = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let ma3 = calculate_sma(&values, 3);

        assert_eq!(ma3[0], 0.0); // Not enough data
        assert_eq!(ma3[1], 0.0); // Not enough data
        assert_eq!(ma3[2], 11.0); // (10+11+12)/3
        assert_eq!(ma3[3], 12.0); // (11+12+13)/3
        assert_eq!(ma3[4], 13.0); // (12+13+14)/3
        assert_eq!(ma3[5], 14.0); // (13+14+15)/3
    }

    #[test]
    fn test_calculate_ema_seeded_from_first_value() {
        let ema = calculate_ema(&[10.0, 20.0, 20.0], 3);
        // alpha = 0.5
        assert_eq!(ema[0], 10.0);
        assert_eq!(ema[1], 15.0);
        assert_eq!(ema[2], 17.5);
    }

    #[test]
    fn test_macd_constant_input_is_flat() {
        let closes = vec![100.0; 60];
        let series = calculate_macd(&closes, 12, 26, 9);

        assert_eq!(series.len(), 60);
        assert!(series.macd.iter().all(|&v| v == 0.0));
        assert!(series.signal.iter().all(|&v| v == 0.0));
        assert!(series.histogram.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_macd_histogram_is_macd_minus_signal() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let series = calculate_macd(&closes, 12, 26, 9);

        for i in 0..series.len() {
            let p = series.point(i).unwrap();
            assert_eq!(p.histogram, p.macd - p.signal);
        }
    }

    #[test]
    fn test_macd_is_repeatable() {
        let closes: Vec<f64> = (0..80).map(|i| 50.0 + (i % 7) as f64).collect();
        assert_eq!(
            calculate_macd(&closes, 12, 26, 9),
            calculate_macd(&closes, 12, 26, 9)
        );
    }

    #[test]
    fn test_macd_empty_input() {
        let series = calculate_macd(&[], 12, 26, 9);
        assert!(series.is_empty());
        assert!(series.last().is_none());
    }
}
