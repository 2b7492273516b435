use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One closed kline as consumed by the pattern engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time of the candle
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Closing price
    pub close: f64,

    /// Base asset volume
    pub volume: f64,

    /// Taker buy volume in quote asset
    pub taker_buy_volume: f64,
}

impl Candle {
    /// Create a new candle
    pub fn new(timestamp: DateTime<Utc>, close: f64, volume: f64, taker_buy_volume: f64) -> Self {
        Self {
            timestamp,
            close,
            volume,
            taker_buy_volume,
        }
    }
}

/// Chronological candle sequence with unique timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series, sorting by timestamp and keeping the first candle
    /// seen for any repeated timestamp
    pub fn new(candles: Vec<Candle>) -> Self {
        let mut seen = HashSet::new();
        let mut unique: Vec<Candle> = candles
            .into_iter()
            .filter(|c| seen.insert(c.timestamp))
            .collect();
        unique.sort_by_key(|c| c.timestamp);
        Self { candles: unique }
    }

    /// Empty series, used when the data provider fails
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_series_sorts_and_dedups() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let candles = vec![
            Candle::new(t0 + Duration::minutes(10), 3.0, 1.0, 0.5),
            Candle::new(t0, 1.0, 1.0, 0.5),
            Candle::new(t0 + Duration::minutes(5), 2.0, 1.0, 0.5),
            Candle::new(t0 + Duration::minutes(5), 99.0, 1.0, 0.5),
        ];

        let series = CandleSeries::new(candles);
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
    }
}
