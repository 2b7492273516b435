use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use tracing::warn;

use crate::error::Result;
use crate::models::{Candle, CandleSeries};
use crate::services::market_data::CandleProvider;

/// Offline candle source for dry runs
///
/// Produces the same shape for every symbol: a 30-candle decline, a
/// 20-candle reversal up, then a slow upward drift. Volume and taker buy
/// share vary deterministically around 1000-1500 and 60-90%.
pub struct SyntheticProvider {
    end: DateTime<Utc>,
}

impl SyntheticProvider {
    /// Series ending at the candle containing `end`
    pub fn new(end: DateTime<Utc>) -> Self {
        Self { end }
    }

    pub fn generate(&self, interval_minutes: u32, count: usize) -> CandleSeries {
        let step = Duration::minutes(interval_minutes.max(1) as i64);
        let last_open = self.end.duration_trunc(step).unwrap_or(self.end);
        let base_price = 100.0;

        let candles = (0..count)
            .map(|i| {
                let close = if i < 30 {
                    base_price - i as f64 * 0.1
                } else if i < 50 {
                    base_price - 3.0 + (i - 30) as f64 * 0.3
                } else {
                    base_price + 3.0 + (i - 50) as f64 * 0.05
                };
                let wobble = ((i * 37) % 100) as f64 / 100.0;
                let volume = 1000.0 + wobble * 500.0;
                let taker_share = 0.6 + wobble * 0.3;
                let timestamp = last_open - step * (count - 1 - i) as i32;

                Candle::new(timestamp, close, volume, volume * close * taker_share)
            })
            .collect();

        CandleSeries::new(candles)
    }
}

#[async_trait]
impl CandleProvider for SyntheticProvider {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval_minutes: u32,
        count: usize,
    ) -> Result<CandleSeries> {
        warn!(symbol, "Offline mode: using synthetic candles");
        Ok(self.generate(interval_minutes, count))
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
