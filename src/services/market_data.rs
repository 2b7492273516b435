use async_trait::async_trait;

use crate::error::Result;
use crate::models::CandleSeries;

/// Source of recent candles for a symbol
///
/// Implementations return an error on any failure; the alert cycle turns
/// that into an empty series so the symbol falls through the
/// insufficient-data path.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval_minutes: u32,
        count: usize,
    ) -> Result<CandleSeries>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
