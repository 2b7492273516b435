use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::models::{Candle, CandleSeries};
use crate::services::market_data::CandleProvider;

pub const DEFAULT_BINANCE_API_URL: &str = "https://api.binance.com";

// Kline array layout returned by /api/v3/klines
const KLINE_OPEN_TIME: usize = 0;
const KLINE_CLOSE: usize = 4;
const KLINE_VOLUME: usize = 5;
const KLINE_TAKER_BUY_QUOTE_VOLUME: usize = 10;

/// Client for Binance spot klines (public endpoint, no API key needed)
pub struct BinanceKlineProvider {
    base_url: String,
    client: reqwest::Client,
}

impl BinanceKlineProvider {
    /// Create a new klines client
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. "https://api.binance.com"
    /// * `timeout_secs` - Per-request timeout
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Created BinanceKlineProvider: base_url='{}'", base_url);

        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl CandleProvider for BinanceKlineProvider {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval_minutes: u32,
        count: usize,
    ) -> Result<CandleSeries> {
        let interval = binance_interval(interval_minutes)?;
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, count
        );

        debug!("Fetching klines: url={}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            let error_msg = format!("Klines request failed for {}: {}", symbol, e);
            error!("{}", error_msg);
            Error::Network(error_msg)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(Error::Network(format!(
                "Binance returned error status {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        let series = parse_klines(&body)?;
        debug!(symbol, candles = series.len(), "Fetched klines");
        Ok(series)
    }

    fn name(&self) -> &'static str {
        "binance"
    }
}

/// Map a candle size in minutes to a Binance interval string
pub fn binance_interval(minutes: u32) -> Result<&'static str> {
    match minutes {
        1 => Ok("1m"),
        3 => Ok("3m"),
        5 => Ok("5m"),
        15 => Ok("15m"),
        30 => Ok("30m"),
        60 => Ok("1h"),
        120 => Ok("2h"),
        240 => Ok("4h"),
        360 => Ok("6h"),
        480 => Ok("8h"),
        720 => Ok("12h"),
        1440 => Ok("1d"),
        other => Err(Error::Config(format!(
            "Unsupported kline interval: {} minutes",
            other
        ))),
    }
}

/// Parse the /api/v3/klines JSON body
pub fn parse_klines(body: &str) -> Result<CandleSeries> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("Failed to parse klines JSON: {}", e)))?;

    let candles = rows
        .iter()
        .map(|row| parse_kline_row(row))
        .collect::<Result<Vec<_>>>()?;

    Ok(CandleSeries::new(candles))
}

fn parse_kline_row(row: &[Value]) -> Result<Candle> {
    let open_time_ms = row
        .get(KLINE_OPEN_TIME)
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::Parse("Kline row missing open time".to_string()))?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .ok_or_else(|| Error::Parse(format!("Invalid kline open time: {}", open_time_ms)))?;

    Ok(Candle::new(
        timestamp,
        number_field(row, KLINE_CLOSE, "close")?,
        number_field(row, KLINE_VOLUME, "volume")?,
        number_field(row, KLINE_TAKER_BUY_QUOTE_VOLUME, "taker buy quote volume")?,
    ))
}

/// Binance encodes decimals as strings
fn number_field(row: &[Value], index: usize, name: &str) -> Result<f64> {
    match row.get(index) {
        Some(Value::String(s)) => s
            .parse::<f64>()
            .map_err(|_| Error::Parse(format!("Invalid {} value: '{}'", name, s))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| Error::Parse(format!("Invalid {} value: {}", name, n))),
        _ => Err(Error::Parse(format!("Kline row missing {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        [1735689600000, "93500.10", "93600.00", "93400.00", "93550.50", "12.5", 1735689899999, "1169381.25", 1500, "8.0", "748400.00", "0"],
        [1735689300000, "93400.00", "93520.00", "93380.00", "93500.10", "10.0", 1735689599999, "935001.00", 1200, "5.0", "467500.50", "0"]
    ]"#;

    #[test]
    fn test_parse_klines() {
        let series = parse_klines(SAMPLE).unwrap();
        assert_eq!(series.len(), 2);

        // Sorted chronologically
        let first = &series.candles()[0];
        assert_eq!(first.timestamp.timestamp_millis(), 1735689300000);
        assert_eq!(first.close, 93500.10);
        assert_eq!(first.volume, 10.0);
        assert_eq!(first.taker_buy_volume, 467500.50);

        let last = series.last().unwrap();
        assert_eq!(last.close, 93550.50);
    }

    #[test]
    fn test_parse_klines_rejects_garbage() {
        assert!(matches!(parse_klines("{\"code\": -1121}"), Err(Error::Parse(_))));
        assert!(matches!(parse_klines("[[1735689600000, \"1.0\"]]"), Err(Error::Parse(_))));
        assert!(parse_klines("[[1735689600000, \"1\", \"1\", \"1\", \"abc\", \"1\", 0, \"1\", 1, \"1\", \"1\", \"0\"]]").is_err());
    }

    #[test]
    fn test_binance_interval() {
        assert_eq!(binance_interval(5).unwrap(), "5m");
        assert_eq!(binance_interval(60).unwrap(), "1h");
        assert!(binance_interval(7).is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(BinanceKlineProvider::new("ftp://example.com".to_string(), 10).is_err());
    }
}
