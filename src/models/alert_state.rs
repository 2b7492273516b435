use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PatternResult;

/// Persisted alert state, one row per symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolAlertState {
    pub symbol: String,
    /// Candle index of the reversal behind the last alert
    pub last_zero_cross_index: i64,
    /// Post-reversal histogram peak at the last alert
    pub max_histogram: f64,
    pub alert_sent: bool,
    /// Unix seconds of the last alert
    pub last_check_timestamp: i64,
    pub volume_score: i64,
}

impl SymbolAlertState {
    /// Zeroed state for a symbol seen for the first time
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            last_zero_cross_index: 0,
            max_histogram: 0.0,
            alert_sent: false,
            last_check_timestamp: 0,
            volume_score: 0,
        }
    }
}

/// Append-only audit row, one per alert or reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertHistoryRecord {
    /// Surrogate key, `None` until stored
    pub id: Option<i64>,
    pub symbol: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub macd_distance: f64,
    pub max_histogram: f64,
    pub distance_ratio: f64,
    pub volume_ratio: f64,
    pub taker_buy_ratio: f64,
    pub volume_score: i64,
    pub direction: Option<String>,
    /// `ALERTA_ENVIADO` or `RESET`
    pub decision: String,
    pub narrative: String,
}

impl AlertHistoryRecord {
    /// Snapshot a pattern result under the given decision
    pub fn from_result(
        symbol: &str,
        timestamp: DateTime<Utc>,
        result: &PatternResult,
        decision: &str,
    ) -> Self {
        Self {
            id: None,
            symbol: symbol.to_string(),
            timestamp,
            macd_distance: result.distance,
            max_histogram: result.peak_histogram,
            distance_ratio: result.distance_ratio,
            volume_ratio: result.volume.ratio,
            taker_buy_ratio: result.volume.taker_ratio,
            volume_score: result.volume.score as i64,
            direction: result.direction().map(|d| d.as_str().to_string()),
            decision: decision.to_string(),
            narrative: result.narrative.clone(),
        }
    }
}
