use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a MACD zero-line cross
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// MACD crossed from below zero to zero or above
    Bullish,
    /// MACD crossed from above zero to zero or below
    Bearish,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
        }
    }

    /// Trade side suggested by an expansion in this direction
    pub fn trade_side(&self) -> &'static str {
        match self {
            Direction::Bullish => "LONG",
            Direction::Bearish => "SHORT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recent MACD zero-line cross
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalEvent {
    /// Index of the first sample on the new side of zero
    pub index: usize,
    pub direction: Direction,
}

/// Points contributed by each volume check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBreakdown {
    /// 0, 2 or 4
    pub relative_volume: u8,
    /// 0, 2 or 4
    pub order_flow: u8,
    /// 0 or 2
    pub sustainment: u8,
}

impl VolumeBreakdown {
    pub fn total(&self) -> u8 {
        self.relative_volume + self.order_flow + self.sustainment
    }
}

/// Volume confirmation for a candidate pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeAssessment {
    /// Confidence score, 0 to 10
    pub score: u8,
    /// Latest volume / 20-period average volume
    pub ratio: f64,
    /// Taker buy share of the latest candle, in percent
    pub taker_ratio: f64,
    /// Average volume since the reversal stayed above 90% of the average
    pub sustained: bool,
    pub breakdown: VolumeBreakdown,
    pub narrative: String,
}

/// Why a pattern evaluation stopped, if it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStatus {
    /// Full evaluation ran
    Evaluated,
    /// Fewer candles than the evaluator needs
    InsufficientData,
    /// No zero-line cross after the guard window
    NoReversal,
    /// Reversal found but no completed samples after it
    NoPostReversalData,
}

/// Outcome of one pattern evaluation for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub status: PatternStatus,
    /// MACD expansion and volume gate both passed
    pub triggered: bool,
    /// MACD expansion criterion alone
    pub condition_met: bool,
    /// Open time of the latest candle, if any
    pub timestamp: Option<DateTime<Utc>>,
    pub reversal: Option<ReversalEvent>,
    /// |macd - signal| on the latest candle
    pub distance: f64,
    /// Largest |histogram| after the reversal
    pub peak_histogram: f64,
    /// distance / peak_histogram
    pub distance_ratio: f64,
    pub volume: VolumeAssessment,
    pub narrative: String,
}

impl PatternResult {
    /// Non-triggering result with all numeric fields zeroed
    pub fn inconclusive(
        status: PatternStatus,
        timestamp: Option<DateTime<Utc>>,
        narrative: impl Into<String>,
    ) -> Self {
        Self {
            status,
            triggered: false,
            condition_met: false,
            timestamp,
            reversal: None,
            distance: 0.0,
            peak_histogram: 0.0,
            distance_ratio: 0.0,
            volume: VolumeAssessment::default(),
            narrative: narrative.into(),
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.reversal.map(|r| r.direction)
    }
}
