//! Pattern and alerting constants
//!
//! Defaults for the MACD expansion pattern. Every value here can be
//! overridden through [`crate::models::AlertConfig`]; the constants only
//! document what the engine does out of the box.

/// Fast EMA period of the MACD line
pub const DEFAULT_MACD_FAST: usize = 12;

/// Slow EMA period of the MACD line
pub const DEFAULT_MACD_SLOW: usize = 26;

/// EMA period of the signal line
pub const DEFAULT_MACD_SIGNAL: usize = 9;

/// Minimum number of candles before the pattern is evaluated at all
pub const MIN_CANDLES_FOR_PATTERN: usize = 50;

/// Minimum number of candles for the volume confirmation
pub const MIN_CANDLES_FOR_VOLUME: usize = 25;

/// Window of the volume simple moving average
pub const VOLUME_MA_PERIOD: usize = 20;

/// Leading samples ignored by the zero-cross scan.
///
/// The first smoothed MACD values are noisy because the EMAs are seeded
/// from a single observation. Crossings at or before this index are never
/// reported.
pub const DEFAULT_REVERSAL_GUARD: usize = 10;

/// Current distance must be at least this multiple of the post-reversal peak
pub const DEFAULT_EXPANSION_RATIO: f64 = 2.0;

/// Minimum volume score (0-10) for an alert to fire
pub const DEFAULT_MIN_VOLUME_SCORE: u8 = 5;

/// Relative volume thresholds (latest volume / MA20)
pub const DEFAULT_VOLUME_THRESHOLD_STRONG: f64 = 1.8;
pub const DEFAULT_VOLUME_THRESHOLD_MODERATE: f64 = 1.3;

/// Taker buy share (percent) considered institutional
pub const DEFAULT_TAKER_BUY_THRESHOLD: f64 = 65.0;

/// Taker buy share (percent) considered neutral
pub const TAKER_BUY_NEUTRAL_THRESHOLD: f64 = 55.0;

/// Average volume since the reversal must exceed this fraction of MA20
pub const VOLUME_SUSTAIN_FACTOR: f64 = 0.9;

/// Volume score labels
pub const VOLUME_SCORE_STRONG: u8 = 8;
pub const VOLUME_SCORE_MODERATE: u8 = 5;

/// Minimum seconds between two notifications for the same symbol
pub const DEFAULT_COOLDOWN_SECS: i64 = 900; // 15 minutes

/// Candle interval and history size requested per cycle
pub const DEFAULT_KLINE_INTERVAL_MINUTES: u32 = 5;
pub const DEFAULT_KLINE_LIMIT: usize = 100;

/// High-liquidity windows as [start, end) hours
pub const DEFAULT_TRADING_WINDOWS: &[(u32, u32)] = &[(7, 10), (12, 16)];

/// Symbols watched when nothing is configured
pub const DEFAULT_SYMBOLS: &[&str] = &["BTCUSDT"];

/// History decisions, stored verbatim
pub const DECISION_ALERT_SENT: &str = "ALERTA_ENVIADO";
pub const DECISION_RESET: &str = "RESET";
