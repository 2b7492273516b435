use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{AppError, Result};
use crate::services::trading_hours::{parse_windows, TradingHours};
use crate::utils::{env_parse, env_string, parse_symbol_list};

/// Thresholds of the volume confirmation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeThresholds {
    /// Relative volume worth 4 points
    pub strong: f64,
    /// Relative volume worth 2 points
    pub moderate: f64,
    /// Taker buy percentage worth 4 points
    pub taker_buy: f64,
}

impl Default for VolumeThresholds {
    fn default() -> Self {
        Self {
            strong: DEFAULT_VOLUME_THRESHOLD_STRONG,
            moderate: DEFAULT_VOLUME_THRESHOLD_MODERATE,
            taker_buy: DEFAULT_TAKER_BUY_THRESHOLD,
        }
    }
}

/// Configuration for the pattern engine and the alert cycle
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Symbols evaluated each cycle, in order
    pub symbols: Vec<String>,

    /// MACD periods
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    /// Leading samples skipped by the zero-cross scan
    pub reversal_guard: usize,

    /// Required distance / post-reversal peak
    pub expansion_ratio: f64,

    /// Required volume score for an alert
    pub min_volume_score: u8,

    pub volume: VolumeThresholds,

    /// Minimum seconds between alerts for one symbol
    pub cooldown_secs: i64,

    /// Candle size and count requested from the data provider
    pub kline_interval_minutes: u32,
    pub kline_limit: usize,

    pub trading_hours: TradingHours,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            macd_fast: DEFAULT_MACD_FAST,
            macd_slow: DEFAULT_MACD_SLOW,
            macd_signal: DEFAULT_MACD_SIGNAL,
            reversal_guard: DEFAULT_REVERSAL_GUARD,
            expansion_ratio: DEFAULT_EXPANSION_RATIO,
            min_volume_score: DEFAULT_MIN_VOLUME_SCORE,
            volume: VolumeThresholds::default(),
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            kline_interval_minutes: DEFAULT_KLINE_INTERVAL_MINUTES,
            kline_limit: DEFAULT_KLINE_LIMIT,
            trading_hours: TradingHours::default(),
        }
    }
}

impl AlertConfig {
    /// Load configuration from environment variables on top of the defaults
    ///
    /// Recognized variables: `SYMBOLS`, `MACD_FAST`, `MACD_SLOW`,
    /// `MACD_SIGNAL`, `REVERSAL_GUARD`, `VOLUME_THRESHOLD_STRONG`,
    /// `VOLUME_THRESHOLD_MODERATE`, `TAKER_BUY_THRESHOLD`, `COOLDOWN_SECS`,
    /// `KLINE_INTERVAL_MINUTES`, `KLINE_LIMIT`, `TRADING_HOURS` (e.g.
    /// `7-10,12-16`), `TRADING_TIMEZONE`, `TRADING_WEEKDAYS_ONLY`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let symbols = match env_string("SYMBOLS") {
            Some(raw) => parse_symbol_list(&raw),
            None => defaults.symbols,
        };

        let mut trading_hours = defaults.trading_hours;
        if let Some(raw) = env_string("TRADING_HOURS") {
            trading_hours.windows = parse_windows(&raw)?;
        }
        if let Some(tz) = env_string("TRADING_TIMEZONE") {
            trading_hours.timezone = tz;
        }
        trading_hours.weekdays_only = env_parse("TRADING_WEEKDAYS_ONLY", trading_hours.weekdays_only)?;

        let config = Self {
            symbols,
            macd_fast: env_parse("MACD_FAST", defaults.macd_fast)?,
            macd_slow: env_parse("MACD_SLOW", defaults.macd_slow)?,
            macd_signal: env_parse("MACD_SIGNAL", defaults.macd_signal)?,
            reversal_guard: env_parse("REVERSAL_GUARD", defaults.reversal_guard)?,
            expansion_ratio: defaults.expansion_ratio,
            min_volume_score: defaults.min_volume_score,
            volume: VolumeThresholds {
                strong: env_parse("VOLUME_THRESHOLD_STRONG", defaults.volume.strong)?,
                moderate: env_parse("VOLUME_THRESHOLD_MODERATE", defaults.volume.moderate)?,
                taker_buy: env_parse("TAKER_BUY_THRESHOLD", defaults.volume.taker_buy)?,
            },
            cooldown_secs: env_parse("COOLDOWN_SECS", defaults.cooldown_secs)?,
            kline_interval_minutes: env_parse("KLINE_INTERVAL_MINUTES", defaults.kline_interval_minutes)?,
            kline_limit: env_parse("KLINE_LIMIT", defaults.kline_limit)?,
            trading_hours,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot evaluate
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(AppError::Config("No symbols configured".to_string()));
        }
        if self.macd_fast == 0 || self.macd_slow == 0 || self.macd_signal == 0 {
            return Err(AppError::Config("MACD periods must be positive".to_string()));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AppError::Config(format!(
                "MACD fast period ({}) must be smaller than slow period ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        if self.volume.moderate > self.volume.strong {
            return Err(AppError::Config(format!(
                "Moderate volume threshold ({}) exceeds strong threshold ({})",
                self.volume.moderate, self.volume.strong
            )));
        }
        if self.cooldown_secs < 0 {
            return Err(AppError::Config("Cooldown must not be negative".to_string()));
        }
        if self.kline_interval_minutes == 0 {
            return Err(AppError::Config("Kline interval must be positive".to_string()));
        }
        if self.kline_limit < MIN_CANDLES_FOR_PATTERN {
            return Err(AppError::Config(format!(
                "Kline limit {} is below the {} candles the pattern needs",
                self.kline_limit, MIN_CANDLES_FOR_PATTERN
            )));
        }
        self.trading_hours.validate()
    }
}
