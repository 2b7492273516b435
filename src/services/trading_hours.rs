use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::constants::DEFAULT_TRADING_WINDOWS;
use crate::error::{AppError, Result};

/// High-liquidity windows during which alerts are evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct TradingHours {
    pub windows: Vec<(u32, u32)>, // [start, end) hours, e.g. (7, 10)
    pub timezone: String,         // "UTC"
    pub weekdays_only: bool,      // false, crypto trades all week
}

impl Default for TradingHours {
    fn default() -> Self {
        Self {
            windows: DEFAULT_TRADING_WINDOWS.to_vec(),
            timezone: "UTC".to_string(),
            weekdays_only: false,
        }
    }
}

/// Result of the trading hours gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingWindowCheck {
    pub open: bool,
    pub message: String,
}

impl TradingHours {
    /// Every hour of every day
    pub fn always_open() -> Self {
        Self {
            windows: vec![(0, 24)],
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.windows.is_empty() {
            return Err(AppError::Config("No trading hour windows configured".to_string()));
        }
        for &(start, end) in &self.windows {
            if start >= end || end > 24 {
                return Err(AppError::Config(format!(
                    "Invalid trading window {}-{}",
                    start, end
                )));
            }
        }
        self.timezone
            .parse::<Tz>()
            .map(|_| ())
            .map_err(|e| AppError::Config(format!("Invalid timezone '{}': {}", self.timezone, e)))
    }

    /// Check whether `now` falls inside one of the windows
    pub fn check(&self, now: DateTime<Utc>) -> TradingWindowCheck {
        // Parse timezone
        let tz: Tz = match self.timezone.parse() {
            Ok(tz) => tz,
            Err(e) => {
                tracing::warn!("Failed to parse timezone '{}': {}", self.timezone, e);
                return TradingWindowCheck {
                    open: false,
                    message: format!("Unknown timezone {}", self.timezone),
                };
            }
        };

        let now_local = now.with_timezone(&tz);

        if self.weekdays_only && matches!(now_local.weekday(), Weekday::Sat | Weekday::Sun) {
            return TradingWindowCheck {
                open: false,
                message: format!("Weekend ({}), outside trading days", now_local.weekday()),
            };
        }

        let current_hour = now_local.hour();
        for &(start, end) in &self.windows {
            if current_hour >= start && current_hour < end {
                return TradingWindowCheck {
                    open: true,
                    message: format!(
                        "High-liquidity window: {:02}:00-{:02}:00 {}",
                        start, end, self.timezone
                    ),
                };
            }
        }

        TradingWindowCheck {
            open: false,
            message: format!(
                "Outside trading windows (now: {:02}:00 {})",
                current_hour, self.timezone
            ),
        }
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.check(now).open
    }
}

/// Parse windows written as `"7-10,12-16"`
pub fn parse_windows(raw: &str) -> Result<Vec<(u32, u32)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (start, end) = part
                .split_once('-')
                .ok_or_else(|| AppError::Config(format!("Invalid trading window '{}'", part)))?;
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid start hour in '{}'", part)))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid end hour in '{}'", part)))?;
            Ok((start, end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        // 2025-03-05 is a Wednesday
        Utc.with_ymd_and_hms(2025, 3, 5, hour, 30, 0).unwrap()
    }

    #[test]
    fn test_trading_hours_config() {
        let config = TradingHours::default();
        assert_eq!(config.windows, vec![(7, 10), (12, 16)]);
        assert_eq!(config.timezone, "UTC");
        assert!(!config.weekdays_only);
    }

    #[test]
    fn test_window_bounds_are_half_open() {
        let hours = TradingHours::default();
        assert!(!hours.is_open(at(6)));
        assert!(hours.is_open(at(7)));
        assert!(hours.is_open(at(9)));
        assert!(!hours.is_open(at(10)));
        assert!(!hours.is_open(at(11)));
        assert!(hours.is_open(at(12)));
        assert!(hours.is_open(at(15)));
        assert!(!hours.is_open(at(16)));
    }

    #[test]
    fn test_weekdays_only() {
        let hours = TradingHours {
            weekdays_only: true,
            ..TradingHours::always_open()
        };
        // 2025-03-08 is a Saturday
        let saturday = Utc.with_ymd_and_hms(2025, 3, 8, 8, 0, 0).unwrap();
        assert!(!hours.is_open(saturday));
        assert!(hours.is_open(at(8)));
    }

    #[test]
    fn test_timezone_shift() {
        let hours = TradingHours {
            windows: vec![(9, 15)],
            timezone: "Asia/Ho_Chi_Minh".to_string(),
            weekdays_only: false,
        };
        // 02:30 UTC is 09:30 in UTC+7
        assert!(hours.is_open(at(2)));
        assert!(!hours.is_open(at(9)));
    }

    #[test]
    fn test_parse_windows() {
        assert_eq!(parse_windows("7-10, 12-16").unwrap(), vec![(7, 10), (12, 16)]);
        assert!(parse_windows("7to10").is_err());
        assert!(parse_windows("a-10").is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let hours = TradingHours {
            windows: vec![(10, 7)],
            ..Default::default()
        };
        assert!(hours.validate().is_err());
    }
}
