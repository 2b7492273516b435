use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Get alert database path from environment variable or use default
pub fn get_database_path() -> PathBuf {
    std::env::var("ALERTS_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("alerts.db"))
}

/// Read an optional environment variable, treating blank values as unset
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset
pub fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: '{}'", key, raw))),
        None => Ok(default),
    }
}

/// Split a comma-separated symbol list, uppercasing and dropping blanks
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Initialize tracing with `RUST_LOG` support (defaults to info)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol_list() {
        let symbols = parse_symbol_list(" btcusdt, ETHUSDT,,solusdt ");
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
    }

    #[test]
    fn test_env_parse_default() {
        let value: usize = env_parse("MACDALERT_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
