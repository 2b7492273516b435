//! One alert cycle
//!
//! Evaluates every configured symbol once and exits. Meant to be invoked by
//! an external scheduler (cron, CI) every candle interval.
//!
//! Usage:
//! - Live: `macdalert check`
//! - Offline dry run with synthetic candles: `macdalert check --offline`
//! - Ignore the trading hours gate: `macdalert check --ignore-hours`

use chrono::Utc;

use crate::error::Result;
use crate::models::AlertConfig;
use crate::services::{
    AlertStore, BinanceKlineProvider, CandleProvider, Notifier, SqliteAlertStore,
    SyntheticProvider, TelegramNotifier, TradingHours, DEFAULT_BINANCE_API_URL,
};
use crate::utils::{env_parse, env_string, get_database_path, parse_symbol_list};
use crate::worker::{AlertWorker, CycleSummary};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub offline: bool,
    pub ignore_hours: bool,
    pub symbols: Option<String>,
}

/// Run check command
pub fn run(options: CheckOptions) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    match runtime.block_on(check(options)) {
        Ok(summary) if summary.skipped => {
            println!("⏭️  Outside trading hours, nothing evaluated");
        }
        Ok(summary) => {
            println!(
                "✅ Check completed | Symbols: {} | Alerts sent: {}",
                summary.evaluated, summary.alerts_sent
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Critical error");
            eprintln!("❌ Check failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn check(options: CheckOptions) -> Result<CycleSummary> {
    let mut config = AlertConfig::from_env()?;
    if let Some(raw) = options.symbols.as_deref() {
        config.symbols = parse_symbol_list(raw);
    }
    if options.ignore_hours {
        config.trading_hours = TradingHours::always_open();
    }
    config.validate()?;

    let http_timeout: u64 = env_parse("HTTP_TIMEOUT_SECS", 30)?;

    let provider: Box<dyn CandleProvider> = if options.offline {
        Box::new(SyntheticProvider::new(Utc::now()))
    } else {
        let base_url = env_string("BINANCE_API_URL").unwrap_or_else(|| DEFAULT_BINANCE_API_URL.to_string());
        Box::new(BinanceKlineProvider::new(base_url, http_timeout)?)
    };

    let notifier: Option<Box<dyn Notifier>> = match TelegramNotifier::from_env(http_timeout)? {
        Some(telegram) => Some(Box::new(telegram)),
        None => {
            tracing::warn!("Telegram not configured, alerts will not be delivered");
            None
        }
    };

    let store = SqliteAlertStore::new(get_database_path()).await?;
    store.seed_symbols(&config.symbols).await?;
    let store: Box<dyn AlertStore> = Box::new(store);

    let worker = AlertWorker::new(config, provider, notifier, store);
    worker.run_cycle(Utc::now()).await
}
