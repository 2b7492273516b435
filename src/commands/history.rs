//! Alert audit trail
//!
//! Usage:
//! - All symbols: `macdalert history`
//! - One symbol: `macdalert history --symbol BTCUSDT --limit 50`

use crate::models::AlertHistoryRecord;
use crate::services::{AlertStore, SqliteAlertStore};
use crate::utils::get_database_path;

pub fn run(symbol: Option<String>, limit: i64) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let symbol = symbol.map(|s| s.trim().to_uppercase());

    let result = runtime.block_on(async {
        let store = SqliteAlertStore::new(get_database_path()).await?;
        let rows = store.recent_history(symbol.as_deref(), limit).await;
        store.close().await;
        rows
    });

    match result {
        Ok(rows) if rows.is_empty() => println!("No alert history recorded yet."),
        Ok(rows) => {
            for row in &rows {
                println!("{}", format_record(row));
            }
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn format_record(record: &AlertHistoryRecord) -> String {
    format!(
        "#{:<5} {} {:<10} {:<14} dist {:.4} / peak {:.4} ({:.1}x) | vol {:.1}x | taker {:.0}% | score {}/10{}",
        record.id.unwrap_or_default(),
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.symbol,
        record.decision,
        record.macd_distance,
        record.max_histogram,
        record.distance_ratio,
        record.volume_ratio,
        record.taker_buy_ratio,
        record.volume_score,
        record
            .direction
            .as_deref()
            .map(|d| format!(" | {}", d))
            .unwrap_or_default()
    )
}
