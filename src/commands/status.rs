use chrono::{TimeZone, Utc};

use crate::models::{AlertConfig, SymbolAlertState};
use crate::services::{AlertStore, SqliteAlertStore};
use crate::utils::get_database_path;

pub fn run() {
    println!("📊 Alert Status\n");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(show_status()) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn show_status() -> crate::error::Result<()> {
    let config = AlertConfig::from_env()?;
    let gate = config.trading_hours.check(Utc::now());
    println!("{} {}\n", if gate.open { "🟢" } else { "⚪" }, gate.message);

    let store = SqliteAlertStore::new(get_database_path()).await?;
    let states = store.list_states().await?;
    store.close().await;

    if states.is_empty() {
        println!("⚠️  No symbols tracked yet. Run 'init-db' or 'check' first.");
        return Ok(());
    }

    println!("═══════════════════════════════════════════════════════════");
    for state in &states {
        println!("{}", format_state(state, config.cooldown_secs));
    }
    println!("═══════════════════════════════════════════════════════════");

    Ok(())
}

fn format_state(state: &SymbolAlertState, cooldown_secs: i64) -> String {
    let phase = if state.alert_sent { "🚨 ALERTED" } else { "💤 IDLE" };
    let last = if state.last_check_timestamp > 0 {
        Utc.timestamp_opt(state.last_check_timestamp, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "invalid".to_string())
    } else {
        "never".to_string()
    };
    let cooldown_until = if state.alert_sent {
        let until = state.last_check_timestamp + cooldown_secs;
        Utc.timestamp_opt(until, 0)
            .single()
            .map(|t| format!(" | cooldown until {}", t.format("%H:%M")))
            .unwrap_or_default()
    } else {
        String::new()
    };

    format!(
        "🔹 {:<12} {:<11} | last alert: {} | score {}/10 | peak hist {:.4}{}",
        state.symbol, phase, last, state.volume_score, state.max_histogram, cooldown_until
    )
}
