use crate::models::AlertConfig;
use crate::services::SqliteAlertStore;
use crate::utils::get_database_path;

/// Create the alert tables and seed rows for the configured symbols
pub fn run() {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let config = AlertConfig::from_env()?;
        let path = get_database_path();
        let store = SqliteAlertStore::new(path.clone()).await?;
        let inserted = store.seed_symbols(&config.symbols).await?;
        store.close().await;
        Ok::<_, crate::error::Error>((path, inserted, config.symbols.len()))
    });

    match result {
        Ok((path, inserted, total)) => {
            println!("✅ Database initialized at {}", path.display());
            println!("   {} of {} symbols newly registered", inserted, total);
        }
        Err(e) => {
            eprintln!("❌ Database initialization failed: {}", e);
            std::process::exit(1);
        }
    }
}
