use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{AlertHistoryRecord, SymbolAlertState};

/// Persistence for per-symbol alert state and the alert audit trail
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Read the state row, inserting zeroed defaults on first observation
    async fn load_or_create_state(&self, symbol: &str) -> Result<SymbolAlertState>;

    /// Replace `prev` with `next` only if the stored row still equals `prev`.
    ///
    /// Returns `false` when another writer changed the row in between.
    async fn compare_and_swap_state(
        &self,
        prev: &SymbolAlertState,
        next: &SymbolAlertState,
    ) -> Result<bool>;

    /// Append one audit record, returning its id
    async fn append_history(&self, record: &AlertHistoryRecord) -> Result<i64>;

    /// All state rows ordered by symbol
    async fn list_states(&self) -> Result<Vec<SymbolAlertState>>;

    /// Most recent history rows, optionally for one symbol
    async fn recent_history(
        &self,
        symbol: Option<&str>,
        limit: i64,
    ) -> Result<Vec<AlertHistoryRecord>>;
}

/// `alert_history` columns absent from databases created before they existed
const HISTORY_ADDED_COLUMNS: &[(&str, &str)] = &[
    ("distance_ratio", "REAL NOT NULL DEFAULT 0"),
    ("direction", "TEXT"),
    ("narrative", "TEXT NOT NULL DEFAULT ''"),
];

/// SQLite-backed alert store
#[derive(Debug)]
pub struct SqliteAlertStore {
    pool: SqlitePool,
    database_path: PathBuf,
}

impl SqliteAlertStore {
    /// Open (or create) the database and its tables
    pub async fn new(database_path: PathBuf) -> Result<Self> {
        info!("Initializing alert database at: {:?}", database_path);

        // Ensure parent directory exists
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30)); // Wait 30s for locked DB

        let pool = SqlitePool::connect_with(connect_options).await?;

        let store = Self {
            pool,
            database_path,
        };
        store.initialize_database().await?;

        info!("Alert database initialized successfully");
        Ok(store)
    }

    pub fn database_path(&self) -> &PathBuf {
        &self.database_path
    }

    /// Create tables if missing (idempotent)
    async fn initialize_database(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                symbol TEXT PRIMARY KEY,
                last_zero_cross INTEGER NOT NULL DEFAULT 0,
                max_histogram REAL NOT NULL DEFAULT 0,
                alert_sent INTEGER NOT NULL DEFAULT 0,
                last_check INTEGER NOT NULL DEFAULT 0,
                volume_score INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alert_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                macd_distance REAL NOT NULL,
                max_histogram REAL NOT NULL,
                distance_ratio REAL NOT NULL DEFAULT 0,
                volume_ratio REAL NOT NULL,
                taker_buy_ratio REAL NOT NULL,
                volume_score INTEGER NOT NULL,
                direction TEXT,
                decision TEXT NOT NULL,
                narrative TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        self.migrate_history_columns().await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_alert_history_symbol_time ON alert_history(symbol, timestamp DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// `CREATE TABLE IF NOT EXISTS` leaves an existing table alone, so an
    /// older `alert_history` gets the missing columns added here
    async fn migrate_history_columns(&self) -> Result<()> {
        let existing: HashSet<String> = sqlx::query("PRAGMA table_info(alert_history)")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<std::result::Result<_, _>>()?;

        for (column, definition) in HISTORY_ADDED_COLUMNS {
            if existing.contains(*column) {
                continue;
            }
            info!("Adding missing column alert_history.{}", column);
            let statement = format!("ALTER TABLE alert_history ADD COLUMN {} {}", column, definition);
            sqlx::query(&statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Insert zeroed rows for symbols that have none yet
    pub async fn seed_symbols(&self, symbols: &[String]) -> Result<usize> {
        let mut transaction = self.pool.begin().await?;
        let mut inserted = 0;

        for symbol in symbols {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO alerts (symbol, last_zero_cross, max_histogram, alert_sent, last_check, volume_score) VALUES (?1, 0, 0.0, 0, 0, 0)",
            )
            .bind(symbol)
            .execute(&mut *transaction)
            .await?;
            inserted += result.rows_affected() as usize;
        }

        transaction.commit().await?;
        Ok(inserted)
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Alert database connection pool closed");
    }

    fn row_to_state(row: &sqlx::sqlite::SqliteRow) -> Result<SymbolAlertState> {
        Ok(SymbolAlertState {
            symbol: row.try_get("symbol")?,
            last_zero_cross_index: row.try_get("last_zero_cross")?,
            max_histogram: row.try_get("max_histogram")?,
            alert_sent: row.try_get::<i64, _>("alert_sent")? != 0,
            last_check_timestamp: row.try_get("last_check")?,
            volume_score: row.try_get("volume_score")?,
        })
    }

    fn row_to_history(row: &sqlx::sqlite::SqliteRow) -> Result<AlertHistoryRecord> {
        let ts: i64 = row.try_get("timestamp")?;
        let timestamp = Utc
            .timestamp_opt(ts, 0)
            .single()
            .ok_or_else(|| AppError::Database(format!("Invalid history timestamp: {}", ts)))?;

        Ok(AlertHistoryRecord {
            id: Some(row.try_get("id")?),
            symbol: row.try_get("symbol")?,
            timestamp,
            macd_distance: row.try_get("macd_distance")?,
            max_histogram: row.try_get("max_histogram")?,
            distance_ratio: row.try_get("distance_ratio")?,
            volume_ratio: row.try_get("volume_ratio")?,
            taker_buy_ratio: row.try_get("taker_buy_ratio")?,
            volume_score: row.try_get("volume_score")?,
            direction: row.try_get("direction")?,
            decision: row.try_get("decision")?,
            narrative: row.try_get("narrative")?,
        })
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn load_or_create_state(&self, symbol: &str) -> Result<SymbolAlertState> {
        sqlx::query(
            "INSERT OR IGNORE INTO alerts (symbol, last_zero_cross, max_histogram, alert_sent, last_check, volume_score) VALUES (?1, 0, 0.0, 0, 0, 0)",
        )
        .bind(symbol)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT symbol, last_zero_cross, max_histogram, alert_sent, last_check, volume_score FROM alerts WHERE symbol = ?1",
        )
        .bind(symbol)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_state(&row)
    }

    async fn compare_and_swap_state(
        &self,
        prev: &SymbolAlertState,
        next: &SymbolAlertState,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE alerts
            SET last_zero_cross = ?1, max_histogram = ?2, alert_sent = ?3, last_check = ?4, volume_score = ?5
            WHERE symbol = ?6 AND alert_sent = ?7 AND last_check = ?8
            "#,
        )
        .bind(next.last_zero_cross_index)
        .bind(next.max_histogram)
        .bind(next.alert_sent as i64)
        .bind(next.last_check_timestamp)
        .bind(next.volume_score)
        .bind(&prev.symbol)
        .bind(prev.alert_sent as i64)
        .bind(prev.last_check_timestamp)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn append_history(&self, record: &AlertHistoryRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO alert_history
            (symbol, timestamp, macd_distance, max_histogram, distance_ratio, volume_ratio,
             taker_buy_ratio, volume_score, direction, decision, narrative)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&record.symbol)
        .bind(record.timestamp.timestamp())
        .bind(record.macd_distance)
        .bind(record.max_histogram)
        .bind(record.distance_ratio)
        .bind(record.volume_ratio)
        .bind(record.taker_buy_ratio)
        .bind(record.volume_score)
        .bind(&record.direction)
        .bind(&record.decision)
        .bind(&record.narrative)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_states(&self) -> Result<Vec<SymbolAlertState>> {
        let rows = sqlx::query(
            "SELECT symbol, last_zero_cross, max_histogram, alert_sent, last_check, volume_score FROM alerts ORDER BY symbol",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_state).collect()
    }

    async fn recent_history(
        &self,
        symbol: Option<&str>,
        limit: i64,
    ) -> Result<Vec<AlertHistoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, symbol, timestamp, macd_distance, max_histogram, distance_ratio, volume_ratio,
                   taker_buy_ratio, volume_score, direction, decision, narrative
            FROM alert_history
            WHERE ?1 IS NULL OR symbol = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(symbol)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_history).collect()
    }
}
