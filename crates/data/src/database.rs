use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use llm_trade_core::{ExitRecord, LogLevel, TradeError, TradeRecord, TradeStore};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::rows::{ExitRow, LogRow, TradeRow};

/// `SQLite` trade store.
///
/// Holds entries, exits, the operational log and ratcheted trailing stops.
/// Each write is one statement or one short transaction, so concurrent
/// pipeline and monitor runs serialize on the database lock.
#[derive(Clone)]
pub struct TradeDatabase {
    pool: SqlitePool,
}

impl TradeDatabase {
    /// Opens (creating if missing) the database and runs migrations.
    ///
    /// # Arguments
    ///
    /// * `database_url` - `SQLite` URL (e.g., `sqlite://trading.db`)
    /// * `max_connections` - Pool size
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid, connection fails or migrations fail.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open trade database at {database_url}"))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run trade database migrations")?;

        info!(url = %database_url, "Trade database ready");
        Ok(Self { pool })
    }

    /// Creates an in-memory database for tests and dry runs.
    ///
    /// A single connection is used because every `sqlite::memory:`
    /// connection is a separate database.
    ///
    /// # Errors
    ///
    /// Returns error if connection or migrations fail.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Trades without a recorded exit, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails or a row is malformed.
    pub async fn open_trades(&self) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            r"
            SELECT t.id, t.symbol, t.quantity, t.entry_price, t.target_price,
                   t.stop_loss, t.order_id, t.timestamp
            FROM trades t
            WHERE NOT EXISTS (
                SELECT 1 FROM exits e WHERE e.entry_order_id = t.order_id
            )
            ORDER BY t.id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TradeRow::into_record).collect()
    }

    /// All recorded exits, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails or a row is malformed.
    pub async fn all_exits(&self) -> Result<Vec<ExitRecord>> {
        let rows = sqlx::query_as::<_, ExitRow>(
            r"
            SELECT id, symbol, quantity, price, reason, order_id, entry_order_id, timestamp
            FROM exits
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExitRow::into_record).collect()
    }

    /// Most recent log lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn recent_logs(&self, limit: i64) -> Result<Vec<LogRow>> {
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT id, level, message, timestamp FROM logs ORDER BY id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn fetch_trades(&self) -> Result<Vec<TradeRecord>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            r"
            SELECT id, symbol, quantity, entry_price, target_price, stop_loss, order_id, timestamp
            FROM trades
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TradeRow::into_record).collect()
    }

    async fn fetch_latest_trade(&self, symbol: &str) -> Result<Option<TradeRecord>> {
        let row = sqlx::query_as::<_, TradeRow>(
            r"
            SELECT id, symbol, quantity, entry_price, target_price, stop_loss, order_id, timestamp
            FROM trades
            WHERE symbol = ?1
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TradeRow::into_record).transpose()
    }
}

fn storage_err(e: impl std::fmt::Display) -> TradeError {
    TradeError::storage(e)
}

#[async_trait]
impl TradeStore for TradeDatabase {
    async fn insert_trade(&self, trade: &TradeRecord) -> llm_trade_core::Result<i64> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let result = sqlx::query(
            r"
            INSERT INTO trades (symbol, quantity, entry_price, target_price, stop_loss, order_id, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(&trade.symbol)
        .bind(i64::from(trade.quantity))
        .bind(trade.entry.to_string())
        .bind(trade.target.to_string())
        .bind(trade.stop.to_string())
        .bind(&trade.order_id)
        .bind(trade.executed_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        let stale = sqlx::query("DELETE FROM trailing_stops WHERE symbol = ?1 AND entry_order_id <> ?2")
            .bind(&trade.symbol)
            .bind(&trade.order_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        if stale.rows_affected() > 0 {
            debug!(symbol = %trade.symbol, rows = stale.rows_affected(), "Dropped stale trailing stops");
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn all_trades(&self) -> llm_trade_core::Result<Vec<TradeRecord>> {
        self.fetch_trades().await.map_err(storage_err)
    }

    async fn latest_trade(&self, symbol: &str) -> llm_trade_core::Result<Option<TradeRecord>> {
        self.fetch_latest_trade(symbol).await.map_err(storage_err)
    }

    async fn insert_exit(&self, exit: &ExitRecord) -> llm_trade_core::Result<i64> {
        let result = sqlx::query(
            r"
            INSERT INTO exits (symbol, quantity, price, reason, order_id, entry_order_id, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(&exit.symbol)
        .bind(i64::from(exit.quantity))
        .bind(exit.price.to_string())
        .bind(exit.reason.as_str())
        .bind(&exit.order_id)
        .bind(exit.entry_order_id.as_deref())
        .bind(exit.exited_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(result.last_insert_rowid())
    }

    async fn log(&self, level: LogLevel, message: &str) -> llm_trade_core::Result<()> {
        sqlx::query("INSERT INTO logs (level, message, timestamp) VALUES (?1, ?2, ?3)")
            .bind(level.as_str())
            .bind(message)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }

    async fn trailing_stop(&self, entry_order_id: &str) -> llm_trade_core::Result<Option<Decimal>> {
        let row =
            sqlx::query_as::<_, (String,)>("SELECT stop_price FROM trailing_stops WHERE entry_order_id = ?1")
                .bind(entry_order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;

        row.map(|(raw,)| Decimal::from_str(&raw).map_err(storage_err))
            .transpose()
    }

    async fn save_trailing_stop(&self, entry_order_id: &str, symbol: &str, stop: Decimal) -> llm_trade_core::Result<()> {
        sqlx::query(
            r"
            INSERT INTO trailing_stops (entry_order_id, symbol, stop_price, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(entry_order_id) DO UPDATE SET
                stop_price = excluded.stop_price,
                updated_at = excluded.updated_at
            ",
        )
        .bind(entry_order_id)
        .bind(symbol)
        .bind(stop.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn clear_trailing_stop(&self, entry_order_id: &str) -> llm_trade_core::Result<()> {
        sqlx::query("DELETE FROM trailing_stops WHERE entry_order_id = ?1")
            .bind(entry_order_id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_trade_core::ExitReason;
    use rust_decimal_macros::dec;

    fn trade(symbol: &str, order_id: &str) -> TradeRecord {
        TradeRecord {
            symbol: symbol.to_string(),
            quantity: 25,
            entry: dec!(201),
            target: dec!(206),
            stop: dec!(198),
            order_id: order_id.to_string(),
            executed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_trades() {
        let db = TradeDatabase::in_memory().await.unwrap();

        let first = db.insert_trade(&trade("RELIANCE.NS", "A1")).await.unwrap();
        let second = db.insert_trade(&trade("TCS.NS", "A2")).await.unwrap();
        assert!(second > first);

        let trades = db.all_trades().await.unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].symbol, "RELIANCE.NS");
        assert_eq!(trades[0].entry, dec!(201));
        assert_eq!(trades[1].order_id, "A2");
    }

    #[tokio::test]
    async fn test_latest_trade_per_symbol() {
        let db = TradeDatabase::in_memory().await.unwrap();
        db.insert_trade(&trade("INFY.NS", "OLD")).await.unwrap();
        db.insert_trade(&trade("INFY.NS", "NEW")).await.unwrap();

        let latest = db.latest_trade("INFY.NS").await.unwrap().unwrap();
        assert_eq!(latest.order_id, "NEW");
        assert!(db.latest_trade("TCS.NS").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exit_closes_trade() {
        let db = TradeDatabase::in_memory().await.unwrap();
        db.insert_trade(&trade("RELIANCE.NS", "A1")).await.unwrap();
        db.insert_trade(&trade("TCS.NS", "A2")).await.unwrap();

        db.insert_exit(&ExitRecord {
            symbol: "RELIANCE.NS".to_string(),
            quantity: 25,
            price: dec!(206),
            reason: ExitReason::TargetReached,
            order_id: "S1".to_string(),
            entry_order_id: Some("A1".to_string()),
            exited_at: Utc::now(),
        })
        .await
        .unwrap();

        let open = db.open_trades().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].symbol, "TCS.NS");

        let exits = db.all_exits().await.unwrap();
        assert_eq!(exits[0].reason, ExitReason::TargetReached);
    }

    #[tokio::test]
    async fn test_trailing_stop_upsert_and_clear() {
        let db = TradeDatabase::in_memory().await.unwrap();
        assert!(db.trailing_stop("A1").await.unwrap().is_none());

        db.save_trailing_stop("A1", "TCS.NS", dec!(99.699)).await.unwrap();
        db.save_trailing_stop("A1", "TCS.NS", dec!(100.5)).await.unwrap();
        assert_eq!(db.trailing_stop("A1").await.unwrap(), Some(dec!(100.5)));
        assert!(db.trailing_stop("A2").await.unwrap().is_none());

        db.clear_trailing_stop("A1").await.unwrap();
        assert!(db.trailing_stop("A1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_trade_drops_stale_trailing_stop() {
        let db = TradeDatabase::in_memory().await.unwrap();
        db.save_trailing_stop("A1", "TCS.NS", dec!(99.699)).await.unwrap();
        db.save_trailing_stop("B1", "INFY.NS", dec!(1510)).await.unwrap();

        db.insert_trade(&trade("TCS.NS", "A2")).await.unwrap();

        assert!(db.trailing_stop("A1").await.unwrap().is_none());
        assert_eq!(db.trailing_stop("B1").await.unwrap(), Some(dec!(1510)));
    }

    #[tokio::test]
    async fn test_log_table() {
        let db = TradeDatabase::in_memory().await.unwrap();
        db.log(LogLevel::Warning, "No stock data fetched").await.unwrap();
        db.log(LogLevel::Info, "Trade Executed: {}").await.unwrap();

        let logs = db.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, "INFO");
        assert_eq!(logs[1].message, "No stock data fetched");
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("trading.db").display());

        let db = TradeDatabase::connect(&url, 2).await.unwrap();
        db.insert_trade(&trade("HDFCBANK.NS", "F1")).await.unwrap();
        assert_eq!(db.all_trades().await.unwrap().len(), 1);
    }
}
