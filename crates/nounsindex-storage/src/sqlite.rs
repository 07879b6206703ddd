//! SQLite storage backend.
//!
//! Persists normalized records and checkpoints to a single SQLite file.
//! Uses `sqlx` with WAL mode for concurrent read performance.
//!
//! # Usage
//! ```rust,no_run
//! use nounsindex_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./nouns.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use nounsindex_core::checkpoint::{Checkpoint, CheckpointStore};
use nounsindex_core::error::IndexerError;
use nounsindex_core::sink::{EventSink, RecordFilter};
use nounsindex_core::types::NormalizedEvent;

/// SQLite-backed event sink and checkpoint store.
pub struct SqliteStorage {
    pool: SqlitePool,
}

fn storage_err(e: impl std::fmt::Display) -> IndexerError {
    IndexerError::Storage(e.to_string())
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./nouns.db"`) or a full
    /// SQLite URL (`"sqlite:./nouns.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, IndexerError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(storage_err)?;
        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open an in-memory SQLite database.
    ///
    /// The pool holds a single connection; each `:memory:` connection is a
    /// separate database. All data is lost when the pool is dropped.
    pub async fn in_memory() -> Result<Self, IndexerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(storage_err)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<(), IndexerError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                event_name   TEXT    NOT NULL,
                block_number INTEGER NOT NULL,
                log_index    INTEGER,
                tx_hash      TEXT    NOT NULL,
                record_json  TEXT    NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS checkpoints (
                event_name   TEXT    PRIMARY KEY,
                recent_block INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_name_block ON events (event_name, block_number);")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_tx ON events (tx_hash);")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }

    /// Names of events with at least one stored record.
    pub async fn event_names(&self) -> Result<Vec<String>, IndexerError> {
        let rows = sqlx::query("SELECT DISTINCT event_name FROM events ORDER BY event_name")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(rows.iter().map(|r| r.get::<String, _>("event_name")).collect())
    }
}

// ─── EventSink ────────────────────────────────────────────────────────────────

#[async_trait]
impl EventSink for SqliteStorage {
    async fn append(&self, event_name: &str, records: &[NormalizedEvent]) -> Result<(), IndexerError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        for record in records {
            let json = serde_json::to_string(record).map_err(storage_err)?;
            sqlx::query(
                "INSERT INTO events (event_name, block_number, log_index, tx_hash, record_json)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(event_name)
            .bind(record.event.block_number as i64)
            .bind(record.event.log_index.map(|i| i as i64))
            .bind(&record.event.transaction_hash)
            .bind(json)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }
        tx.commit().await.map_err(storage_err)?;
        debug!(event = event_name, count = records.len(), "records inserted");
        Ok(())
    }

    async fn query(
        &self,
        event_name: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<NormalizedEvent>, IndexerError> {
        let from = filter.from_block.map(|b| b as i64);
        let to = filter.to_block.map(|b| b as i64);
        let tx_hash = filter.transaction_hash.as_deref();

        let rows = sqlx::query(
            "SELECT record_json FROM events
             WHERE event_name = ?
               AND (? IS NULL OR block_number >= ?)
               AND (? IS NULL OR block_number <= ?)
               AND (? IS NULL OR lower(tx_hash) = lower(?))
             ORDER BY id ASC",
        )
        .bind(event_name)
        .bind(from)
        .bind(from)
        .bind(to)
        .bind(to)
        .bind(tx_hash)
        .bind(tx_hash)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                let json: String = row.get("record_json");
                serde_json::from_str(&json).map_err(storage_err)
            })
            .collect()
    }

    async fn count(&self, event_name: &str) -> Result<usize, IndexerError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM events WHERE event_name = ?")
            .bind(event_name)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(row.get::<i64, _>("n") as usize)
    }
}

// ─── CheckpointStore ──────────────────────────────────────────────────────────

#[async_trait]
impl CheckpointStore for SqliteStorage {
    async fn get(&self, event_name: &str) -> Result<Option<Checkpoint>, IndexerError> {
        let row = sqlx::query(
            "SELECT event_name, recent_block, updated_at FROM checkpoints WHERE event_name = ?",
        )
        .bind(event_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(|r| Checkpoint {
            event_name: r.get("event_name"),
            recent_block: r.get::<i64, _>("recent_block") as u64,
            updated_at: r.get("updated_at"),
        }))
    }

    async fn set(&self, checkpoint: Checkpoint) -> Result<(), IndexerError> {
        debug!(event = %checkpoint.event_name, block = checkpoint.recent_block, "saving checkpoint");
        sqlx::query(
            "INSERT OR REPLACE INTO checkpoints (event_name, recent_block, updated_at)
             VALUES (?, ?, ?)",
        )
        .bind(&checkpoint.event_name)
        .bind(checkpoint.recent_block as i64)
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn delete(&self, event_name: &str) -> Result<(), IndexerError> {
        sqlx::query("DELETE FROM checkpoints WHERE event_name = ?")
            .bind(event_name)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}
