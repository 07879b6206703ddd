//! Checkpoints: the highest block already durably indexed per event.
//!
//! A checkpoint is written only after the records for a range have been
//! appended to the sink. A crash between the two leaves the checkpoint
//! lagging, so the next update re-fetches a range that was not yet
//! checkpointed instead of losing it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IndexerError;

/// A persisted checkpoint for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Logical event name (unique key).
    pub event_name: String,
    /// Last block whose events are durably persisted.
    pub recent_block: u64,
    /// Unix timestamp of when this checkpoint was saved.
    #[serde(default)]
    pub updated_at: i64,
}

impl Checkpoint {
    pub fn new(event_name: impl Into<String>, recent_block: u64) -> Self {
        Self {
            event_name: event_name.into(),
            recent_block,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Trait for storing and loading checkpoints.
///
/// Implementations include `MemoryCheckpointStore` and the backends in
/// `nounsindex-storage`.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint for an event.
    async fn get(&self, event_name: &str) -> Result<Option<Checkpoint>, IndexerError>;

    /// Save (upsert) a checkpoint.
    async fn set(&self, checkpoint: Checkpoint) -> Result<(), IndexerError>;

    /// Delete a checkpoint (e.g. before a deliberate re-index).
    async fn delete(&self, event_name: &str) -> Result<(), IndexerError>;
}

/// Checkpoint reads/writes on behalf of the orchestrator.
///
/// Enforces that a checkpoint never moves backwards.
pub struct CheckpointManager {
    store: std::sync::Arc<dyn CheckpointStore>,
}

impl CheckpointManager {
    pub fn new(store: std::sync::Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    /// The last indexed block for `event_name`, if any.
    pub async fn recent_block(&self, event_name: &str) -> Result<Option<u64>, IndexerError> {
        Ok(self.store.get(event_name).await?.map(|cp| cp.recent_block))
    }

    /// First block the next update should query: checkpoint + 1, or
    /// `genesis` when the event has never been indexed.
    pub async fn resume_from(&self, event_name: &str, genesis: u64) -> Result<u64, IndexerError> {
        Ok(match self.recent_block(event_name).await? {
            Some(block) => block.saturating_add(1).max(genesis),
            None => genesis,
        })
    }

    /// Move the checkpoint forward to `block`.
    ///
    /// Setting the current value again is a no-op; a smaller value is rejected.
    pub async fn advance(&self, event_name: &str, block: u64) -> Result<(), IndexerError> {
        if let Some(current) = self.recent_block(event_name).await? {
            if block < current {
                return Err(IndexerError::CheckpointRegression {
                    event: event_name.to_string(),
                    current,
                    attempted: block,
                });
            }
            if block == current {
                return Ok(());
            }
        }
        self.store.set(Checkpoint::new(event_name, block)).await?;
        tracing::debug!(event = event_name, block, "checkpoint advanced");
        Ok(())
    }

    /// Forget the checkpoint so the next update starts from genesis.
    pub async fn reset(&self, event_name: &str) -> Result<(), IndexerError> {
        self.store.delete(event_name).await
    }
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory checkpoint store for tests and ephemeral indexers.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    data: Mutex<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Checkpoint>>, IndexerError> {
        self.data
            .lock()
            .map_err(|_| IndexerError::Storage("checkpoint store lock poisoned".into()))
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, event_name: &str) -> Result<Option<Checkpoint>, IndexerError> {
        Ok(self.lock()?.get(event_name).cloned())
    }

    async fn set(&self, checkpoint: Checkpoint) -> Result<(), IndexerError> {
        self.lock()?.insert(checkpoint.event_name.clone(), checkpoint);
        Ok(())
    }

    async fn delete(&self, event_name: &str) -> Result<(), IndexerError> {
        self.lock()?.remove(event_name);
        Ok(())
    }
}
