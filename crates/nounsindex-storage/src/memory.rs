//! In-memory storage backend.
//!
//! Keeps records and checkpoints in RAM. Useful for tests and short-lived
//! indexers that don't need persistence.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use nounsindex_core::checkpoint::{Checkpoint, CheckpointStore};
use nounsindex_core::error::IndexerError;
use nounsindex_core::sink::{EventSink, RecordFilter};
use nounsindex_core::types::NormalizedEvent;

/// In-memory event sink and checkpoint store.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStorage {
    checkpoints: Mutex<HashMap<String, Checkpoint>>,
    events: Mutex<HashMap<String, Vec<NormalizedEvent>>>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, IndexerError> {
    m.lock()
        .map_err(|_| IndexerError::Storage("in-memory storage lock poisoned".into()))
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of events with at least one stored record.
    pub fn event_names(&self) -> Result<Vec<String>, IndexerError> {
        let mut names: Vec<String> = lock(&self.events)?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Total number of records across all events.
    pub fn total_records(&self) -> Result<usize, IndexerError> {
        Ok(lock(&self.events)?.values().map(Vec::len).sum())
    }
}

#[async_trait]
impl EventSink for InMemoryStorage {
    async fn append(&self, event_name: &str, records: &[NormalizedEvent]) -> Result<(), IndexerError> {
        lock(&self.events)?
            .entry(event_name.to_string())
            .or_default()
            .extend_from_slice(records);
        Ok(())
    }

    async fn query(
        &self,
        event_name: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<NormalizedEvent>, IndexerError> {
        Ok(lock(&self.events)?
            .get(event_name)
            .map(|records| records.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, event_name: &str) -> Result<usize, IndexerError> {
        Ok(lock(&self.events)?.get(event_name).map_or(0, Vec::len))
    }
}

#[async_trait]
impl CheckpointStore for InMemoryStorage {
    async fn get(&self, event_name: &str) -> Result<Option<Checkpoint>, IndexerError> {
        Ok(lock(&self.checkpoints)?.get(event_name).cloned())
    }

    async fn set(&self, checkpoint: Checkpoint) -> Result<(), IndexerError> {
        lock(&self.checkpoints)?.insert(checkpoint.event_name.clone(), checkpoint);
        Ok(())
    }

    async fn delete(&self, event_name: &str) -> Result<(), IndexerError> {
        lock(&self.checkpoints)?.remove(event_name);
        Ok(())
    }
}
