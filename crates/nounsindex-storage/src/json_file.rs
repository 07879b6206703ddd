//! JSON document storage backend.
//!
//! One document per event type, `<Event>.json`, shaped `{"events": [...]}`,
//! plus a `checkpoints.json` array of `{eventName, recentBlock, updatedAt}`.
//! Every write replaces the whole document through a temp file and rename,
//! so readers never see a half-written file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use nounsindex_core::checkpoint::{Checkpoint, CheckpointStore};
use nounsindex_core::error::IndexerError;
use nounsindex_core::sink::{EventSink, RecordFilter};
use nounsindex_core::types::NormalizedEvent;

const CHECKPOINTS_FILE: &str = "checkpoints.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct EventDocument {
    events: Vec<NormalizedEvent>,
}

/// File-backed event sink and checkpoint store rooted at a directory.
pub struct JsonFileStorage {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

fn io_err(path: &Path, e: impl std::fmt::Display) -> IndexerError {
    IndexerError::Storage(format!("{}: {e}", path.display()))
}

impl JsonFileStorage {
    /// Open (creating if needed) a storage directory.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, IndexerError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_err(&dir, e))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document holding records for `event_name`.
    pub fn event_path(&self, event_name: &str) -> PathBuf {
        self.dir.join(format!("{event_name}.json"))
    }

    fn checkpoints_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINTS_FILE)
    }

    async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, IndexerError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| io_err(path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(io_err(path, e)),
        }
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IndexerError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| io_err(path, e))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| io_err(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| io_err(path, e))
    }

    async fn read_checkpoints(&self) -> Result<Vec<Checkpoint>, IndexerError> {
        Self::read_json(&self.checkpoints_path()).await
    }
}

// ─── EventSink ────────────────────────────────────────────────────────────────

#[async_trait]
impl EventSink for JsonFileStorage {
    async fn append(&self, event_name: &str, records: &[NormalizedEvent]) -> Result<(), IndexerError> {
        let _guard = self.write_lock.lock().await;
        let path = self.event_path(event_name);
        let mut doc: EventDocument = Self::read_json(&path).await?;
        doc.events.extend_from_slice(records);
        Self::write_json(&path, &doc).await?;
        debug!(event = event_name, appended = records.len(), total = doc.events.len(), "json document written");
        Ok(())
    }

    async fn query(
        &self,
        event_name: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<NormalizedEvent>, IndexerError> {
        let doc: EventDocument = Self::read_json(&self.event_path(event_name)).await?;
        Ok(doc.events.into_iter().filter(|r| filter.matches(r)).collect())
    }
}

// ─── CheckpointStore ──────────────────────────────────────────────────────────

#[async_trait]
impl CheckpointStore for JsonFileStorage {
    async fn get(&self, event_name: &str) -> Result<Option<Checkpoint>, IndexerError> {
        Ok(self
            .read_checkpoints()
            .await?
            .into_iter()
            .find(|cp| cp.event_name == event_name))
    }

    async fn set(&self, checkpoint: Checkpoint) -> Result<(), IndexerError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.read_checkpoints().await?;
        match all.iter_mut().find(|cp| cp.event_name == checkpoint.event_name) {
            Some(existing) => *existing = checkpoint,
            None => all.push(checkpoint),
        }
        Self::write_json(&self.checkpoints_path(), &all).await
    }

    async fn delete(&self, event_name: &str) -> Result<(), IndexerError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.read_checkpoints().await?;
        let before = all.len();
        all.retain(|cp| cp.event_name != event_name);
        if all.len() == before {
            return Ok(());
        }
        Self::write_json(&self.checkpoints_path(), &all).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[tokio::test]
    async fn missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStorage::open(dir.path()).await.unwrap();
        assert!(store.query("AuctionBid", &RecordFilter::all()).await.unwrap().is_empty());
        assert!(store.get("AuctionBid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_extends_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStorage::open(dir.path().join("nested")).await.unwrap();
        store.append("Transfer", &[record(10, 0), record(10, 1)]).await.unwrap();
        store.append("Transfer", &[record(11, 0)]).await.unwrap();

        let raw = std::fs::read_to_string(store.event_path("Transfer")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let events = doc["events"].as_array().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["kind"], "Transfer");
        assert_eq!(events[0]["event"]["blockNumber"], 10);
        assert_eq!(events[2]["tokenId"], 11);

        let hits = store.query("Transfer", &RecordFilter::all().from_block(11)).await.unwrap();
        assert_eq!(hits, vec![record(11, 0)]);
        assert!(!store.event_path("Transfer").with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn checkpoints_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStorage::open(dir.path()).await.unwrap();
            store.set(Checkpoint::new("Transfer", 100)).await.unwrap();
            store.set(Checkpoint::new("VoteCast", 50)).await.unwrap();
            store.set(Checkpoint::new("Transfer", 200)).await.unwrap();
        }
        let store = JsonFileStorage::open(dir.path()).await.unwrap();
        assert_eq!(store.get("Transfer").await.unwrap().unwrap().recent_block, 200);
        assert_eq!(store.get("VoteCast").await.unwrap().unwrap().recent_block, 50);

        let raw = std::fs::read_to_string(dir.path().join(CHECKPOINTS_FILE)).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc.as_array().unwrap().len(), 2);
        assert_eq!(doc[0]["eventName"], "Transfer");
        assert_eq!(doc[0]["recentBlock"], 200);

        store.delete("Transfer").await.unwrap();
        assert!(store.get("Transfer").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_document_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStorage::open(dir.path()).await.unwrap();
        std::fs::write(store.event_path("Transfer"), b"not json").unwrap();
        let err = store.query("Transfer", &RecordFilter::all()).await.unwrap_err();
        assert!(matches!(err, IndexerError::Storage(_)));
    }
}
