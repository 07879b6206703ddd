//! Persistence sink: append-only storage of normalized events per event type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IndexerError;
use crate::types::NormalizedEvent;

/// Predicate over persisted records. All set bounds must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Lowest block number (inclusive).
    pub from_block: Option<u64>,
    /// Highest block number (inclusive).
    pub to_block: Option<u64>,
    /// Only records emitted by this transaction.
    pub transaction_hash: Option<String>,
}

impl RecordFilter {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records in `[from, to]`.
    pub fn blocks(from: u64, to: u64) -> Self {
        Self {
            from_block: Some(from),
            to_block: Some(to),
            ..Default::default()
        }
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = Some(block);
        self
    }

    pub fn to_block(mut self, block: u64) -> Self {
        self.to_block = Some(block);
        self
    }

    pub fn transaction(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    pub fn matches(&self, record: &NormalizedEvent) -> bool {
        let block = record.event.block_number;
        self.from_block.map_or(true, |from| block >= from)
            && self.to_block.map_or(true, |to| block <= to)
            && self
                .transaction_hash
                .as_deref()
                .map_or(true, |tx| record.event.transaction_hash.eq_ignore_ascii_case(tx))
    }
}

/// Append-only store of normalized records, one collection per event type.
///
/// `append` must preserve arrival order and must have completed durably
/// before it returns; the orchestrator advances the checkpoint only after.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Add `records` to the end of the `event_name` collection.
    async fn append(&self, event_name: &str, records: &[NormalizedEvent]) -> Result<(), IndexerError>;

    /// Records of `event_name` matching `filter`, in persisted order.
    async fn query(
        &self,
        event_name: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<NormalizedEvent>, IndexerError>;

    /// Number of records stored for `event_name`.
    async fn count(&self, event_name: &str) -> Result<usize, IndexerError> {
        Ok(self.query(event_name, &RecordFilter::all()).await?.len())
    }
}
