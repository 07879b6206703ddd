//! nounsindex-storage: event sinks and checkpoint stores for NounsIndex.
//!
//! Every backend implements both [`EventSink`](nounsindex_core::sink::EventSink)
//! and [`CheckpointStore`](nounsindex_core::checkpoint::CheckpointStore), so
//! one value can be handed to `IndexerBuilder::storage`.
//!
//! Backends:
//! - [`memory`] - in-memory (dev/testing, no persistence)
//! - [`json_file`] - one JSON document per event type (feature `json-file`, default)
//! - [`sqlite`] - SQLite via `sqlx` (feature `sqlite`)

pub mod memory;

#[cfg(feature = "json-file")]
pub mod json_file;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryStorage;

#[cfg(feature = "json-file")]
pub use json_file::JsonFileStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

#[cfg(test)]
pub(crate) mod testing {
    use nounsindex_core::events::{token::Transfer, EventPayload};
    use nounsindex_core::types::{EventEnvelope, NormalizedEvent};

    /// A `Transfer` record at `(block, log_index)` with a unique tx hash.
    pub fn record(block: u64, log_index: u64) -> NormalizedEvent {
        NormalizedEvent::new(
            EventEnvelope {
                block_number: block,
                block_hash: format!("0x{block:064x}"),
                transaction_hash: format!("0x{:064x}", (block << 16) | log_index),
                log_index: Some(log_index),
            },
            EventPayload::from(Transfer {
                from: "0x0000000000000000000000000000000000000000".into(),
                to: "0x00000000000000000000000000000000000000aB".into(),
                token_id: block,
            }),
        )
    }
}
