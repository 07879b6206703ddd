//! nounsindex-core: data model and contracts for the historical event indexer.
//!
//! # Architecture
//!
//! ```text
//! Indexer (nounsindex-evm)
//!   ├── EventRegistry        (event name → family, WindowTable)
//!   ├── VersionedEventManager / FetchAndFormat
//!   │     ├── RangeEventFetcher (chunked eth_getLogs)
//!   │     └── EventFormatter    (raw log → NormalizedEvent)
//!   ├── EventSink            (append-only records per event)
//!   └── CheckpointManager    (last indexed block per event)
//! ```

pub mod checkpoint;
pub mod error;
pub mod events;
pub mod indexer;
pub mod logging;
pub mod sink;
pub mod types;
pub mod window;

pub use checkpoint::{Checkpoint, CheckpointManager, CheckpointStore, MemoryCheckpointStore};
pub use error::IndexerError;
pub use events::{ContractFamily, EventPayload};
pub use indexer::{ContractAddresses, IndexerConfig, DEFAULT_BLOCK_BATCH_SIZE};
pub use logging::{init_tracing, LogConfig};
pub use sink::{EventSink, RecordFilter};
pub use types::{EventEnvelope, EventFilter, NormalizedEvent};
pub use window::{SignatureWindow, WindowDef, WindowSlice, WindowTable};
