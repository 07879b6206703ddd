//! nounsindex-evm: chunked log fetching, signature-versioned event
//! formatting and the indexer orchestrator.

pub mod abi;
pub mod builder;
pub mod fetcher;
pub mod formatter;
pub mod http;
pub mod indexer;
pub mod pipeline;
pub mod registry;
pub mod rpc;
pub mod subscriber;
pub mod versioned;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use abi::{DecodeError, DecodedArgs, EventSignature};
pub use builder::IndexerBuilder;
pub use fetcher::{chunk_ranges, RangeEventFetcher, RawLog};
pub use formatter::{EventDef, EventFormatter};
pub use http::HttpRpcClient;
pub use indexer::{BatchOutcome, IndexOutcome, Indexer, ListenOutcome};
pub use pipeline::FetchAndFormat;
pub use registry::{EventRegistry, RegisteredEvent};
pub use rpc::{EvmRpcClient, LogStream, LogSubscriber, RpcLog};
pub use subscriber::PollingSubscriber;
pub use versioned::VersionedEventManager;
