//! Fluent builder for [`Indexer`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nounsindex_evm::{HttpRpcClient, IndexerBuilder};
//! # use nounsindex_core::sink::EventSink;
//! # fn sink() -> Arc<dyn EventSink> { unimplemented!() }
//!
//! # fn main() -> Result<(), nounsindex_core::IndexerError> {
//! let indexer = IndexerBuilder::new()
//!     .chain("ethereum")
//!     .batch_size(2_000)
//!     .confirmation_depth(12)
//!     .client(Arc::new(HttpRpcClient::default_for("http://localhost:8545")?))
//!     .sink(sink())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use nounsindex_core::checkpoint::{CheckpointStore, MemoryCheckpointStore};
use nounsindex_core::error::IndexerError;
use nounsindex_core::indexer::{ContractAddresses, IndexerConfig};
use nounsindex_core::sink::EventSink;

use crate::indexer::Indexer;
use crate::registry::EventRegistry;
use crate::rpc::{EvmRpcClient, LogSubscriber};
use crate::subscriber::PollingSubscriber;

/// Fluent builder for [`Indexer`].
///
/// A client and a sink are required. Checkpoints default to an in-memory
/// store, the subscriber to polling the client, and the registry to every
/// Nouns family at the configured addresses.
#[derive(Default)]
pub struct IndexerBuilder {
    config: IndexerConfig,
    client: Option<Arc<dyn EvmRpcClient>>,
    sink: Option<Arc<dyn EventSink>>,
    checkpoints: Option<Arc<dyn CheckpointStore>>,
    subscriber: Option<Arc<dyn LogSubscriber>>,
    registry: Option<Arc<EventRegistry>>,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the chain name used in logs.
    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.config.chain = chain.into();
        self
    }

    /// Set the number of blocks per `eth_getLogs` chunk.
    pub fn batch_size(mut self, size: u64) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set confirmation depth (blocks behind head before indexing).
    pub fn confirmation_depth(mut self, depth: u64) -> Self {
        self.config.confirmation_depth = depth;
        self
    }

    /// Set live polling interval in milliseconds.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn contracts(mut self, contracts: ContractAddresses) -> Self {
        self.config.contracts = contracts;
        self
    }

    pub fn client(mut self, client: Arc<dyn EvmRpcClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn checkpoint_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = Some(store);
        self
    }

    /// Use one backend for both records and checkpoints.
    pub fn storage<S>(self, storage: Arc<S>) -> Self
    where
        S: EventSink + CheckpointStore + 'static,
    {
        self.sink(storage.clone()).checkpoint_store(storage)
    }

    pub fn subscriber(mut self, subscriber: Arc<dyn LogSubscriber>) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    pub fn registry(mut self, registry: Arc<EventRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The configuration as built so far.
    pub fn build_config(&self) -> IndexerConfig {
        self.config.clone()
    }

    pub fn build(self) -> Result<Indexer, IndexerError> {
        let client = self
            .client
            .ok_or_else(|| IndexerError::Config("no RPC client configured".into()))?;
        let sink = self
            .sink
            .ok_or_else(|| IndexerError::Config("no event sink configured".into()))?;
        let checkpoints: Arc<dyn CheckpointStore> = match self.checkpoints {
            Some(store) => store,
            None => Arc::new(MemoryCheckpointStore::new()),
        };
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(EventRegistry::with_contracts(self.config.contracts.clone())?),
        };
        let subscriber: Arc<dyn LogSubscriber> = match self.subscriber {
            Some(subscriber) => subscriber,
            None => Arc::new(
                PollingSubscriber::new(
                    client.clone(),
                    Duration::from_millis(self.config.poll_interval_ms),
                )
                .with_confirmation_depth(self.config.confirmation_depth),
            ),
        };

        Indexer::new(self.config, client, registry, sink, checkpoints, subscriber)
    }
}
