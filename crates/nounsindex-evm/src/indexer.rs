//! The orchestrator: `index`, `update`, `listen` and their `*_all` variants.
//!
//! # index
//! Backfill from the event's genesis block to the confirmed head, append,
//! then checkpoint the head.
//!
//! # update
//! Resume from `checkpoint + 1` (or genesis) to the confirmed head. The
//! checkpoint is advanced only after the sink has accepted the records.
//!
//! # listen
//! Subscribe to the event's current signature and append each log as it
//! arrives. No checkpoint interaction.
//!
//! Callers must not run two operations on the same event concurrently.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;

use nounsindex_core::checkpoint::{CheckpointManager, CheckpointStore};
use nounsindex_core::error::IndexerError;
use nounsindex_core::indexer::IndexerConfig;
use nounsindex_core::sink::{EventSink, RecordFilter};
use nounsindex_core::types::NormalizedEvent;

use crate::fetcher::RawLog;
use crate::registry::EventRegistry;
use crate::rpc::{EvmRpcClient, LogSubscriber};
use crate::versioned::VersionedEventManager;

/// Result of one `index` or `update` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOutcome {
    pub event: String,
    pub from_block: u64,
    pub to_block: u64,
    /// Records appended by this call.
    pub records: usize,
}

/// Result of one `listen` call that ran until its stream ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenOutcome {
    pub event: String,
    pub records: usize,
}

/// Per-event results of an `*_all` call.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<(String, IndexerError)>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    /// Returns `true` if every event succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, event: &str, result: Result<T, IndexerError>) {
        match result {
            Ok(outcome) => self.succeeded.push(outcome),
            Err(e) => {
                tracing::error!(event, error = %e, "event failed, continuing with the next one");
                self.failed.push((event.to_string(), e));
            }
        }
    }
}

/// Drives the read → append → checkpoint cycle for every registered event.
pub struct Indexer {
    config: IndexerConfig,
    client: Arc<dyn EvmRpcClient>,
    manager: VersionedEventManager,
    sink: Arc<dyn EventSink>,
    checkpoints: CheckpointManager,
    subscriber: Arc<dyn LogSubscriber>,
}

impl Indexer {
    pub fn new(
        config: IndexerConfig,
        client: Arc<dyn EvmRpcClient>,
        registry: Arc<EventRegistry>,
        sink: Arc<dyn EventSink>,
        checkpoints: Arc<dyn CheckpointStore>,
        subscriber: Arc<dyn LogSubscriber>,
    ) -> Result<Self, IndexerError> {
        config.validate()?;
        let manager = VersionedEventManager::new(registry, client.clone(), config.batch_size);
        Ok(Self {
            config,
            client,
            manager,
            sink,
            checkpoints: CheckpointManager::new(checkpoints),
            subscriber,
        })
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn registry(&self) -> &EventRegistry {
        self.manager.registry()
    }

    /// Supported event names in catalogue order.
    pub fn supported_events(&self) -> Vec<String> {
        self.registry().events().map(str::to_string).collect()
    }

    pub fn supports(&self, event: &str) -> bool {
        self.registry().supports(event)
    }

    /// Last indexed block of `event`, if any.
    pub async fn checkpoint(&self, event: &str) -> Result<Option<u64>, IndexerError> {
        self.registry().get(event)?;
        self.checkpoints
            .recent_block(event)
            .await
            .map_err(|e| e.with_event(event))
    }

    async fn confirmed_head(&self) -> Result<u64, IndexerError> {
        let head = self.client.get_block_number().await?;
        Ok(head.saturating_sub(self.config.confirmation_depth))
    }

    /// Fetch `[start, end]`, append, and report. Does not checkpoint.
    async fn fetch_and_append(
        &self,
        event: &str,
        start: u64,
        end: u64,
    ) -> Result<IndexOutcome, IndexerError> {
        let records = self.manager.fetch_versioned(event, start, end).await?;
        if !records.is_empty() {
            self.sink.append(event, &records).await?;
        }
        Ok(IndexOutcome {
            event: event.to_string(),
            from_block: start,
            to_block: end,
            records: records.len(),
        })
    }

    /// Full backfill of `event` from its genesis block to the confirmed head.
    ///
    /// Running this on an event that is already indexed appends the whole
    /// history again; use [`update`](Self::update) afterwards.
    pub async fn index(&self, event: &str) -> Result<IndexOutcome, IndexerError> {
        self.run_index(event).await.map_err(|e| e.with_event(event))
    }

    /// Incremental update from the checkpoint (exclusive) to the confirmed head.
    ///
    /// Without a checkpoint this behaves like [`index`](Self::index). When
    /// there are no new blocks, no logs are queried and the checkpoint is
    /// left untouched.
    pub async fn update(&self, event: &str) -> Result<IndexOutcome, IndexerError> {
        self.run_update(event).await.map_err(|e| e.with_event(event))
    }

    /// Append live logs of `event` until the subscription ends.
    ///
    /// Stream and format errors end the call; nothing is retried.
    pub async fn listen(&self, event: &str) -> Result<ListenOutcome, IndexerError> {
        self.run_listen(event).await.map_err(|e| e.with_event(event))
    }

    async fn run_index(&self, event: &str) -> Result<IndexOutcome, IndexerError> {
        let genesis = self.registry().get(event)?.genesis_block();
        let existing = self.checkpoints.recent_block(event).await?;
        if let Some(block) = existing {
            tracing::warn!(event, checkpoint = block, "index on an already indexed event duplicates records");
        }

        let end = self.confirmed_head().await?;
        if genesis > end {
            tracing::info!(event, genesis, head = end, "chain has not reached genesis block");
            return Ok(IndexOutcome {
                event: event.to_string(),
                from_block: genesis,
                to_block: end,
                records: 0,
            });
        }

        tracing::info!(event, from = genesis, to = end, chain = %self.config.chain, "index started");
        let outcome = self.fetch_and_append(event, genesis, end).await?;
        if existing.map_or(true, |block| block < end) {
            self.checkpoints.advance(event, end).await?;
        }
        tracing::info!(event, records = outcome.records, to = end, "index complete");
        Ok(outcome)
    }

    async fn run_update(&self, event: &str) -> Result<IndexOutcome, IndexerError> {
        let genesis = self.registry().get(event)?.genesis_block();
        let start = self.checkpoints.resume_from(event, genesis).await?;
        let end = self.confirmed_head().await?;

        if start > end {
            tracing::debug!(event, from = start, head = end, "already up to date");
            return Ok(IndexOutcome {
                event: event.to_string(),
                from_block: start,
                to_block: end,
                records: 0,
            });
        }

        let outcome = self.fetch_and_append(event, start, end).await?;
        self.checkpoints.advance(event, end).await?;
        tracing::info!(event, from = start, to = end, records = outcome.records, "update complete");
        Ok(outcome)
    }

    async fn run_listen(&self, event: &str) -> Result<ListenOutcome, IndexerError> {
        let entry = self.registry().get(event)?;
        let (window, signature) = entry.current();
        let formatter = self.registry().formatter(entry.family())?;
        let filter = self.manager.pipeline(event)?.fetcher().filter(signature);

        let mut stream = self.subscriber.subscribe(filter).await?;
        tracing::info!(event, version = window.version, "listening");

        let mut records = 0;
        while let Some(item) = stream.next().await {
            let log = item?;
            if log.is_removed() {
                continue;
            }
            let raw = RawLog::decode(signature, &log)?;
            let record = formatter.format(event, window.version, &raw)?;
            tracing::debug!(event, block = record.block_number(), "live event");
            self.sink.append(event, std::slice::from_ref(&record)).await?;
            records += 1;
        }

        tracing::info!(event, records, "subscription ended");
        Ok(ListenOutcome {
            event: event.to_string(),
            records,
        })
    }

    /// [`index`](Self::index) every supported event, one at a time.
    pub async fn index_all(&self) -> BatchOutcome<IndexOutcome> {
        let mut batch = BatchOutcome::default();
        for event in self.supported_events() {
            batch.record(&event, self.index(&event).await);
        }
        batch
    }

    /// [`update`](Self::update) every supported event, one at a time.
    pub async fn update_all(&self) -> BatchOutcome<IndexOutcome> {
        let mut batch = BatchOutcome::default();
        for event in self.supported_events() {
            batch.record(&event, self.update(&event).await);
        }
        batch
    }

    /// [`listen`](Self::listen) to every supported event on the current task.
    pub async fn listen_all(&self) -> BatchOutcome<ListenOutcome> {
        let events = self.supported_events();
        let results = futures::future::join_all(events.iter().map(|e| self.listen(e))).await;

        let mut batch = BatchOutcome::default();
        for (event, result) in events.iter().zip(results) {
            batch.record(event, result);
        }
        batch
    }

    /// Forget the checkpoint of `event` so the next update starts at genesis.
    pub async fn reset(&self, event: &str) -> Result<(), IndexerError> {
        self.registry().get(event)?;
        self.checkpoints
            .reset(event)
            .await
            .map_err(|e| e.with_event(event))?;
        tracing::info!(event, "checkpoint reset");
        Ok(())
    }

    /// Persisted records of `event` matching `filter`.
    pub async fn query(
        &self,
        event: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<NormalizedEvent>, IndexerError> {
        self.registry().get(event)?;
        self.sink
            .query(event, filter)
            .await
            .map_err(|e| e.with_event(event))
    }
}
