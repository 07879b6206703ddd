//! Signature-versioned fetching.
//!
//! A caller asks for a logical event over `[start, end]` and gets a single
//! chronologically ordered series, however many on-chain encodings the
//! range spans.

use std::sync::Arc;

use nounsindex_core::error::IndexerError;
use nounsindex_core::types::NormalizedEvent;

use crate::fetcher::RangeEventFetcher;
use crate::pipeline::FetchAndFormat;
use crate::registry::EventRegistry;
use crate::rpc::EvmRpcClient;

/// Routes a logical event to the signature windows that intersect a range.
#[derive(Clone)]
pub struct VersionedEventManager {
    registry: Arc<EventRegistry>,
    client: Arc<dyn EvmRpcClient>,
    batch_size: u64,
}

impl VersionedEventManager {
    pub fn new(registry: Arc<EventRegistry>, client: Arc<dyn EvmRpcClient>, batch_size: u64) -> Self {
        Self {
            registry,
            client,
            batch_size,
        }
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Fetch-and-format pipeline for `event` on its family's contract.
    pub fn pipeline(&self, event: &str) -> Result<FetchAndFormat, IndexerError> {
        let family = self.registry.get(event)?.family();
        let fetcher = RangeEventFetcher::new(
            self.client.clone(),
            self.registry.address(family),
            self.batch_size,
        );
        Ok(FetchAndFormat::new(fetcher, self.registry.formatter(family)?))
    }

    /// All records of `event` in `[start, end]`, in block order.
    ///
    /// Each window whose range intersects the request is fetched with its
    /// own signature over the clamped sub-range; windows outside the request
    /// issue no query. Any failure discards results from earlier windows.
    pub async fn fetch_versioned(
        &self,
        event: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<NormalizedEvent>, IndexerError> {
        if start > end {
            return Err(IndexerError::InvalidRange { from: start, to: end });
        }
        let entry = self.registry.get(event)?;
        let pipeline = self.pipeline(event)?;

        let slices = entry.table().plan(start, end);
        if slices.len() < entry.table().windows().len() {
            tracing::trace!(
                event,
                from = start,
                to = end,
                skipped = entry.table().windows().len() - slices.len(),
                "windows outside range skipped"
            );
        }

        let mut records = Vec::new();
        for slice in slices {
            let signature = entry.signature(slice.window).ok_or_else(|| IndexerError::InvalidWindows {
                event: event.to_string(),
                reason: format!("no parsed signature for v{}", slice.window.version),
            })?;
            tracing::debug!(
                event,
                version = slice.window.version,
                from = slice.from,
                to = slice.to,
                "fetching window"
            );
            let batch = pipeline
                .fetch_and_format(event, signature, slice.window.version, slice.from, slice.to)
                .await?;
            records.extend(batch);
        }
        Ok(records)
    }
}
