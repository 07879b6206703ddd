//! Range log fetcher.
//!
//! Splits `[start, end]` into inclusive chunks of `batch_size + 1` blocks and
//! issues one `eth_getLogs` per chunk, strictly in order.

use std::sync::Arc;

use nounsindex_core::error::IndexerError;
use nounsindex_core::types::{EventEnvelope, EventFilter};

use crate::abi::{DecodedArgs, EventSignature};
use crate::rpc::{EvmRpcClient, RpcLog};

/// A mined log with its arguments decoded against one event signature.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLog {
    pub address: String,
    pub block_number: u64,
    pub block_hash: String,
    pub transaction_hash: String,
    pub log_index: Option<u64>,
    pub args: DecodedArgs,
}

impl RawLog {
    /// Decode a wire log. Fails if the log is not mined or does not match `signature`.
    pub fn decode(signature: &EventSignature, log: &RpcLog) -> Result<Self, IndexerError> {
        let event = signature.name();
        let block_number = log
            .block_number_u64()
            .ok_or_else(|| IndexerError::format(event, "log has no blockNumber"))?;
        let block_hash = log
            .block_hash
            .clone()
            .ok_or_else(|| IndexerError::format(event, "log has no blockHash"))?;
        let transaction_hash = log
            .transaction_hash
            .clone()
            .ok_or_else(|| IndexerError::format(event, "log has no transactionHash"))?;
        let args = signature
            .decode(&log.topics, &log.data)
            .map_err(|e| IndexerError::format(event, e.to_string()))?;

        Ok(Self {
            address: log.address.clone(),
            block_number,
            block_hash,
            transaction_hash,
            log_index: log.log_index_u64(),
            args,
        })
    }

    pub fn envelope(&self) -> EventEnvelope {
        EventEnvelope {
            block_number: self.block_number,
            block_hash: self.block_hash.clone(),
            transaction_hash: self.transaction_hash.clone(),
            log_index: self.log_index,
        }
    }
}

/// Inclusive sub-ranges covering `[start, end]`.
///
/// A chunk starting at `cur` ends at `min(cur + batch_size, end)`; the next
/// starts at `cur + batch_size + 1`.
pub fn chunk_ranges(start: u64, end: u64, batch_size: u64) -> Vec<(u64, u64)> {
    let mut ranges = Vec::new();
    if start > end {
        return ranges;
    }
    let mut cur = start;
    loop {
        let to = cur.saturating_add(batch_size).min(end);
        ranges.push((cur, to));
        match to.checked_add(1) {
            Some(next) if to < end => cur = next,
            _ => break,
        }
    }
    ranges
}

/// Fetches every log for one event of one contract in a block range.
#[derive(Clone)]
pub struct RangeEventFetcher {
    client: Arc<dyn EvmRpcClient>,
    address: String,
    batch_size: u64,
}

impl RangeEventFetcher {
    pub fn new(client: Arc<dyn EvmRpcClient>, address: impl Into<String>, batch_size: u64) -> Self {
        Self {
            client,
            address: address.into(),
            batch_size,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn client(&self) -> &Arc<dyn EvmRpcClient> {
        &self.client
    }

    /// Provider filter for `signature` on this contract.
    pub fn filter(&self, signature: &EventSignature) -> EventFilter {
        EventFilter::address(self.address.clone()).topic0(signature.topic0_hex())
    }

    /// All logs of `signature` in `[start, end]`, in block order.
    ///
    /// A failure on any chunk aborts the call; logs from earlier chunks are
    /// discarded. Logs flagged `removed` are skipped.
    pub async fn fetch_events(
        &self,
        signature: &EventSignature,
        start: u64,
        end: u64,
    ) -> Result<Vec<RawLog>, IndexerError> {
        if start > end {
            return Err(IndexerError::InvalidRange { from: start, to: end });
        }
        let event = signature.name();
        let filter = self.filter(signature);

        let mut logs = Vec::new();
        for (from, to) in chunk_ranges(start, end, self.batch_size) {
            let chunk = self
                .client
                .get_logs(from, to, &filter)
                .await
                .map_err(|e| IndexerError::Fetch {
                    event: event.to_string(),
                    from,
                    to,
                    reason: e.to_string(),
                })?;
            tracing::debug!(event, from, to, logs = chunk.len(), "chunk fetched");

            for log in chunk.iter().filter(|log| !log.is_removed()) {
                logs.push(RawLog::decode(signature, log)?);
            }
        }
        Ok(logs)
    }
}
