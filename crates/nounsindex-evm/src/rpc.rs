//! Provider abstraction: the two JSON-RPC calls the indexer needs, plus a
//! push-style log subscription for live listening.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use nounsindex_core::error::IndexerError;
use nounsindex_core::types::EventFilter;

/// A log as returned by `eth_getLogs` (hex-encoded quantities).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: Option<String>,
    #[serde(rename = "blockHash")]
    pub block_hash: Option<String>,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: Option<String>,
    #[serde(rename = "logIndex", default)]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: Option<bool>,
}

impl RpcLog {
    /// Block number, if the log is mined.
    pub fn block_number_u64(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(parse_hex_u64)
    }

    /// Log index within the block, if reported.
    pub fn log_index_u64(&self) -> Option<u64> {
        self.log_index.as_deref().and_then(parse_hex_u64)
    }

    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }
}

/// Trait for querying an EVM JSON-RPC provider.
///
/// Range bounds are inclusive on both ends.
#[async_trait]
pub trait EvmRpcClient: Send + Sync {
    async fn get_block_number(&self) -> Result<u64, IndexerError>;

    async fn get_logs(
        &self,
        from: u64,
        to: u64,
        filter: &EventFilter,
    ) -> Result<Vec<RpcLog>, IndexerError>;
}

/// A stream of live logs.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<RpcLog, IndexerError>> + Send>>;

/// Push-based source of new logs matching a filter.
#[async_trait]
pub trait LogSubscriber: Send + Sync {
    /// Start streaming logs emitted from now on.
    async fn subscribe(&self, filter: EventFilter) -> Result<LogStream, IndexerError>;
}

/// Parse a hex-encoded quantity (with or without `0x`) to u64.
pub fn parse_hex_u64(s: &str) -> Option<u64> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).ok()
}

/// Encode a u64 as a JSON-RPC quantity (`0x`-prefixed, no leading zeros).
pub fn to_hex_quantity(n: u64) -> String {
    format!("{n:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_u64_basic() {
        assert_eq!(parse_hex_u64("0x1"), Some(1));
        assert_eq!(parse_hex_u64("0xff"), Some(255));
        assert_eq!(parse_hex_u64("1234"), Some(0x1234));
        assert_eq!(parse_hex_u64("0xzz"), None);
    }

    #[test]
    fn hex_quantity_has_no_padding() {
        assert_eq!(to_hex_quantity(0), "0x0");
        assert_eq!(to_hex_quantity(13_072_753), "0xc77971");
    }

    #[test]
    fn rpc_log_deserializes_wire_format() {
        let log: RpcLog = serde_json::from_value(serde_json::json!({
            "address": "0x830bd73e4184cef73443c15111a1df14e495c706",
            "topics": ["0x01"],
            "data": "0x",
            "blockNumber": "0xc77971",
            "blockHash": "0xaa",
            "transactionHash": "0xbb",
            "logIndex": "0x5",
            "removed": false
        }))
        .unwrap();
        assert_eq!(log.block_number_u64(), Some(13_072_753));
        assert_eq!(log.log_index_u64(), Some(5));
        assert!(!log.is_removed());
    }

    #[test]
    fn pending_log_has_no_block() {
        let log: RpcLog = serde_json::from_value(serde_json::json!({
            "address": "0x0",
            "topics": [],
            "data": "0x",
            "blockNumber": null,
            "blockHash": null,
            "transactionHash": null
        }))
        .unwrap();
        assert_eq!(log.block_number_u64(), None);
        assert_eq!(log.log_index_u64(), None);
    }
}
