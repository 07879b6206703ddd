//! Fetch-and-format: one fetcher bound to one formatter.

use std::sync::Arc;

use nounsindex_core::error::IndexerError;
use nounsindex_core::types::NormalizedEvent;

use crate::abi::EventSignature;
use crate::fetcher::RangeEventFetcher;
use crate::formatter::EventFormatter;

/// Fetches one event from one contract and formats every log.
#[derive(Clone)]
pub struct FetchAndFormat {
    fetcher: RangeEventFetcher,
    formatter: Arc<dyn EventFormatter>,
}

impl FetchAndFormat {
    pub fn new(fetcher: RangeEventFetcher, formatter: Arc<dyn EventFormatter>) -> Self {
        Self { fetcher, formatter }
    }

    pub fn fetcher(&self) -> &RangeEventFetcher {
        &self.fetcher
    }

    /// Fetch `signature` (version `version` of `event`) over `[start, end]`
    /// and format each log. Errors are logged and returned unchanged; no
    /// record is dropped silently.
    pub async fn fetch_and_format(
        &self,
        event: &str,
        signature: &EventSignature,
        version: u8,
        start: u64,
        end: u64,
    ) -> Result<Vec<NormalizedEvent>, IndexerError> {
        if !self.formatter.supports(event) {
            return Err(IndexerError::UnsupportedEvent(event.to_string()));
        }

        let logs = self
            .fetcher
            .fetch_events(signature, start, end)
            .await
            .map_err(|e| {
                tracing::error!(event, from = start, to = end, error = %e, "fetch failed");
                e
            })?;

        let records = logs
            .iter()
            .map(|log| self.formatter.format(event, version, log))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::error!(event, from = start, to = end, error = %e, "format failed");
                e
            })?;

        tracing::debug!(event, version, from = start, to = end, records = records.len(), "fetched and formatted");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{AuctionHouseFormatter, TokenFormatter};
    use crate::test_utils::{LogBuilder, MockRpcClient};
    use alloy_dyn_abi::DynSolValue;
    use alloy_primitives::U256;

    const EXTENDED: &str = "AuctionExtended(uint256 indexed nounId, uint256 endTime)";

    fn pipeline(client: Arc<MockRpcClient>) -> FetchAndFormat {
        FetchAndFormat::new(
            RangeEventFetcher::new(client, "0xauction", 100),
            Arc::new(AuctionHouseFormatter),
        )
    }

    #[tokio::test]
    async fn formats_every_fetched_log() {
        let client = Arc::new(MockRpcClient::new(1_000));
        for (noun, block) in [(1u64, 10u64), (2, 150), (3, 260)] {
            client.push_log(
                LogBuilder::new(EXTENDED)
                    .address("0xauction")
                    .block(block)
                    .topic(DynSolValue::Uint(U256::from(noun), 256))
                    .body(DynSolValue::Uint(U256::from(block * 12), 256))
                    .build(),
            );
        }
        let sig = EventSignature::parse(EXTENDED).unwrap();
        let records = pipeline(client)
            .fetch_and_format("AuctionExtended", &sig, 1, 0, 300)
            .await
            .unwrap();
        let blocks: Vec<u64> = records.iter().map(|r| r.block_number()).collect();
        assert_eq!(blocks, vec![10, 150, 260]);
        assert!(records.iter().all(|r| r.name() == "AuctionExtended"));
    }

    #[tokio::test]
    async fn malformed_log_fails_the_whole_range() {
        let client = Arc::new(MockRpcClient::new(1_000));
        let mut log = LogBuilder::new(EXTENDED)
            .address("0xauction")
            .block(5)
            .topic(DynSolValue::Uint(U256::from(1u64), 256))
            .body(DynSolValue::Uint(U256::from(1u64), 256))
            .build();
        log.data = "0x1234".into();
        client.push_log(log);

        let sig = EventSignature::parse(EXTENDED).unwrap();
        let err = pipeline(client)
            .fetch_and_format("AuctionExtended", &sig, 1, 0, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexerError::Format { .. }));
    }

    #[tokio::test]
    async fn event_of_another_family_is_unsupported() {
        let client = Arc::new(MockRpcClient::new(1_000));
        let ff = FetchAndFormat::new(
            RangeEventFetcher::new(client.clone(), "0xtoken", 100),
            Arc::new(TokenFormatter),
        );
        let sig = EventSignature::parse(EXTENDED).unwrap();
        let err = ff
            .fetch_and_format("AuctionExtended", &sig, 1, 0, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexerError::UnsupportedEvent(_)));
        assert!(client.log_queries().is_empty());
    }
}
