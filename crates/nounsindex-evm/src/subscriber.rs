//! Live log subscription by polling the chain head.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use nounsindex_core::error::IndexerError;
use nounsindex_core::types::EventFilter;

use crate::rpc::{EvmRpcClient, LogStream, LogSubscriber, RpcLog};

/// Turns any [`EvmRpcClient`] into a [`LogSubscriber`].
///
/// Polls `eth_blockNumber` every `poll_interval`; when the (confirmed) head
/// moves, fetches logs for the new blocks and yields them in order.
pub struct PollingSubscriber {
    client: Arc<dyn EvmRpcClient>,
    poll_interval: Duration,
    confirmation_depth: u64,
}

impl PollingSubscriber {
    pub fn new(client: Arc<dyn EvmRpcClient>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            confirmation_depth: 0,
        }
    }

    /// Only yield logs this many blocks behind the head.
    pub fn with_confirmation_depth(mut self, depth: u64) -> Self {
        self.confirmation_depth = depth;
        self
    }
}

struct PollState {
    client: Arc<dyn EvmRpcClient>,
    filter: EventFilter,
    next_block: u64,
    pending: VecDeque<RpcLog>,
    poll_interval: Duration,
    confirmation_depth: u64,
}

impl PollState {
    async fn next_item(&mut self) -> Result<RpcLog, IndexerError> {
        loop {
            if let Some(log) = self.pending.pop_front() {
                return Ok(log);
            }
            let head = self.client.get_block_number().await?;
            let safe = head.saturating_sub(self.confirmation_depth);
            if safe >= self.next_block {
                let logs = self.client.get_logs(self.next_block, safe, &self.filter).await?;
                tracing::trace!(from = self.next_block, to = safe, logs = logs.len(), "polled new blocks");
                self.pending.extend(logs.into_iter().filter(|log| !log.is_removed()));
                self.next_block = safe + 1;
                continue;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl LogSubscriber for PollingSubscriber {
    async fn subscribe(&self, filter: EventFilter) -> Result<LogStream, IndexerError> {
        let head = self
            .client
            .get_block_number()
            .await
            .map_err(|e| IndexerError::Subscription(format!("cannot read head: {e}")))?;
        let state = PollState {
            client: self.client.clone(),
            filter,
            next_block: head.saturating_sub(self.confirmation_depth) + 1,
            pending: VecDeque::new(),
            poll_interval: self.poll_interval,
            confirmation_depth: self.confirmation_depth,
        };
        tracing::debug!(from = state.next_block, "polling subscription started");

        let stream = futures::stream::unfold(state, |mut state| async move {
            let item = state.next_item().await;
            Some((item, state))
        });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{LogBuilder, MockRpcClient};
    use futures::StreamExt;

    const BURNED: &str = "NounBurned(uint256 indexed tokenId)";

    fn burned(block: u64) -> RpcLog {
        LogBuilder::new(BURNED)
            .address("0xtoken")
            .block(block)
            .topic(alloy_dyn_abi::DynSolValue::Uint(
                alloy_primitives::U256::from(block),
                256,
            ))
            .build()
    }

    #[tokio::test]
    async fn yields_only_logs_after_subscription() {
        let client = Arc::new(MockRpcClient::new(100));
        client.push_log(burned(100));
        let sub = PollingSubscriber::new(client.clone(), Duration::from_millis(1));
        let mut stream = sub.subscribe(EventFilter::address("0xtoken")).await.unwrap();

        client.push_log(burned(101));
        client.push_log(burned(102));
        client.set_head(102);

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.block_number_u64(), Some(101));
        assert_eq!(second.block_number_u64(), Some(102));
        assert_eq!(client.log_queries(), vec![(101, 102)]);
    }

    #[tokio::test]
    async fn confirmation_depth_holds_back_recent_blocks() {
        let client = Arc::new(MockRpcClient::new(100));
        let sub = PollingSubscriber::new(client.clone(), Duration::from_millis(1))
            .with_confirmation_depth(2);
        let mut stream = sub.subscribe(EventFilter::default()).await.unwrap();

        client.push_log(burned(99));
        client.set_head(101);
        let log = stream.next().await.unwrap().unwrap();
        assert_eq!(log.block_number_u64(), Some(99));
        assert_eq!(client.log_queries(), vec![(99, 99)]);
    }

    #[tokio::test]
    async fn provider_error_is_yielded() {
        let client = Arc::new(MockRpcClient::new(10));
        let sub = PollingSubscriber::new(client.clone(), Duration::from_millis(1));
        let mut stream = sub.subscribe(EventFilter::default()).await.unwrap();
        client.fail_range_containing(11);
        client.set_head(11);
        assert!(stream.next().await.unwrap().is_err());
    }
}
