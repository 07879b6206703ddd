//! In-process provider doubles and a log builder for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use alloy_dyn_abi::DynSolValue;
use async_trait::async_trait;

use nounsindex_core::error::IndexerError;
use nounsindex_core::types::EventFilter;

use crate::abi::EventSignature;
use crate::rpc::{to_hex_quantity, EvmRpcClient, LogStream, LogSubscriber, RpcLog};

#[derive(Default)]
struct MockState {
    head: u64,
    logs: Vec<RpcLog>,
    queries: Vec<(u64, u64)>,
    fail_at: HashSet<u64>,
    fail_head: bool,
    head_calls: usize,
}

/// Chain double: serves stored logs through `eth_getLogs` semantics and
/// records every queried range.
pub struct MockRpcClient {
    state: Mutex<MockState>,
}

impl MockRpcClient {
    pub fn new(head: u64) -> Self {
        Self {
            state: Mutex::new(MockState {
                head,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    pub fn set_head(&self, head: u64) {
        self.state().head = head;
    }

    pub fn push_log(&self, log: RpcLog) {
        self.state().logs.push(log);
    }

    pub fn push_logs(&self, logs: impl IntoIterator<Item = RpcLog>) {
        self.state().logs.extend(logs);
    }

    /// Every `(from, to)` passed to `get_logs`, in call order.
    pub fn log_queries(&self) -> Vec<(u64, u64)> {
        self.state().queries.clone()
    }

    pub fn clear_queries(&self) {
        self.state().queries.clear();
    }

    /// Number of `get_block_number` calls.
    pub fn head_calls(&self) -> usize {
        self.state().head_calls
    }

    /// Make any `get_logs` call whose range contains `block` fail.
    pub fn fail_range_containing(&self, block: u64) {
        self.state().fail_at.insert(block);
    }

    /// Make `get_block_number` fail until failures are cleared.
    pub fn fail_head(&self) {
        self.state().fail_head = true;
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.fail_at.clear();
        state.fail_head = false;
    }
}

#[async_trait]
impl EvmRpcClient for MockRpcClient {
    async fn get_block_number(&self) -> Result<u64, IndexerError> {
        let mut state = self.state();
        state.head_calls += 1;
        if state.fail_head {
            return Err(IndexerError::Rpc("connection refused".into()));
        }
        Ok(state.head)
    }

    async fn get_logs(
        &self,
        from: u64,
        to: u64,
        filter: &EventFilter,
    ) -> Result<Vec<RpcLog>, IndexerError> {
        let mut state = self.state();
        state.queries.push((from, to));
        if state.fail_at.iter().any(|b| (from..=to).contains(b)) {
            return Err(IndexerError::Rpc(format!(
                "query returned more than 10000 results for {from}..={to}"
            )));
        }
        let mut logs: Vec<RpcLog> = state
            .logs
            .iter()
            .filter(|log| log_matches(log, from, to, filter))
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.block_number_u64(), log.log_index_u64()));
        Ok(logs)
    }
}

fn log_matches(log: &RpcLog, from: u64, to: u64, filter: &EventFilter) -> bool {
    let in_range = log
        .block_number_u64()
        .map_or(false, |b| b >= from && b <= to);
    let topic_ok = log
        .topics
        .first()
        .map_or(filter.topic0_values.is_empty(), |t| filter.matches_topic0(t));
    in_range && topic_ok && filter.matches_address(&log.address)
}

/// Subscriber that replays a fixed set of logs, filtered like the provider
/// would, then ends the stream.
#[derive(Default)]
pub struct VecSubscriber {
    logs: Mutex<Vec<RpcLog>>,
    fail_with: Mutex<Option<String>>,
}

impl VecSubscriber {
    pub fn new(logs: Vec<RpcLog>) -> Self {
        Self {
            logs: Mutex::new(logs),
            fail_with: Mutex::new(None),
        }
    }

    /// Append an error item after the matching logs.
    pub fn fail_after_logs(&self, reason: impl Into<String>) {
        *self.fail_with.lock().expect("subscriber poisoned") = Some(reason.into());
    }
}

#[async_trait]
impl LogSubscriber for VecSubscriber {
    async fn subscribe(&self, filter: EventFilter) -> Result<LogStream, IndexerError> {
        let mut items: Vec<Result<RpcLog, IndexerError>> = self
            .logs
            .lock()
            .expect("subscriber poisoned")
            .iter()
            .filter(|log| log_matches(log, 0, u64::MAX, &filter))
            .cloned()
            .map(Ok)
            .collect();
        if let Some(reason) = self.fail_with.lock().expect("subscriber poisoned").clone() {
            items.push(Err(IndexerError::Subscription(reason)));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Builds ABI-encoded wire logs for a human-readable event signature.
///
/// Indexed arguments are added with [`topic`](Self::topic) and body
/// arguments with [`body`](Self::body), each in declaration order.
pub struct LogBuilder {
    signature: EventSignature,
    address: String,
    block: u64,
    log_index: u64,
    tx_hash: Option<String>,
    topics: Vec<DynSolValue>,
    body: Vec<DynSolValue>,
}

impl LogBuilder {
    pub fn new(signature: &str) -> Self {
        Self {
            signature: EventSignature::parse(signature).expect("valid test signature"),
            address: format!("0x{}", "00".repeat(20)),
            block: 0,
            log_index: 0,
            tx_hash: None,
            topics: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn block(mut self, block: u64) -> Self {
        self.block = block;
        self
    }

    pub fn log_index(mut self, log_index: u64) -> Self {
        self.log_index = log_index;
        self
    }

    pub fn tx(mut self, hash: impl Into<String>) -> Self {
        self.tx_hash = Some(hash.into());
        self
    }

    pub fn topic(mut self, value: DynSolValue) -> Self {
        self.topics.push(value);
        self
    }

    pub fn body(mut self, value: DynSolValue) -> Self {
        self.body.push(value);
        self
    }

    pub fn build(self) -> RpcLog {
        let mut topics = vec![self.signature.topic0_hex()];
        topics.extend(
            self.topics
                .iter()
                .map(|v| format!("0x{}", hex::encode(v.abi_encode()))),
        );
        let data = if self.body.is_empty() {
            "0x".to_string()
        } else {
            format!("0x{}", hex::encode(DynSolValue::Tuple(self.body).abi_encode_params()))
        };
        let tx_hash = self
            .tx_hash
            .unwrap_or_else(|| format!("0x{:064x}", (self.block << 16) | self.log_index));

        RpcLog {
            address: self.address,
            topics,
            data,
            block_number: Some(to_hex_quantity(self.block)),
            block_hash: Some(format!("0x{:064x}", self.block)),
            transaction_hash: Some(tx_hash),
            log_index: Some(to_hex_quantity(self.log_index)),
            removed: Some(false),
        }
    }
}
