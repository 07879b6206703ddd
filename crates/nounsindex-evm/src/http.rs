//! HTTP JSON-RPC provider backed by `reqwest`.
//!
//! Issues `eth_blockNumber` and `eth_getLogs`. Failed requests are returned
//! to the caller as-is; retry policy belongs to whoever drives the indexer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use nounsindex_core::error::IndexerError;
use nounsindex_core::types::EventFilter;

use crate::rpc::{parse_hex_u64, to_hex_quantity, EvmRpcClient, RpcLog};

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// HTTP JSON-RPC client for a single endpoint.
pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a client for `url` with the given per-request timeout.
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, IndexerError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| IndexerError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create with a 30 second request timeout.
    pub fn default_for(url: impl Into<String>) -> Result<Self, IndexerError> {
        Self::new(url, Duration::from_secs(30))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, IndexerError> {
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| IndexerError::Rpc(format!("{method}: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IndexerError::Rpc(format!("{method}: HTTP {status}: {body}")));
        }

        let body: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| IndexerError::Rpc(format!("{method}: invalid response: {e}")))?;

        if let Some(err) = body.error {
            return Err(IndexerError::Rpc(format!(
                "{method}: JSON-RPC error {}: {}",
                err.code, err.message
            )));
        }
        body.result
            .ok_or_else(|| IndexerError::Rpc(format!("{method}: response has no result")))
    }
}

/// `eth_getLogs` filter object for `[from, to]`.
pub fn logs_params(from: u64, to: u64, filter: &EventFilter) -> Value {
    let mut params = json!({
        "fromBlock": to_hex_quantity(from),
        "toBlock": to_hex_quantity(to),
    });
    match filter.addresses.len() {
        0 => {}
        1 => params["address"] = json!(filter.addresses[0]),
        _ => params["address"] = json!(filter.addresses),
    }
    if !filter.topic0_values.is_empty() {
        params["topics"] = json!([filter.topic0_values]);
    }
    params
}

#[async_trait]
impl EvmRpcClient for HttpRpcClient {
    async fn get_block_number(&self) -> Result<u64, IndexerError> {
        let result = self.call("eth_blockNumber", vec![]).await?;
        result
            .as_str()
            .and_then(parse_hex_u64)
            .ok_or_else(|| IndexerError::Rpc(format!("eth_blockNumber: unexpected result {result}")))
    }

    async fn get_logs(
        &self,
        from: u64,
        to: u64,
        filter: &EventFilter,
    ) -> Result<Vec<RpcLog>, IndexerError> {
        let result = self
            .call("eth_getLogs", vec![logs_params(from, to, filter)])
            .await?;
        let logs: Vec<RpcLog> = serde_json::from_value(result)
            .map_err(|e| IndexerError::Rpc(format!("eth_getLogs: malformed logs: {e}")))?;
        tracing::trace!(from, to, count = logs.len(), url = %self.url, "eth_getLogs");
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_params_single_address_and_topic() {
        let filter = EventFilter::address("0xabc").topic0("0x01");
        let params = logs_params(16, 31, &filter);
        assert_eq!(params["fromBlock"], "0x10");
        assert_eq!(params["toBlock"], "0x1f");
        assert_eq!(params["address"], "0xabc");
        assert_eq!(params["topics"], json!([["0x01"]]));
    }

    #[test]
    fn logs_params_without_filter() {
        let params = logs_params(1, 1, &EventFilter::default());
        assert!(params.get("address").is_none());
        assert!(params.get("topics").is_none());
    }

    #[test]
    fn request_serializes_as_jsonrpc_2() {
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "eth_blockNumber",
            params: vec![],
            id: 7,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": 7}));
    }

    #[test]
    fn client_builds() {
        let client = HttpRpcClient::default_for("http://localhost:8545").unwrap();
        assert_eq!(client.url(), "http://localhost:8545");
    }
}
