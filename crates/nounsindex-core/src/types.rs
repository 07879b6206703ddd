//! Shared types for the indexing pipeline.

use serde::{Deserialize, Serialize};

use crate::events::EventPayload;

// ─── EventEnvelope ────────────────────────────────────────────────────────────

/// Where an event was emitted. Present on every normalized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// Block number.
    pub block_number: u64,
    /// Block hash (`0x…`).
    pub block_hash: String,
    /// Transaction hash (`0x…`).
    pub transaction_hash: String,
    /// Position of the log within its block, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
}

impl EventEnvelope {
    /// Ordering key: block number, then log index (missing sorts first).
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index.unwrap_or(0))
    }
}

// ─── NormalizedEvent ──────────────────────────────────────────────────────────

/// A formatted event: the common envelope plus event-specific fields.
///
/// Serializes flat, e.g.
/// `{"event": {...}, "kind": "AuctionBid", "nounId": 1, "value": "1000"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub event: EventEnvelope,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl NormalizedEvent {
    pub fn new(event: EventEnvelope, payload: EventPayload) -> Self {
        Self { event, payload }
    }

    /// Logical event name (e.g. `"AuctionBid"`).
    pub fn name(&self) -> &'static str {
        self.payload.name()
    }

    pub fn block_number(&self) -> u64 {
        self.event.block_number
    }
}

// ─── EventFilter ─────────────────────────────────────────────────────────────

/// Filter for a provider log query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Only match logs from these contract addresses (empty = all addresses).
    pub addresses: Vec<String>,
    /// Only match logs with this topic[0] value (empty = all events).
    pub topic0_values: Vec<String>,
}

impl EventFilter {
    /// Create a filter for a single contract address.
    pub fn address(addr: impl Into<String>) -> Self {
        Self {
            addresses: vec![addr.into()],
            ..Default::default()
        }
    }

    /// Add a topic0 filter (event signature hash).
    pub fn topic0(mut self, topic: impl Into<String>) -> Self {
        self.topic0_values.push(topic.into());
        self
    }

    /// Returns `true` if `address` matches this filter.
    pub fn matches_address(&self, address: &str) -> bool {
        self.addresses.is_empty()
            || self.addresses.iter().any(|a| a.eq_ignore_ascii_case(address))
    }

    /// Returns `true` if `topic0` matches this filter.
    pub fn matches_topic0(&self, topic0: &str) -> bool {
        self.topic0_values.is_empty()
            || self.topic0_values.iter().any(|t| t.eq_ignore_ascii_case(topic0))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
