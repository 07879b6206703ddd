//! Indexer configuration.

use serde::{Deserialize, Serialize};

use crate::events::ContractFamily;

/// Default number of blocks per `eth_getLogs` chunk.
pub const DEFAULT_BLOCK_BATCH_SIZE: u64 = 2_000;

/// Deployed contract addresses, one per family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub auction_house: String,
    pub dao_logic: String,
    pub token: String,
    pub data: String,
}

impl ContractAddresses {
    /// Ethereum mainnet proxies.
    pub fn mainnet() -> Self {
        Self {
            auction_house: "0x830BD73E4184ceF73443C15111a1DF14e495C706".into(),
            dao_logic: "0x6f3E6272A167e8AcCb32072d08E0957F9c79223d".into(),
            token: "0x9C8fF314C9Bc7F6e59A9d9225Fb22946427eDC03".into(),
            data: "0xf790A5f59678dd733fb3De93493A91f472ca1365".into(),
        }
    }

    /// Address of the contract emitting events of `family`.
    pub fn for_family(&self, family: ContractFamily) -> &str {
        match family {
            ContractFamily::AuctionHouse => &self.auction_house,
            ContractFamily::DaoLogic => &self.dao_logic,
            ContractFamily::Token => &self.token,
            ContractFamily::Data => &self.data,
        }
    }
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Configuration for an indexer instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerConfig {
    /// Chain slug, used only in logs (e.g. `"ethereum"`).
    #[serde(default = "default_chain")]
    pub chain: String,
    /// Blocks per `eth_getLogs` call. A chunk starting at `b` covers
    /// `[b, b + batch_size]`.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Blocks to stay behind the head. `0` indexes up to the head itself.
    #[serde(default)]
    pub confirmation_depth: u64,
    /// Head polling interval for live listening (milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub contracts: ContractAddresses,
}

fn default_chain() -> String {
    "ethereum".into()
}

fn default_batch_size() -> u64 {
    DEFAULT_BLOCK_BATCH_SIZE
}

fn default_poll_interval_ms() -> u64 {
    12_000
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chain: default_chain(),
            batch_size: DEFAULT_BLOCK_BATCH_SIZE,
            confirmation_depth: 0,
            poll_interval_ms: default_poll_interval_ms(),
            contracts: ContractAddresses::mainnet(),
        }
    }
}

impl IndexerConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), crate::error::IndexerError> {
        if self.batch_size == 0 {
            return Err(crate::error::IndexerError::Config(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(crate::error::IndexerError::Config(
                "poll_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
