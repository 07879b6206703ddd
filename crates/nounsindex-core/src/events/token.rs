//! Nouns token (ERC-721 + delegation) events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub token_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateChanged {
    pub delegator: String,
    pub from_delegate: String,
    pub to_delegate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateVotesChanged {
    pub delegate: String,
    pub previous_balance: String,
    pub new_balance: String,
}

/// Trait indices drawn for a newly minted noun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NounSeed {
    pub background: u64,
    pub body: u64,
    pub accessory: u64,
    pub head: u64,
    pub glasses: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NounCreated {
    pub token_id: u64,
    pub seed: NounSeed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NounBurned {
    pub token_id: u64,
}
