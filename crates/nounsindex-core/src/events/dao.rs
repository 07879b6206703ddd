//! DAO logic (governor) events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCreated {
    pub id: u64,
    pub proposer: String,
    pub targets: Vec<String>,
    /// Wei sent with each call.
    pub values: Vec<String>,
    pub signatures: Vec<String>,
    /// `0x`-hex calldata per call.
    pub calldatas: Vec<String>,
    pub start_block: u64,
    pub end_block: u64,
    pub description: String,
}

/// One schema for all three on-chain encodings.
///
/// V1 carries the full proposal; V3 adds `signers` and
/// `updatePeriodEndBlock`; V4 drops the fields already emitted by
/// `ProposalCreated` and adds `clientId`. Fields a version does not emit
/// are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCreatedWithRequirements {
    pub id: u64,
    pub proposer: Option<String>,
    pub signers: Option<Vec<String>>,
    pub targets: Option<Vec<String>>,
    pub values: Option<Vec<String>>,
    pub signatures: Option<Vec<String>>,
    pub calldatas: Option<Vec<String>>,
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
    pub update_period_end_block: Option<u64>,
    pub proposal_threshold: u64,
    pub quorum_votes: u64,
    pub description: Option<String>,
    pub client_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCast {
    pub voter: String,
    pub proposal_id: u64,
    /// 0 = against, 1 = for, 2 = abstain.
    pub support: u8,
    pub votes: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCanceled {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalQueued {
    pub id: u64,
    /// Unix timestamp after which the proposal may execute.
    pub eta: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalExecuted {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalVetoed {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundableVote {
    pub voter: String,
    pub refund_amount: String,
    pub refund_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalUpdated {
    pub id: u64,
    pub proposer: String,
    pub targets: Vec<String>,
    pub values: Vec<String>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<String>,
    pub description: String,
    pub update_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalObjectionPeriodSet {
    pub id: u64,
    pub objection_period_end_block: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowedToFork {
    pub fork_id: u32,
    pub owner: String,
    pub token_ids: Vec<u64>,
    pub proposal_ids: Vec<u64>,
    pub reason: String,
}
