//! Data contract events: proposal candidates, sponsor signatures and feedback.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCandidateCreated {
    pub msg_sender: String,
    pub targets: Vec<String>,
    pub values: Vec<String>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<String>,
    pub description: String,
    pub slug: String,
    /// `0` when the candidate is not an update to an existing proposal.
    pub proposal_id_to_update: u64,
    pub encoded_proposal_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCandidateUpdated {
    pub msg_sender: String,
    pub targets: Vec<String>,
    pub values: Vec<String>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<String>,
    pub description: String,
    pub slug: String,
    pub proposal_id_to_update: u64,
    pub encoded_proposal_hash: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCandidateCanceled {
    pub msg_sender: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureAdded {
    pub signer: String,
    pub sig: String,
    pub expiration_timestamp: u64,
    pub proposer: String,
    pub slug: String,
    pub proposal_id_to_update: u64,
    pub encoded_prop_hash: String,
    pub sig_digest: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSent {
    pub msg_sender: String,
    pub proposal_id: u64,
    pub support: u8,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFeedbackSent {
    pub msg_sender: String,
    pub proposer: String,
    pub slug: String,
    pub support: u8,
    pub reason: String,
}
