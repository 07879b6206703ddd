//! Data contract formatter (proposal candidates, signatures, feedback).

use nounsindex_core::error::IndexerError;
use nounsindex_core::events::data::*;
use nounsindex_core::events::{ContractFamily, EventPayload};
use nounsindex_core::types::NormalizedEvent;
use nounsindex_core::window::WindowDef;

use super::{finish, EventDef, EventFormatter, DAO_V3_UPGRADE_BLOCK};
use crate::abi::{DecodeError, DecodedArgs};
use crate::fetcher::RawLog;

const V3: u64 = DAO_V3_UPGRADE_BLOCK;

static CATALOGUE: &[EventDef] = &[
    EventDef::new(
        "ProposalCandidateCreated",
        &[WindowDef::new(
            3,
            V3,
            "ProposalCandidateCreated(address indexed msgSender, address[] targets, uint256[] values, \
             string[] signatures, bytes[] calldatas, string description, string slug, \
             uint256 proposalIdToUpdate, bytes32 encodedProposalHash)",
        )],
    ),
    EventDef::new(
        "ProposalCandidateUpdated",
        &[WindowDef::new(
            3,
            V3,
            "ProposalCandidateUpdated(address indexed msgSender, address[] targets, uint256[] values, \
             string[] signatures, bytes[] calldatas, string description, string slug, \
             uint256 proposalIdToUpdate, bytes32 encodedProposalHash, string reason)",
        )],
    ),
    EventDef::new(
        "ProposalCandidateCanceled",
        &[WindowDef::new(
            3,
            V3,
            "ProposalCandidateCanceled(address indexed msgSender, string slug)",
        )],
    ),
    EventDef::new(
        "SignatureAdded",
        &[WindowDef::new(
            3,
            V3,
            "SignatureAdded(address indexed signer, bytes sig, uint256 expirationTimestamp, \
             address proposer, string slug, uint256 proposalIdToUpdate, bytes32 encodedPropHash, \
             bytes32 sigDigest, string reason)",
        )],
    ),
    EventDef::new(
        "FeedbackSent",
        &[WindowDef::new(
            3,
            V3,
            "FeedbackSent(address indexed msgSender, uint256 proposalId, uint8 support, string reason)",
        )],
    ),
    EventDef::new(
        "CandidateFeedbackSent",
        &[WindowDef::new(
            3,
            V3,
            "CandidateFeedbackSent(address indexed msgSender, address indexed proposer, string slug, \
             uint8 support, string reason)",
        )],
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DataFormatter;

fn candidate_created(a: &DecodedArgs) -> Result<ProposalCandidateCreated, DecodeError> {
    Ok(ProposalCandidateCreated {
        msg_sender: a.address("msgSender")?,
        targets: a.addresses("targets")?,
        values: a.decimals("values")?,
        signatures: a.strings("signatures")?,
        calldatas: a.bytes_list("calldatas")?,
        description: a.string("description")?,
        slug: a.string("slug")?,
        proposal_id_to_update: a.u64("proposalIdToUpdate")?,
        encoded_proposal_hash: a.bytes("encodedProposalHash")?,
    })
}

impl DataFormatter {
    fn payload(event: &str, a: &DecodedArgs) -> Result<Option<EventPayload>, DecodeError> {
        let payload: EventPayload = match event {
            "ProposalCandidateCreated" => candidate_created(a)?.into(),
            "ProposalCandidateUpdated" => {
                let c = candidate_created(a)?;
                ProposalCandidateUpdated {
                    msg_sender: c.msg_sender,
                    targets: c.targets,
                    values: c.values,
                    signatures: c.signatures,
                    calldatas: c.calldatas,
                    description: c.description,
                    slug: c.slug,
                    proposal_id_to_update: c.proposal_id_to_update,
                    encoded_proposal_hash: c.encoded_proposal_hash,
                    reason: a.string("reason")?,
                }
                .into()
            }
            "ProposalCandidateCanceled" => ProposalCandidateCanceled {
                msg_sender: a.address("msgSender")?,
                slug: a.string("slug")?,
            }
            .into(),
            "SignatureAdded" => SignatureAdded {
                signer: a.address("signer")?,
                sig: a.bytes("sig")?,
                expiration_timestamp: a.u64("expirationTimestamp")?,
                proposer: a.address("proposer")?,
                slug: a.string("slug")?,
                proposal_id_to_update: a.u64("proposalIdToUpdate")?,
                encoded_prop_hash: a.bytes("encodedPropHash")?,
                sig_digest: a.bytes("sigDigest")?,
                reason: a.string("reason")?,
            }
            .into(),
            "FeedbackSent" => FeedbackSent {
                msg_sender: a.address("msgSender")?,
                proposal_id: a.u64("proposalId")?,
                support: a.u8("support")?,
                reason: a.string("reason")?,
            }
            .into(),
            "CandidateFeedbackSent" => CandidateFeedbackSent {
                msg_sender: a.address("msgSender")?,
                proposer: a.address("proposer")?,
                slug: a.string("slug")?,
                support: a.u8("support")?,
                reason: a.string("reason")?,
            }
            .into(),
            _ => return Ok(None),
        };
        Ok(Some(payload))
    }
}

impl EventFormatter for DataFormatter {
    fn family(&self) -> ContractFamily {
        ContractFamily::Data
    }

    fn catalogue(&self) -> &'static [EventDef] {
        CATALOGUE
    }

    fn format(&self, event: &str, _version: u8, log: &RawLog) -> Result<NormalizedEvent, IndexerError> {
        finish(event, log, Self::payload(event, &log.args))
    }
}
