//! DAO logic formatter.

use nounsindex_core::error::IndexerError;
use nounsindex_core::events::dao::*;
use nounsindex_core::events::{ContractFamily, EventPayload};
use nounsindex_core::types::NormalizedEvent;
use nounsindex_core::window::WindowDef;

use super::{
    finish, EventDef, EventFormatter, DAO_V3_UPGRADE_BLOCK, DAO_V4_UPGRADE_BLOCK, NOUNS_GENESIS_BLOCK,
};
use crate::abi::{DecodeError, DecodedArgs};
use crate::fetcher::RawLog;

const G: u64 = NOUNS_GENESIS_BLOCK;
const V3: u64 = DAO_V3_UPGRADE_BLOCK;
const V4: u64 = DAO_V4_UPGRADE_BLOCK;

static CATALOGUE: &[EventDef] = &[
    EventDef::new(
        "ProposalCreated",
        &[WindowDef::new(
            1,
            G,
            "ProposalCreated(uint256 id, address proposer, address[] targets, uint256[] values, \
             string[] signatures, bytes[] calldatas, uint256 startBlock, uint256 endBlock, \
             string description)",
        )],
    ),
    EventDef::new(
        "ProposalCreatedWithRequirements",
        &[
            WindowDef::new(
                1,
                G,
                "ProposalCreatedWithRequirements(uint256 id, address proposer, address[] targets, \
                 uint256[] values, string[] signatures, bytes[] calldatas, uint256 startBlock, \
                 uint256 endBlock, uint256 proposalThreshold, uint256 quorumVotes, string description)",
            ),
            WindowDef::new(
                3,
                V3,
                "ProposalCreatedWithRequirements(uint256 id, address proposer, address[] signers, \
                 address[] targets, uint256[] values, string[] signatures, bytes[] calldatas, \
                 uint256 startBlock, uint256 endBlock, uint256 updatePeriodEndBlock, \
                 uint256 proposalThreshold, uint256 quorumVotes, string description)",
            ),
            WindowDef::new(
                4,
                V4,
                "ProposalCreatedWithRequirements(uint256 id, address[] signers, \
                 uint256 updatePeriodEndBlock, uint256 proposalThreshold, uint256 quorumVotes, \
                 uint32 indexed clientId)",
            ),
        ],
    ),
    EventDef::new(
        "VoteCast",
        &[WindowDef::new(
            1,
            G,
            "VoteCast(address indexed voter, uint256 proposalId, uint8 support, uint256 votes, string reason)",
        )],
    ),
    EventDef::new("ProposalCanceled", &[WindowDef::new(1, G, "ProposalCanceled(uint256 id)")]),
    EventDef::new(
        "ProposalQueued",
        &[WindowDef::new(1, G, "ProposalQueued(uint256 id, uint256 eta)")],
    ),
    EventDef::new("ProposalExecuted", &[WindowDef::new(1, G, "ProposalExecuted(uint256 id)")]),
    EventDef::new("ProposalVetoed", &[WindowDef::new(1, G, "ProposalVetoed(uint256 id)")]),
    EventDef::new(
        "RefundableVote",
        &[WindowDef::new(
            1,
            G,
            "RefundableVote(address indexed voter, uint256 refundAmount, bool refundSent)",
        )],
    ),
    EventDef::new(
        "ProposalUpdated",
        &[WindowDef::new(
            3,
            V3,
            "ProposalUpdated(uint256 indexed id, address indexed proposer, address[] targets, \
             uint256[] values, string[] signatures, bytes[] calldatas, string description, \
             string updateMessage)",
        )],
    ),
    EventDef::new(
        "ProposalObjectionPeriodSet",
        &[WindowDef::new(
            3,
            V3,
            "ProposalObjectionPeriodSet(uint256 indexed id, uint256 objectionPeriodEndBlock)",
        )],
    ),
    EventDef::new(
        "EscrowedToFork",
        &[WindowDef::new(
            3,
            V3,
            "EscrowedToFork(uint32 indexed forkId, address indexed owner, uint256[] tokenIds, \
             uint256[] proposalIds, string reason)",
        )],
    ),
];

/// Formats DAO logic (governor) events.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaoLogicFormatter;

impl DaoLogicFormatter {
    fn payload(event: &str, version: u8, a: &DecodedArgs) -> Result<Option<EventPayload>, DecodeError> {
        let payload: EventPayload = match event {
            "ProposalCreated" => ProposalCreated {
                id: a.u64("id")?,
                proposer: a.address("proposer")?,
                targets: a.addresses("targets")?,
                values: a.decimals("values")?,
                signatures: a.strings("signatures")?,
                calldatas: a.bytes_list("calldatas")?,
                start_block: a.u64("startBlock")?,
                end_block: a.u64("endBlock")?,
                description: a.string("description")?,
            }
            .into(),
            "ProposalCreatedWithRequirements" => with_requirements(version, a)?.into(),
            "VoteCast" => VoteCast {
                voter: a.address("voter")?,
                proposal_id: a.u64("proposalId")?,
                support: a.u8("support")?,
                votes: a.decimal("votes")?,
                reason: a.string("reason")?,
            }
            .into(),
            "ProposalCanceled" => ProposalCanceled { id: a.u64("id")? }.into(),
            "ProposalQueued" => ProposalQueued {
                id: a.u64("id")?,
                eta: a.u64("eta")?,
            }
            .into(),
            "ProposalExecuted" => ProposalExecuted { id: a.u64("id")? }.into(),
            "ProposalVetoed" => ProposalVetoed { id: a.u64("id")? }.into(),
            "RefundableVote" => RefundableVote {
                voter: a.address("voter")?,
                refund_amount: a.decimal("refundAmount")?,
                refund_sent: a.boolean("refundSent")?,
            }
            .into(),
            "ProposalUpdated" => ProposalUpdated {
                id: a.u64("id")?,
                proposer: a.address("proposer")?,
                targets: a.addresses("targets")?,
                values: a.decimals("values")?,
                signatures: a.strings("signatures")?,
                calldatas: a.bytes_list("calldatas")?,
                description: a.string("description")?,
                update_message: a.string("updateMessage")?,
            }
            .into(),
            "ProposalObjectionPeriodSet" => ProposalObjectionPeriodSet {
                id: a.u64("id")?,
                objection_period_end_block: a.u64("objectionPeriodEndBlock")?,
            }
            .into(),
            "EscrowedToFork" => EscrowedToFork {
                fork_id: a.u32("forkId")?,
                owner: a.address("owner")?,
                token_ids: a.u64s("tokenIds")?,
                proposal_ids: a.u64s("proposalIds")?,
                reason: a.string("reason")?,
            }
            .into(),
            _ => return Ok(None),
        };
        Ok(Some(payload))
    }
}

/// V1 emits the full proposal, V3 adds signers and the update period, V4
/// keeps only the requirements and the client id.
fn with_requirements(
    version: u8,
    a: &DecodedArgs,
) -> Result<ProposalCreatedWithRequirements, DecodeError> {
    let mut p = ProposalCreatedWithRequirements {
        id: a.u64("id")?,
        proposal_threshold: a.u64("proposalThreshold")?,
        quorum_votes: a.u64("quorumVotes")?,
        ..Default::default()
    };
    if version >= 3 {
        p.signers = Some(a.addresses("signers")?);
        p.update_period_end_block = Some(a.u64("updatePeriodEndBlock")?);
    }
    if version >= 4 {
        p.client_id = Some(a.u32("clientId")?);
    } else {
        p.proposer = Some(a.address("proposer")?);
        p.targets = Some(a.addresses("targets")?);
        p.values = Some(a.decimals("values")?);
        p.signatures = Some(a.strings("signatures")?);
        p.calldatas = Some(a.bytes_list("calldatas")?);
        p.start_block = Some(a.u64("startBlock")?);
        p.end_block = Some(a.u64("endBlock")?);
        p.description = Some(a.string("description")?);
    }
    Ok(p)
}

impl EventFormatter for DaoLogicFormatter {
    fn family(&self) -> ContractFamily {
        ContractFamily::DaoLogic
    }

    fn catalogue(&self) -> &'static [EventDef] {
        CATALOGUE
    }

    fn format(&self, event: &str, version: u8, log: &RawLog) -> Result<NormalizedEvent, IndexerError> {
        finish(event, log, Self::payload(event, version, &log.args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::testing::{decoded, signature};
    use crate::test_utils::LogBuilder;
    use alloy_dyn_abi::DynSolValue;
    use alloy_primitives::{Address, U256};

    fn uint(v: u64) -> DynSolValue {
        DynSolValue::Uint(U256::from(v), 256)
    }

    fn addrs(bytes: &[u8]) -> DynSolValue {
        DynSolValue::Array(bytes.iter().map(|b| DynSolValue::Address(Address::repeat_byte(*b))).collect())
    }

    fn strings(items: &[&str]) -> DynSolValue {
        DynSolValue::Array(items.iter().map(|s| DynSolValue::String(s.to_string())).collect())
    }

    fn requirements(record: NormalizedEvent) -> ProposalCreatedWithRequirements {
        match record.payload {
            EventPayload::ProposalCreatedWithRequirements(p) => p,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn with_requirements_v1() {
        let sig = signature(CATALOGUE, "ProposalCreatedWithRequirements", 1);
        let log = decoded(
            LogBuilder::new(sig)
                .body(uint(12))
                .body(DynSolValue::Address(Address::repeat_byte(1)))
                .body(addrs(&[2]))
                .body(DynSolValue::Array(vec![uint(5)]))
                .body(strings(&["transfer(address,uint256)"]))
                .body(DynSolValue::Array(vec![DynSolValue::Bytes(vec![0xde, 0xad])]))
                .body(uint(100))
                .body(uint(200))
                .body(uint(2))
                .body(uint(40))
                .body(DynSolValue::String("# Prop 12".into())),
            sig,
        );
        let p = requirements(DaoLogicFormatter.format("ProposalCreatedWithRequirements", 1, &log).unwrap());
        assert_eq!(p.id, 12);
        assert_eq!(p.proposer.as_deref(), Some(Address::repeat_byte(1).to_checksum(None).as_str()));
        assert_eq!(p.values, Some(vec!["5".to_string()]));
        assert_eq!(p.calldatas, Some(vec!["0xdead".to_string()]));
        assert_eq!(p.start_block, Some(100));
        assert_eq!(p.quorum_votes, 40);
        assert_eq!(p.signers, None);
        assert_eq!(p.update_period_end_block, None);
        assert_eq!(p.client_id, None);
    }

    #[test]
    fn with_requirements_v3_adds_signers() {
        let sig = signature(CATALOGUE, "ProposalCreatedWithRequirements", 3);
        let log = decoded(
            LogBuilder::new(sig)
                .body(uint(400))
                .body(DynSolValue::Address(Address::repeat_byte(1)))
                .body(addrs(&[7, 8]))
                .body(addrs(&[2]))
                .body(DynSolValue::Array(vec![uint(0)]))
                .body(strings(&[""]))
                .body(DynSolValue::Array(vec![DynSolValue::Bytes(vec![])]))
                .body(uint(18_000_100))
                .body(uint(18_000_200))
                .body(uint(18_000_050))
                .body(uint(3))
                .body(uint(70))
                .body(DynSolValue::String("desc".into())),
            sig,
        );
        let p = requirements(DaoLogicFormatter.format("ProposalCreatedWithRequirements", 3, &log).unwrap());
        assert_eq!(p.signers.as_ref().map(Vec::len), Some(2));
        assert_eq!(p.update_period_end_block, Some(18_000_050));
        assert_eq!(p.description.as_deref(), Some("desc"));
        assert_eq!(p.calldatas, Some(vec!["0x".to_string()]));
        assert_eq!(p.client_id, None);
    }

    #[test]
    fn with_requirements_v4_has_client_id_only() {
        let sig = signature(CATALOGUE, "ProposalCreatedWithRequirements", 4);
        let log = decoded(
            LogBuilder::new(sig)
                .topic(DynSolValue::Uint(U256::from(11u64), 32))
                .body(uint(600))
                .body(addrs(&[]))
                .body(uint(19_900_000))
                .body(uint(4))
                .body(uint(80)),
            sig,
        );
        let p = requirements(DaoLogicFormatter.format("ProposalCreatedWithRequirements", 4, &log).unwrap());
        assert_eq!(p.id, 600);
        assert_eq!(p.client_id, Some(11));
        assert_eq!(p.signers, Some(vec![]));
        assert_eq!(p.proposer, None);
        assert_eq!(p.targets, None);
        assert_eq!(p.description, None);

        let json = serde_json::to_value(&p).unwrap();
        assert!(json["proposer"].is_null());
        assert_eq!(json["proposalThreshold"], 4);
    }

    #[test]
    fn vote_weight_is_decimal_and_support_is_integer() {
        let sig = signature(CATALOGUE, "VoteCast", 1);
        let voter = Address::repeat_byte(0x33);
        let log = decoded(
            LogBuilder::new(sig)
                .topic(DynSolValue::Address(voter))
                .body(uint(88))
                .body(DynSolValue::Uint(U256::from(2u64), 8))
                .body(uint(15))
                .body(DynSolValue::String(String::new())),
            sig,
        );
        let record = DaoLogicFormatter.format("VoteCast", 1, &log).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "VoteCast");
        assert_eq!(json["support"], 2);
        assert_eq!(json["votes"], "15");
        assert_eq!(json["proposalId"], 88);
    }

    #[test]
    fn escrow_reads_indexed_fork_id() {
        let sig = signature(CATALOGUE, "EscrowedToFork", 3);
        let log = decoded(
            LogBuilder::new(sig)
                .topic(DynSolValue::Uint(U256::from(1u64), 32))
                .topic(DynSolValue::Address(Address::repeat_byte(9)))
                .body(DynSolValue::Array(vec![uint(10), uint(11)]))
                .body(DynSolValue::Array(vec![]))
                .body(DynSolValue::String("rage".into())),
            sig,
        );
        let record = DaoLogicFormatter.format("EscrowedToFork", 3, &log).unwrap();
        assert_eq!(
            record.payload,
            EscrowedToFork {
                fork_id: 1,
                owner: Address::repeat_byte(9).to_checksum(None),
                token_ids: vec![10, 11],
                proposal_ids: vec![],
                reason: "rage".into(),
            }
            .into()
        );
    }
}
