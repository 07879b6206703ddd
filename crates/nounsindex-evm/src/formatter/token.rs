//! Nouns token formatter.

use nounsindex_core::error::IndexerError;
use nounsindex_core::events::token::*;
use nounsindex_core::events::{ContractFamily, EventPayload};
use nounsindex_core::types::NormalizedEvent;
use nounsindex_core::window::WindowDef;

use super::{finish, EventDef, EventFormatter, NOUNS_GENESIS_BLOCK};
use crate::abi::{value_u64, DecodeError, DecodedArgs};
use crate::fetcher::RawLog;

const G: u64 = NOUNS_GENESIS_BLOCK;

static CATALOGUE: &[EventDef] = &[
    EventDef::new(
        "Transfer",
        &[WindowDef::new(
            1,
            G,
            "Transfer(address indexed from, address indexed to, uint256 indexed tokenId)",
        )],
    ),
    EventDef::new(
        "DelegateChanged",
        &[WindowDef::new(
            1,
            G,
            "DelegateChanged(address indexed delegator, address indexed fromDelegate, address indexed toDelegate)",
        )],
    ),
    EventDef::new(
        "DelegateVotesChanged",
        &[WindowDef::new(
            1,
            G,
            "DelegateVotesChanged(address indexed delegate, uint256 previousBalance, uint256 newBalance)",
        )],
    ),
    EventDef::new(
        "NounCreated",
        &[WindowDef::new(
            1,
            G,
            "NounCreated(uint256 indexed tokenId, (uint48,uint48,uint48,uint48,uint48) seed)",
        )],
    ),
    EventDef::new("NounBurned", &[WindowDef::new(1, G, "NounBurned(uint256 indexed tokenId)")]),
];

/// Formats token transfer, delegation and mint/burn events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenFormatter;

fn seed(a: &DecodedArgs) -> Result<NounSeed, DecodeError> {
    let parts = a.tuple("seed")?;
    if parts.len() != 5 {
        return Err(DecodeError::WrongType {
            field: "seed".into(),
            expected: "a 5-tuple",
        });
    }
    Ok(NounSeed {
        background: value_u64(&parts[0], "seed.background")?,
        body: value_u64(&parts[1], "seed.body")?,
        accessory: value_u64(&parts[2], "seed.accessory")?,
        head: value_u64(&parts[3], "seed.head")?,
        glasses: value_u64(&parts[4], "seed.glasses")?,
    })
}

impl EventFormatter for TokenFormatter {
    fn family(&self) -> ContractFamily {
        ContractFamily::Token
    }

    fn catalogue(&self) -> &'static [EventDef] {
        CATALOGUE
    }

    fn format(&self, event: &str, _version: u8, log: &RawLog) -> Result<NormalizedEvent, IndexerError> {
        let a = &log.args;
        let payload = (|| -> Result<Option<EventPayload>, DecodeError> {
            Ok(Some(match event {
                "Transfer" => Transfer {
                    from: a.address("from")?,
                    to: a.address("to")?,
                    token_id: a.u64("tokenId")?,
                }
                .into(),
                "DelegateChanged" => DelegateChanged {
                    delegator: a.address("delegator")?,
                    from_delegate: a.address("fromDelegate")?,
                    to_delegate: a.address("toDelegate")?,
                }
                .into(),
                "DelegateVotesChanged" => DelegateVotesChanged {
                    delegate: a.address("delegate")?,
                    previous_balance: a.decimal("previousBalance")?,
                    new_balance: a.decimal("newBalance")?,
                }
                .into(),
                "NounCreated" => NounCreated {
                    token_id: a.u64("tokenId")?,
                    seed: seed(a)?,
                }
                .into(),
                "NounBurned" => NounBurned {
                    token_id: a.u64("tokenId")?,
                }
                .into(),
                _ => return Ok(None),
            }))
        })();
        finish(event, log, payload)
    }
}
