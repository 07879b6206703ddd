//! Auction house formatter.

use nounsindex_core::error::IndexerError;
use nounsindex_core::events::auction::*;
use nounsindex_core::events::{ContractFamily, EventPayload};
use nounsindex_core::types::NormalizedEvent;
use nounsindex_core::window::WindowDef;

use super::{finish, EventDef, EventFormatter, AUCTION_HOUSE_V2_UPGRADE_BLOCK, NOUNS_GENESIS_BLOCK};
use crate::abi::{DecodeError, DecodedArgs};
use crate::fetcher::RawLog;

const G: u64 = NOUNS_GENESIS_BLOCK;
const V2: u64 = AUCTION_HOUSE_V2_UPGRADE_BLOCK;

static CATALOGUE: &[EventDef] = &[
    EventDef::new(
        "AuctionCreated",
        &[WindowDef::new(1, G, "AuctionCreated(uint256 indexed nounId, uint256 startTime, uint256 endTime)")],
    ),
    EventDef::new(
        "AuctionBid",
        &[WindowDef::new(1, G, "AuctionBid(uint256 indexed nounId, address sender, uint256 value, bool extended)")],
    ),
    EventDef::new(
        "AuctionBidWithClientId",
        &[WindowDef::new(
            2,
            V2,
            "AuctionBidWithClientId(uint256 indexed nounId, uint256 value, uint32 indexed clientId)",
        )],
    ),
    EventDef::new(
        "AuctionExtended",
        &[WindowDef::new(1, G, "AuctionExtended(uint256 indexed nounId, uint256 endTime)")],
    ),
    EventDef::new(
        "AuctionSettled",
        &[WindowDef::new(1, G, "AuctionSettled(uint256 indexed nounId, address winner, uint256 amount)")],
    ),
    EventDef::new(
        "AuctionSettledWithClientId",
        &[WindowDef::new(
            2,
            V2,
            "AuctionSettledWithClientId(uint256 indexed nounId, uint32 indexed clientId)",
        )],
    ),
    EventDef::new(
        "AuctionTimeBufferUpdated",
        &[WindowDef::new(1, G, "AuctionTimeBufferUpdated(uint256 timeBuffer)")],
    ),
    EventDef::new(
        "AuctionReservePriceUpdated",
        &[
            WindowDef::new(1, G, "AuctionReservePriceUpdated(uint256 reservePrice)"),
            WindowDef::new(2, V2, "AuctionReservePriceUpdated(uint192 reservePrice)"),
        ],
    ),
    EventDef::new(
        "AuctionMinBidIncrementPercentageUpdated",
        &[
            WindowDef::new(
                1,
                G,
                "AuctionMinBidIncrementPercentageUpdated(uint256 minBidIncrementPercentage)",
            ),
            WindowDef::new(
                2,
                V2,
                "AuctionMinBidIncrementPercentageUpdated(uint8 minBidIncrementPercentage)",
            ),
        ],
    ),
];

/// Formats auction house events.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuctionHouseFormatter;

impl AuctionHouseFormatter {
    fn payload(event: &str, a: &DecodedArgs) -> Result<Option<EventPayload>, DecodeError> {
        let payload: EventPayload = match event {
            "AuctionCreated" => AuctionCreated {
                noun_id: a.u64("nounId")?,
                start_time: a.u64("startTime")?,
                end_time: a.u64("endTime")?,
            }
            .into(),
            "AuctionBid" => AuctionBid {
                noun_id: a.u64("nounId")?,
                sender: a.address("sender")?,
                value: a.decimal("value")?,
                extended: a.boolean("extended")?,
            }
            .into(),
            "AuctionBidWithClientId" => AuctionBidWithClientId {
                noun_id: a.u64("nounId")?,
                value: a.decimal("value")?,
                client_id: a.u32("clientId")?,
            }
            .into(),
            "AuctionExtended" => AuctionExtended {
                noun_id: a.u64("nounId")?,
                end_time: a.u64("endTime")?,
            }
            .into(),
            "AuctionSettled" => AuctionSettled {
                noun_id: a.u64("nounId")?,
                winner: a.address("winner")?,
                amount: a.decimal("amount")?,
            }
            .into(),
            "AuctionSettledWithClientId" => AuctionSettledWithClientId {
                noun_id: a.u64("nounId")?,
                client_id: a.u32("clientId")?,
            }
            .into(),
            "AuctionTimeBufferUpdated" => AuctionTimeBufferUpdated {
                time_buffer: a.u64("timeBuffer")?,
            }
            .into(),
            // uint256 in V1, uint192 in V2: decimal string either way.
            "AuctionReservePriceUpdated" => AuctionReservePriceUpdated {
                reserve_price: a.decimal("reservePrice")?,
            }
            .into(),
            "AuctionMinBidIncrementPercentageUpdated" => AuctionMinBidIncrementPercentageUpdated {
                min_bid_increment_percentage: a.u64("minBidIncrementPercentage")?,
            }
            .into(),
            _ => return Ok(None),
        };
        Ok(Some(payload))
    }
}

impl EventFormatter for AuctionHouseFormatter {
    fn family(&self) -> ContractFamily {
        ContractFamily::AuctionHouse
    }

    fn catalogue(&self) -> &'static [EventDef] {
        CATALOGUE
    }

    fn format(&self, event: &str, _version: u8, log: &RawLog) -> Result<NormalizedEvent, IndexerError> {
        finish(event, log, Self::payload(event, &log.args))
    }
}
