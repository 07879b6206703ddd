//! Auction house events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionCreated {
    pub noun_id: u64,
    pub start_time: u64,
    pub end_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionBid {
    pub noun_id: u64,
    pub sender: String,
    /// Bid in wei.
    pub value: String,
    pub extended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionBidWithClientId {
    pub noun_id: u64,
    pub value: String,
    pub client_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionExtended {
    pub noun_id: u64,
    pub end_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSettled {
    pub noun_id: u64,
    pub winner: String,
    /// Winning bid in wei.
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSettledWithClientId {
    pub noun_id: u64,
    pub client_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionTimeBufferUpdated {
    /// Seconds.
    pub time_buffer: u64,
}

/// `uint256` before the V2 auction house, `uint192` after; always a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionReservePriceUpdated {
    pub reserve_price: String,
}

/// `uint256` before the V2 auction house, `uint8` after; always an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionMinBidIncrementPercentageUpdated {
    pub min_bid_increment_percentage: u64,
}
