//! Normalized event payloads, one struct per event type, grouped by contract family.
//!
//! Numeric policy (fixed per field, identical across signature versions):
//! ids, counts, block numbers, timestamps and small enums are integers;
//! wei amounts, vote weights and balances are decimal strings.

use serde::{Deserialize, Serialize};

pub mod auction;
pub mod dao;
pub mod data;
pub mod token;

/// The on-chain contract family an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractFamily {
    AuctionHouse,
    DaoLogic,
    Token,
    Data,
}

impl std::fmt::Display for ContractFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuctionHouse => write!(f, "auction-house"),
            Self::DaoLogic => write!(f, "dao-logic"),
            Self::Token => write!(f, "token"),
            Self::Data => write!(f, "data"),
        }
    }
}

macro_rules! event_payloads {
    ($($family:ident :: $name:ident),+ $(,)?) => {
        /// Event-specific fields, tagged with the event name under `"kind"`.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(tag = "kind")]
        pub enum EventPayload {
            $($name($family::$name),)+
        }

        impl EventPayload {
            /// The logical event name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$name(_) => stringify!($name),)+
                }
            }
        }

        $(
            impl From<$family::$name> for EventPayload {
                fn from(value: $family::$name) -> Self {
                    Self::$name(value)
                }
            }
        )+
    };
}

event_payloads! {
    auction::AuctionCreated,
    auction::AuctionBid,
    auction::AuctionBidWithClientId,
    auction::AuctionExtended,
    auction::AuctionSettled,
    auction::AuctionSettledWithClientId,
    auction::AuctionTimeBufferUpdated,
    auction::AuctionReservePriceUpdated,
    auction::AuctionMinBidIncrementPercentageUpdated,
    dao::ProposalCreated,
    dao::ProposalCreatedWithRequirements,
    dao::VoteCast,
    dao::ProposalCanceled,
    dao::ProposalQueued,
    dao::ProposalExecuted,
    dao::ProposalVetoed,
    dao::RefundableVote,
    dao::ProposalUpdated,
    dao::ProposalObjectionPeriodSet,
    dao::EscrowedToFork,
    token::Transfer,
    token::DelegateChanged,
    token::DelegateVotesChanged,
    token::NounCreated,
    token::NounBurned,
    data::ProposalCandidateCreated,
    data::ProposalCandidateUpdated,
    data::ProposalCandidateCanceled,
    data::SignatureAdded,
    data::FeedbackSent,
    data::CandidateFeedbackSent,
}
