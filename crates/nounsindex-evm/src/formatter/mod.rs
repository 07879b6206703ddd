//! Event formatters: decoded log → [`NormalizedEvent`].
//!
//! One formatter per contract family. Formatters are pure; every numeric
//! field has one representation regardless of which signature version
//! produced the log.

use nounsindex_core::error::IndexerError;
use nounsindex_core::events::{ContractFamily, EventPayload};
use nounsindex_core::types::NormalizedEvent;
use nounsindex_core::window::WindowDef;

use crate::abi::DecodeError;
use crate::fetcher::RawLog;

pub mod auction;
pub mod dao;
pub mod data;
pub mod token;

pub use auction::AuctionHouseFormatter;
pub use dao::DaoLogicFormatter;
pub use data::DataFormatter;
pub use token::TokenFormatter;

/// Block of the first Nouns auction; earliest block any event can appear in.
pub const NOUNS_GENESIS_BLOCK: u64 = 13_072_753;
/// First block served by DAO logic V3 (and the data contract).
pub const DAO_V3_UPGRADE_BLOCK: u64 = 17_990_000;
/// First block served by DAO logic V4.
pub const DAO_V4_UPGRADE_BLOCK: u64 = 19_810_422;
/// First block served by auction house V2.
pub const AUCTION_HOUSE_V2_UPGRADE_BLOCK: u64 = 19_810_422;

/// A logical event and its signature windows, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct EventDef {
    pub name: &'static str,
    pub windows: &'static [WindowDef],
}

impl EventDef {
    pub const fn new(name: &'static str, windows: &'static [WindowDef]) -> Self {
        Self { name, windows }
    }
}

/// Maps decoded logs of one contract family to normalized records.
pub trait EventFormatter: Send + Sync {
    fn family(&self) -> ContractFamily;

    /// Every event this family emits, with its signature windows.
    fn catalogue(&self) -> &'static [EventDef];

    fn supports(&self, event: &str) -> bool {
        self.catalogue().iter().any(|def| def.name == event)
    }

    /// Format a log produced by signature `version` of `event`.
    ///
    /// Returns [`IndexerError::UnsupportedEvent`] for names outside the
    /// catalogue and [`IndexerError::Format`] for logs of the wrong shape.
    fn format(&self, event: &str, version: u8, log: &RawLog) -> Result<NormalizedEvent, IndexerError>;
}

/// Wrap a payload built from `log` into a record, attributing decode errors to `event`.
pub(crate) fn finish(
    event: &str,
    log: &RawLog,
    payload: Result<Option<EventPayload>, DecodeError>,
) -> Result<NormalizedEvent, IndexerError> {
    match payload {
        Ok(Some(payload)) => Ok(NormalizedEvent::new(log.envelope(), payload)),
        Ok(None) => Err(IndexerError::UnsupportedEvent(event.to_string())),
        Err(e) => Err(IndexerError::format(event, e.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::abi::{DecodedArgs, EventSignature};
    use crate::test_utils::LogBuilder;

    /// Decode a built log against the catalogue signature it was built from.
    pub fn decoded(builder: LogBuilder, signature: &str) -> RawLog {
        let sig = EventSignature::parse(signature).unwrap();
        RawLog::decode(&sig, &builder.build()).unwrap()
    }

    pub fn raw(args: DecodedArgs) -> RawLog {
        RawLog {
            address: "0x0".into(),
            block_number: 1,
            block_hash: "0xb".into(),
            transaction_hash: "0xt".into(),
            log_index: Some(0),
            args,
        }
    }

    /// Signature of `event` at `version` in `catalogue`.
    pub fn signature(catalogue: &[EventDef], event: &str, version: u8) -> &'static str {
        catalogue
            .iter()
            .find(|d| d.name == event)
            .and_then(|d| d.windows.iter().find(|w| w.version == version))
            .map(|w| w.signature)
            .unwrap()
    }
}
