//! Event registry: logical event name → family, signature windows and
//! formatter, built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use nounsindex_core::error::IndexerError;
use nounsindex_core::events::ContractFamily;
use nounsindex_core::indexer::ContractAddresses;
use nounsindex_core::window::{SignatureWindow, WindowTable};

use crate::abi::EventSignature;
use crate::formatter::{
    AuctionHouseFormatter, DaoLogicFormatter, DataFormatter, EventFormatter, TokenFormatter,
};

/// Everything needed to fetch one logical event.
#[derive(Debug, Clone)]
pub struct RegisteredEvent {
    family: ContractFamily,
    table: WindowTable,
    /// Parsed signature per window, same order as `table.windows()`.
    signatures: Vec<EventSignature>,
}

impl RegisteredEvent {
    pub fn name(&self) -> &str {
        self.table.event()
    }

    pub fn family(&self) -> ContractFamily {
        self.family
    }

    pub fn table(&self) -> &WindowTable {
        &self.table
    }

    pub fn genesis_block(&self) -> u64 {
        self.table.genesis_block()
    }

    /// Parsed signature of `window`, which must belong to this event's table.
    pub fn signature(&self, window: &SignatureWindow) -> Option<&EventSignature> {
        self.table
            .windows()
            .iter()
            .position(|w| w == window)
            .and_then(|i| self.signatures.get(i))
    }

    /// Signature and version in force at the chain tip.
    pub fn current(&self) -> (&SignatureWindow, &EventSignature) {
        let last = self.signatures.len() - 1;
        (self.table.current(), &self.signatures[last])
    }
}

/// Lookup table of every supported event.
pub struct EventRegistry {
    events: HashMap<String, RegisteredEvent>,
    order: Vec<String>,
    formatters: HashMap<ContractFamily, Arc<dyn EventFormatter>>,
    contracts: ContractAddresses,
}

impl EventRegistry {
    /// Build from formatters; each contributes its catalogue.
    ///
    /// Fails on a malformed signature, a signature whose name differs from
    /// its event, bad window ordering, or an event claimed twice.
    pub fn new(
        formatters: Vec<Arc<dyn EventFormatter>>,
        contracts: ContractAddresses,
    ) -> Result<Self, IndexerError> {
        let mut events = HashMap::new();
        let mut order = Vec::new();
        let mut by_family = HashMap::new();

        for formatter in formatters {
            let family = formatter.family();
            for def in formatter.catalogue() {
                let table = WindowTable::new(def.name, def.windows)?;
                let signatures = table
                    .windows()
                    .iter()
                    .map(|w| EventSignature::parse(&w.signature))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(bad) = signatures.iter().find(|s| s.name() != def.name) {
                    return Err(IndexerError::InvalidWindows {
                        event: def.name.to_string(),
                        reason: format!("signature {bad} is for a different event"),
                    });
                }
                if events.contains_key(def.name) {
                    return Err(IndexerError::Config(format!(
                        "event '{}' registered by more than one family",
                        def.name
                    )));
                }
                order.push(def.name.to_string());
                events.insert(
                    def.name.to_string(),
                    RegisteredEvent {
                        family,
                        table,
                        signatures,
                    },
                );
            }
            by_family.insert(family, formatter);
        }

        tracing::debug!(events = order.len(), families = by_family.len(), "event registry built");
        Ok(Self {
            events,
            order,
            formatters: by_family,
            contracts,
        })
    }

    /// All four Nouns families at their mainnet addresses.
    pub fn mainnet() -> Result<Self, IndexerError> {
        Self::with_contracts(ContractAddresses::mainnet())
    }

    /// All four Nouns families at the given addresses.
    pub fn with_contracts(contracts: ContractAddresses) -> Result<Self, IndexerError> {
        let formatters: Vec<Arc<dyn EventFormatter>> = vec![
            Arc::new(AuctionHouseFormatter),
            Arc::new(DaoLogicFormatter),
            Arc::new(TokenFormatter),
            Arc::new(DataFormatter),
        ];
        Self::new(formatters, contracts)
    }

    pub fn supports(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    pub fn get(&self, event: &str) -> Result<&RegisteredEvent, IndexerError> {
        self.events
            .get(event)
            .ok_or_else(|| IndexerError::UnsupportedEvent(event.to_string()))
    }

    /// Event names in catalogue order.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn formatter(&self, family: ContractFamily) -> Result<Arc<dyn EventFormatter>, IndexerError> {
        self.formatters
            .get(&family)
            .cloned()
            .ok_or_else(|| IndexerError::Config(format!("no formatter for family {family}")))
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn address(&self, family: ContractFamily) -> &str {
        self.contracts.for_family(family)
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("events", &self.order)
            .field("contracts", &self.contracts)
            .finish()
    }
}
