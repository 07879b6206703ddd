//! Signature windows, recording which on-chain encoding of a logical event is
//! authoritative over which block range.
//!
//! A contract upgrade can change an event's parameter list and therefore its
//! topic0. The window table for an event lists every encoding in the order it
//! went live; each window runs from its `valid_from` (inclusive) up to the
//! block before the next window starts. The last window is open-ended.

use serde::{Deserialize, Serialize};

use crate::error::IndexerError;

/// Static description of one encoding: the input to [`WindowTable::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDef {
    /// Contract version that introduced this encoding (1, 2, 3, ...).
    pub version: u8,
    /// First block at which this encoding is emitted.
    pub valid_from: u64,
    /// Human-readable event signature, e.g.
    /// `"AuctionBid(uint256 indexed nounId, address sender, uint256 value, bool extended)"`.
    pub signature: &'static str,
}

impl WindowDef {
    pub const fn new(version: u8, valid_from: u64, signature: &'static str) -> Self {
        Self {
            version,
            valid_from,
            signature,
        }
    }
}

/// One encoding and the inclusive block range it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureWindow {
    pub signature: String,
    pub version: u8,
    pub valid_from: u64,
    /// Last block of the window; `None` = open-ended.
    pub valid_to: Option<u64>,
}

impl SignatureWindow {
    /// Intersect `[start, end]` with this window.
    ///
    /// Returns `None` when the intersection is empty.
    pub fn clamp(&self, start: u64, end: u64) -> Option<(u64, u64)> {
        let from = start.max(self.valid_from);
        let to = match self.valid_to {
            Some(valid_to) => end.min(valid_to),
            None => end,
        };
        (from <= to).then_some((from, to))
    }

    /// Returns `true` if `block` falls inside this window.
    pub fn contains(&self, block: u64) -> bool {
        block >= self.valid_from && self.valid_to.map_or(true, |to| block <= to)
    }
}

/// The clamped portion of a requested range served by one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSlice<'a> {
    pub window: &'a SignatureWindow,
    pub from: u64,
    pub to: u64,
}

/// Ordered, contiguous, non-overlapping windows for one logical event.
///
/// Deserialized tables are checked the same way [`WindowTable::new`] checks
/// definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindowTable")]
pub struct WindowTable {
    event: String,
    windows: Vec<SignatureWindow>,
}

#[derive(Deserialize)]
struct RawWindowTable {
    event: String,
    windows: Vec<SignatureWindow>,
}

impl TryFrom<RawWindowTable> for WindowTable {
    type Error = IndexerError;

    fn try_from(raw: RawWindowTable) -> Result<Self, Self::Error> {
        let RawWindowTable { event, windows } = raw;
        let invalid = |reason: String| IndexerError::InvalidWindows {
            event: event.clone(),
            reason,
        };
        let Some(last) = windows.last() else {
            return Err(invalid("no signature windows".into()));
        };
        if last.valid_to.is_some() {
            return Err(invalid(format!("last window v{} is not open-ended", last.version)));
        }
        for pair in windows.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.valid_from <= prev.valid_from {
                return Err(invalid(format!(
                    "window v{} starts at {} which is not after v{} at {}",
                    next.version, next.valid_from, prev.version, prev.valid_from
                )));
            }
            if prev.valid_to != Some(next.valid_from - 1) {
                return Err(invalid(format!(
                    "window v{} must end at {} where v{} begins",
                    prev.version,
                    next.valid_from - 1,
                    next.version
                )));
            }
        }
        Ok(Self { event, windows })
    }
}

impl WindowTable {
    /// Build the table from definitions in go-live order.
    ///
    /// `valid_to` of each window is derived here as the successor's
    /// `valid_from - 1`, so a block equal to an upgrade boundary always belongs
    /// to the newer encoding.
    pub fn new(event: impl Into<String>, defs: &[WindowDef]) -> Result<Self, IndexerError> {
        let event = event.into();
        if defs.is_empty() {
            return Err(IndexerError::InvalidWindows {
                event,
                reason: "no signature windows".into(),
            });
        }
        for pair in defs.windows(2) {
            if pair[1].valid_from <= pair[0].valid_from {
                return Err(IndexerError::InvalidWindows {
                    event,
                    reason: format!(
                        "window v{} starts at {} which is not after v{} at {}",
                        pair[1].version, pair[1].valid_from, pair[0].version, pair[0].valid_from
                    ),
                });
            }
        }

        let windows = defs
            .iter()
            .enumerate()
            .map(|(i, def)| SignatureWindow {
                signature: def.signature.to_string(),
                version: def.version,
                valid_from: def.valid_from,
                valid_to: defs.get(i + 1).map(|next| next.valid_from - 1),
            })
            .collect();

        Ok(Self { event, windows })
    }

    /// A table with a single open-ended window.
    pub fn single(
        event: impl Into<String>,
        signature: &'static str,
        genesis: u64,
    ) -> Result<Self, IndexerError> {
        Self::new(event, &[WindowDef::new(1, genesis, signature)])
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn windows(&self) -> &[SignatureWindow] {
        &self.windows
    }

    /// First block at which the event can appear on-chain.
    pub fn genesis_block(&self) -> u64 {
        self.windows[0].valid_from
    }

    /// The encoding in force at the chain tip.
    pub fn current(&self) -> &SignatureWindow {
        // Non-empty by construction.
        &self.windows[self.windows.len() - 1]
    }

    /// Returns `true` if the event has been re-encoded at least once.
    pub fn is_versioned(&self) -> bool {
        self.windows.len() > 1
    }

    /// The window active at `block`, if the event existed then.
    pub fn window_at(&self, block: u64) -> Option<&SignatureWindow> {
        self.windows.iter().find(|w| w.contains(block))
    }

    /// Split `[start, end]` into per-window slices, in window order.
    ///
    /// Windows that do not intersect the range are left out.
    pub fn plan(&self, start: u64, end: u64) -> Vec<WindowSlice<'_>> {
        self.windows
            .iter()
            .filter_map(|window| {
                window
                    .clamp(start, end)
                    .map(|(from, to)| WindowSlice { window, from, to })
            })
            .collect()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
