//! Error types for the indexing pipeline.

use thiserror::Error;

/// Errors that can occur while fetching, formatting or persisting events.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    #[error("Fetch failed for '{event}' in blocks {from}..={to}: {reason}")]
    Fetch {
        event: String,
        from: u64,
        to: u64,
        reason: String,
    },

    #[error("Format failed for '{event}': {reason}")]
    Format { event: String, reason: String },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid block range {from}..={to}")]
    InvalidRange { from: u64, to: u64 },

    #[error("Invalid signature windows for '{event}': {reason}")]
    InvalidWindows { event: String, reason: String },

    #[error("Checkpoint for '{event}' cannot move back from {current} to {attempted}")]
    CheckpointRegression {
        event: String,
        current: u64,
        attempted: u64,
    },

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Config error: {0}")]
    Config(String),

    /// An error without its own event name, raised while working on `event`.
    #[error("'{event}': {source}")]
    Event {
        event: String,
        #[source]
        source: Box<IndexerError>,
    },
}

impl IndexerError {
    /// Returns `true` if the error came from the provider while querying logs.
    pub fn is_fetch_failure(&self) -> bool {
        match self {
            Self::Event { source, .. } => source.is_fetch_failure(),
            other => matches!(other, Self::Fetch { .. } | Self::Rpc(_)),
        }
    }

    /// Attach an event name, unless the error already names one.
    pub fn with_event(self, event: &str) -> Self {
        if self.event().is_some() {
            return self;
        }
        Self::Event {
            event: event.to_string(),
            source: Box::new(self),
        }
    }

    /// The underlying error with any event context stripped.
    pub fn root(&self) -> &IndexerError {
        match self {
            Self::Event { source, .. } => source.root(),
            other => other,
        }
    }

    /// Shorthand for a [`IndexerError::Format`] error.
    pub fn format(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            event: event.into(),
            reason: reason.into(),
        }
    }

    /// Name of the event this error relates to, when known.
    pub fn event(&self) -> Option<&str> {
        match self {
            Self::UnsupportedEvent(event)
            | Self::Fetch { event, .. }
            | Self::Format { event, .. }
            | Self::InvalidWindows { event, .. }
            | Self::CheckpointRegression { event, .. }
            | Self::Event { event, .. } => Some(event),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_are_classified() {
        let err = IndexerError::Fetch {
            event: "AuctionBid".into(),
            from: 1,
            to: 2,
            reason: "timeout".into(),
        };
        assert!(err.is_fetch_failure());
        assert_eq!(err.event(), Some("AuctionBid"));
        assert!(!IndexerError::format("VoteCast", "bad").is_fetch_failure());
    }

    #[test]
    fn messages_carry_event_and_cause() {
        let err = IndexerError::format("VoteCast", "missing field 'support'");
        assert_eq!(
            err.to_string(),
            "Format failed for 'VoteCast': missing field 'support'"
        );
    }

    #[test]
    fn with_event_wraps_only_anonymous_errors() {
        let err = IndexerError::Storage("disk full".into()).with_event("AuctionBid");
        assert_eq!(err.event(), Some("AuctionBid"));
        assert!(matches!(err.root(), IndexerError::Storage(_)));
        assert_eq!(err.to_string(), "'AuctionBid': Storage error: disk full");

        let rpc = IndexerError::Rpc("timeout".into()).with_event("VoteCast");
        assert!(rpc.is_fetch_failure());

        let named = IndexerError::format("VoteCast", "bad").with_event("AuctionBid");
        assert_eq!(named.event(), Some("VoteCast"));
        assert!(matches!(named, IndexerError::Format { .. }));
    }
}
