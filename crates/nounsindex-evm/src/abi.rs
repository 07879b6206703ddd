//! Event signatures and log decoding.
//!
//! Signatures are written in human-readable form with parameter names:
//!
//! ```text
//! AuctionBid(uint256 indexed nounId, address sender, uint256 value, bool extended)
//! NounCreated(uint256 indexed tokenId, (uint48,uint48,uint48,uint48,uint48) seed)
//! ```
//!
//! Parsing goes through `alloy-json-abi`, so tuple components may be named
//! and a leading `event` keyword is allowed. Decoding uses `alloy-dyn-abi`.

use alloy_dyn_abi::{DynSolType, DynSolValue, EventExt, Specifier};
use alloy_json_abi::Event;
use alloy_primitives::B256;
use thiserror::Error;

use nounsindex_core::error::IndexerError;

/// Errors raised while decoding a log or reading a decoded argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("topic0 {actual} does not match {expected}")]
    Topic0Mismatch { expected: String, actual: String },

    #[error("expected {expected} indexed topics, got {actual}")]
    TopicCount { expected: usize, actual: usize },

    #[error("invalid hex in {what}: {reason}")]
    InvalidHex { what: String, reason: String },

    #[error("ABI decode failed: {0}")]
    Abi(String),

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}' is not {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("field '{field}' overflows {target}")]
    Overflow { field: String, target: &'static str },
}

/// One parameter of an event, with its type resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub ty: DynSolType,
    pub indexed: bool,
}

/// A parsed event signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSignature {
    event: Event,
    params: Vec<EventParam>,
    canonical: String,
    topic0: B256,
}

impl EventSignature {
    /// Parse a human-readable event signature. A leading `event` keyword is
    /// accepted; anonymous events are rejected since they carry no topic0.
    pub fn parse(signature: &str) -> Result<Self, IndexerError> {
        let invalid = |reason: String| IndexerError::InvalidWindows {
            event: signature.to_string(),
            reason,
        };

        let event = Event::parse(signature).map_err(|e| invalid(e.to_string()))?;
        if event.anonymous {
            return Err(invalid("anonymous events have no topic0".into()));
        }

        let params = event
            .inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                let ty: DynSolType = input
                    .resolve()
                    .map_err(|e| invalid(format!("bad type '{}': {e}", input.ty)))?;
                Ok(EventParam {
                    name: if input.name.is_empty() {
                        i.to_string()
                    } else {
                        input.name.clone()
                    },
                    ty,
                    indexed: input.indexed,
                })
            })
            .collect::<Result<Vec<_>, IndexerError>>()?;

        let canonical = event.signature();
        let topic0 = event.selector();
        Ok(Self {
            event,
            params,
            canonical,
            topic0,
        })
    }

    pub fn name(&self) -> &str {
        &self.event.name
    }

    pub fn params(&self) -> &[EventParam] {
        &self.params
    }

    /// Canonical form used for hashing, e.g. `Transfer(address,address,uint256)`.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn topic0(&self) -> B256 {
        self.topic0
    }

    /// `0x`-prefixed lowercase topic0, as used in `eth_getLogs` filters.
    pub fn topic0_hex(&self) -> String {
        format!("{:#x}", self.topic0)
    }

    /// Decode a log's topics and data into named arguments.
    ///
    /// Indexed reference types come back as their 32-byte topic hash.
    pub fn decode(&self, topics: &[String], data: &str) -> Result<DecodedArgs, DecodeError> {
        let words = topics
            .iter()
            .enumerate()
            .map(|(i, topic)| parse_word(topic, &format!("topic{i}")))
            .collect::<Result<Vec<B256>, _>>()?;
        match words.first() {
            None => {
                return Err(DecodeError::TopicCount {
                    expected: self.indexed_count(),
                    actual: 0,
                })
            }
            Some(topic0) if *topic0 != self.topic0 => {
                return Err(DecodeError::Topic0Mismatch {
                    expected: self.topic0_hex(),
                    actual: format!("{topic0:#x}"),
                })
            }
            Some(_) => {}
        }
        if words.len() - 1 != self.indexed_count() {
            return Err(DecodeError::TopicCount {
                expected: self.indexed_count(),
                actual: words.len() - 1,
            });
        }

        let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data)).map_err(|e| {
            DecodeError::InvalidHex {
                what: "data".into(),
                reason: e.to_string(),
            }
        })?;
        let decoded = self
            .event
            .decode_log_parts(words, &bytes, true)
            .map_err(|e| DecodeError::Abi(e.to_string()))?;

        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();
        let args = self
            .params
            .iter()
            .map(|param| {
                let value = if param.indexed {
                    indexed.next()
                } else {
                    body.next()
                };
                value
                    .map(|v| (param.name.clone(), v))
                    .ok_or_else(|| DecodeError::MissingField(param.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DecodedArgs { args })
    }

    fn indexed_count(&self) -> usize {
        self.params.iter().filter(|p| p.indexed).count()
    }
}

impl std::fmt::Display for EventSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

fn parse_word(hex_str: &str, what: &str) -> Result<B256, DecodeError> {
    hex_str.parse::<B256>().map_err(|e| DecodeError::InvalidHex {
        what: what.to_string(),
        reason: e.to_string(),
    })
}

// ─── DecodedArgs ──────────────────────────────────────────────────────────────

/// Decoded event arguments in declaration order, addressable by name.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArgs {
    args: Vec<(String, DynSolValue)>,
}

impl DecodedArgs {
    pub fn new(args: Vec<(String, DynSolValue)>) -> Self {
        Self { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|(name, _)| name.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.args.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Result<&DynSolValue, DecodeError> {
        self.args
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| DecodeError::MissingField(name.to_string()))
    }

    pub fn u64(&self, name: &str) -> Result<u64, DecodeError> {
        value_u64(self.get(name)?, name)
    }

    pub fn u32(&self, name: &str) -> Result<u32, DecodeError> {
        let v = self.u64(name)?;
        u32::try_from(v).map_err(|_| DecodeError::Overflow {
            field: name.to_string(),
            target: "u32",
        })
    }

    pub fn u8(&self, name: &str) -> Result<u8, DecodeError> {
        let v = self.u64(name)?;
        u8::try_from(v).map_err(|_| DecodeError::Overflow {
            field: name.to_string(),
            target: "u8",
        })
    }

    /// Arbitrary-precision integer as a base-10 string.
    pub fn decimal(&self, name: &str) -> Result<String, DecodeError> {
        value_decimal(self.get(name)?, name)
    }

    /// EIP-55 checksummed address.
    pub fn address(&self, name: &str) -> Result<String, DecodeError> {
        value_address(self.get(name)?, name)
    }

    pub fn boolean(&self, name: &str) -> Result<bool, DecodeError> {
        match self.get(name)? {
            DynSolValue::Bool(b) => Ok(*b),
            _ => Err(wrong_type(name, "a bool")),
        }
    }

    pub fn string(&self, name: &str) -> Result<String, DecodeError> {
        value_string(self.get(name)?, name)
    }

    /// `bytes` / `bytesN` as `0x`-hex.
    pub fn bytes(&self, name: &str) -> Result<String, DecodeError> {
        value_bytes(self.get(name)?, name)
    }

    pub fn addresses(&self, name: &str) -> Result<Vec<String>, DecodeError> {
        self.list(name, value_address)
    }

    pub fn decimals(&self, name: &str) -> Result<Vec<String>, DecodeError> {
        self.list(name, value_decimal)
    }

    pub fn u64s(&self, name: &str) -> Result<Vec<u64>, DecodeError> {
        self.list(name, value_u64)
    }

    pub fn strings(&self, name: &str) -> Result<Vec<String>, DecodeError> {
        self.list(name, value_string)
    }

    pub fn bytes_list(&self, name: &str) -> Result<Vec<String>, DecodeError> {
        self.list(name, value_bytes)
    }

    /// Components of a tuple argument.
    pub fn tuple(&self, name: &str) -> Result<&[DynSolValue], DecodeError> {
        match self.get(name)? {
            DynSolValue::Tuple(values) => Ok(values),
            _ => Err(wrong_type(name, "a tuple")),
        }
    }

    fn list<T>(
        &self,
        name: &str,
        f: fn(&DynSolValue, &str) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        match self.get(name)? {
            DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
                values.iter().map(|v| f(v, name)).collect()
            }
            _ => Err(wrong_type(name, "an array")),
        }
    }
}

fn wrong_type(field: &str, expected: &'static str) -> DecodeError {
    DecodeError::WrongType {
        field: field.to_string(),
        expected,
    }
}

pub fn value_u64(value: &DynSolValue, field: &str) -> Result<u64, DecodeError> {
    match value {
        DynSolValue::Uint(u, _) => u64::try_from(*u).map_err(|_| DecodeError::Overflow {
            field: field.to_string(),
            target: "u64",
        }),
        _ => Err(wrong_type(field, "an unsigned integer")),
    }
}

pub fn value_decimal(value: &DynSolValue, field: &str) -> Result<String, DecodeError> {
    match value {
        DynSolValue::Uint(u, _) => Ok(u.to_string()),
        DynSolValue::Int(i, _) => Ok(i.to_string()),
        _ => Err(wrong_type(field, "an integer")),
    }
}

pub fn value_address(value: &DynSolValue, field: &str) -> Result<String, DecodeError> {
    match value {
        DynSolValue::Address(a) => Ok(a.to_checksum(None)),
        _ => Err(wrong_type(field, "an address")),
    }
}

pub fn value_string(value: &DynSolValue, field: &str) -> Result<String, DecodeError> {
    match value {
        DynSolValue::String(s) => Ok(s.clone()),
        _ => Err(wrong_type(field, "a string")),
    }
}

pub fn value_bytes(value: &DynSolValue, field: &str) -> Result<String, DecodeError> {
    match value {
        DynSolValue::Bytes(b) => Ok(format!("0x{}", hex::encode(b))),
        DynSolValue::FixedBytes(word, size) => {
            Ok(format!("0x{}", hex::encode(&word[..(*size).min(32)])))
        }
        _ => Err(wrong_type(field, "bytes")),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    const TRANSFER: &str = "Transfer(address indexed from, address indexed to, uint256 indexed tokenId)";

    #[test]
    fn transfer_topic0_matches_erc721() {
        let sig = EventSignature::parse(TRANSFER).unwrap();
        assert_eq!(sig.canonical(), "Transfer(address,address,uint256)");
        assert_eq!(
            sig.topic0_hex(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        assert_eq!(sig.params().len(), 3);
        assert!(sig.params().iter().all(|p| p.indexed));
    }

    #[test]
    fn parses_inline_tuple_and_arrays() {
        let sig = EventSignature::parse(
            "NounCreated(uint256 indexed tokenId, (uint48,uint48,uint48,uint48,uint48) seed)",
        )
        .unwrap();
        assert_eq!(
            sig.canonical(),
            "NounCreated(uint256,(uint48,uint48,uint48,uint48,uint48))"
        );
        assert_eq!(sig.params()[1].name, "seed");

        let sig = EventSignature::parse("E(address[] targets, bytes[] calldatas)").unwrap();
        assert_eq!(sig.canonical(), "E(address[],bytes[])");
    }

    #[test]
    fn parses_empty_and_unnamed_params() {
        let sig = EventSignature::parse("Paused()").unwrap();
        assert!(sig.params().is_empty());
        let sig = EventSignature::parse("E(uint256, bool)").unwrap();
        assert_eq!(sig.params()[0].name, "0");
        assert_eq!(sig.params()[1].name, "1");
    }

    #[test]
    fn rejects_malformed_signatures() {
        assert!(EventSignature::parse("NoParens").is_err());
        assert!(EventSignature::parse("E(uint256 a").is_err());
        assert!(EventSignature::parse("E(notatype a)").is_err());
        assert!(EventSignature::parse("E(uint256 a) anonymous").is_err());
    }

    #[test]
    fn named_tuple_components_hash_like_unnamed() {
        let named = EventSignature::parse(
            "NounCreated(uint256 indexed tokenId, (uint48 background, uint48 body, uint48 accessory, uint48 head, uint48 glasses) seed)",
        )
        .unwrap();
        let bare = EventSignature::parse(
            "NounCreated(uint256 indexed tokenId, (uint48,uint48,uint48,uint48,uint48) seed)",
        )
        .unwrap();
        assert_eq!(
            named.canonical(),
            "NounCreated(uint256,(uint48,uint48,uint48,uint48,uint48))"
        );
        assert_eq!(named.topic0(), bare.topic0());
        assert_eq!(named.params()[1].name, "seed");
        assert_eq!(
            named.params()[1].ty,
            DynSolType::Tuple(vec![DynSolType::Uint(48); 5])
        );
    }

    #[test]
    fn event_keyword_is_not_part_of_the_name() {
        let sig = EventSignature::parse(
            "event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)",
        )
        .unwrap();
        assert_eq!(sig.name(), "Transfer");
        assert_eq!(sig.topic0(), EventSignature::parse(TRANSFER).unwrap().topic0());
    }

    fn word(value: DynSolValue) -> String {
        format!("0x{}", hex::encode(value.abi_encode()))
    }

    #[test]
    fn decodes_indexed_and_body_params() {
        let sig = EventSignature::parse(
            "AuctionBid(uint256 indexed nounId, address sender, uint256 value, bool extended)",
        )
        .unwrap();
        let sender = Address::repeat_byte(0x11);
        let body = DynSolValue::Tuple(vec![
            DynSolValue::Address(sender),
            DynSolValue::Uint(U256::from(10u64).pow(U256::from(20u64)), 256),
            DynSolValue::Bool(true),
        ]);
        let topics = vec![
            sig.topic0_hex(),
            word(DynSolValue::Uint(U256::from(42u64), 256)),
        ];
        let data = format!("0x{}", hex::encode(body.abi_encode_params()));

        let args = sig.decode(&topics, &data).unwrap();
        assert_eq!(args.u64("nounId").unwrap(), 42);
        assert_eq!(args.address("sender").unwrap(), sender.to_checksum(None));
        assert_eq!(args.decimal("value").unwrap(), "100000000000000000000");
        assert!(args.boolean("extended").unwrap());
        assert_eq!(args.names().collect::<Vec<_>>(), ["nounId", "sender", "value", "extended"]);
    }

    #[test]
    fn decodes_dynamic_body() {
        let sig = EventSignature::parse(
            "VoteCast(address indexed voter, uint256 proposalId, uint8 support, uint256 votes, string reason)",
        )
        .unwrap();
        let voter = Address::repeat_byte(0x22);
        let body = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(7u64), 256),
            DynSolValue::Uint(U256::from(1u64), 8),
            DynSolValue::Uint(U256::from(3u64), 256),
            DynSolValue::String("gm".into()),
        ]);
        let topics = vec![sig.topic0_hex(), word(DynSolValue::Address(voter))];
        let data = format!("0x{}", hex::encode(body.abi_encode_params()));

        let args = sig.decode(&topics, &data).unwrap();
        assert_eq!(args.address("voter").unwrap(), voter.to_checksum(None));
        assert_eq!(args.u64("proposalId").unwrap(), 7);
        assert_eq!(args.u8("support").unwrap(), 1);
        assert_eq!(args.decimal("votes").unwrap(), "3");
        assert_eq!(args.string("reason").unwrap(), "gm");
    }

    #[test]
    fn rejects_wrong_topic0_and_topic_count() {
        let sig = EventSignature::parse(TRANSFER).unwrap();
        let other = EventSignature::parse("Other(uint256 a)").unwrap();
        let err = sig.decode(&[other.topic0_hex()], "0x").unwrap_err();
        assert!(matches!(err, DecodeError::Topic0Mismatch { .. }));

        let err = sig.decode(&[sig.topic0_hex()], "0x").unwrap_err();
        assert_eq!(err, DecodeError::TopicCount { expected: 3, actual: 0 });
    }

    #[test]
    fn accessor_type_errors() {
        let args = DecodedArgs::new(vec![
            ("flag".into(), DynSolValue::Bool(true)),
            ("big".into(), DynSolValue::Uint(U256::MAX, 256)),
        ]);
        assert_eq!(
            args.u64("flag").unwrap_err(),
            DecodeError::WrongType { field: "flag".into(), expected: "an unsigned integer" }
        );
        assert!(matches!(args.u64("big").unwrap_err(), DecodeError::Overflow { .. }));
        assert_eq!(
            args.decimal("big").unwrap(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        assert_eq!(args.get("nope").unwrap_err(), DecodeError::MissingField("nope".into()));
    }

    #[test]
    fn fixed_bytes_render_as_hex() {
        let args = DecodedArgs::new(vec![(
            "hash".into(),
            DynSolValue::FixedBytes(B256::repeat_byte(0xab), 32),
        )]);
        assert_eq!(args.bytes("hash").unwrap(), format!("0x{}", "ab".repeat(32)));
    }
}
