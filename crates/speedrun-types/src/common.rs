//! Common scalar types shared across the indexing pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export the primitive types the rest of the workspace builds on. Keeping
// these behind one module means a future primitives crate swap only touches
// this file.
pub use alloy::primitives::{Address, B256 as Bytes32, U256};

/// Chain identifier (EVM chain id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ChainId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(ChainId(s.parse()?))
	}
}

/// Block number on a source or destination chain.
pub type BlockNumber = u64;

/// Unix-second timestamp, sourced from block time wherever possible.
pub type Timestamp = i64;

/// The three on-chain events the indexer correlates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	Initiated,
	Fulfilled,
	Settled,
}

impl EventKind {
	pub const ALL: [EventKind; 3] = [EventKind::Initiated, EventKind::Fulfilled, EventKind::Settled];

	/// Stable lowercase identifier used as a storage/cursor key component.
	pub fn as_str(&self) -> &'static str {
		match self {
			EventKind::Initiated => "initiated",
			EventKind::Fulfilled => "fulfilled",
			EventKind::Settled => "settled",
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Amount serialization as a base-10 digit string — never a binary float.
///
/// `U256` already `Display`s as decimal and `FromStr`s from decimal, so this
/// module just wires that through serde for the JSON/DB string boundary.
pub mod amount_str {
	use super::U256;
	use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(value)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
		let raw = String::deserialize(deserializer)?;
		U256::from_str_radix(raw.trim(), 10).map_err(D::Error::custom)
	}
}

/// Renders a 20-byte address as `0x`-prefixed lowercase hex.
pub fn address_to_hex(addr: &Address) -> String {
	format!("0x{}", hex::encode(addr.as_slice()))
}

/// Renders a 32-byte value as `0x`-prefixed lowercase hex.
pub fn bytes32_to_hex(value: &Bytes32) -> String {
	format!("0x{}", hex::encode(value.as_slice()))
}

/// Parses a `0x`-prefixed 20-byte hex address; rejects any other length.
pub fn parse_address(s: &str) -> Result<Address, AddressParseError> {
	let stripped = s.strip_prefix("0x").ok_or(AddressParseError::MissingPrefix)?;
	let bytes = hex::decode(stripped).map_err(|_| AddressParseError::InvalidHex)?;
	if bytes.len() != 20 {
		return Err(AddressParseError::WrongLength(bytes.len()));
	}
	Ok(Address::from_slice(&bytes))
}

#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
	#[error("address must start with 0x")]
	MissingPrefix,
	#[error("address is not valid hex")]
	InvalidHex,
	#[error("address must be 20 bytes, got {0}")]
	WrongLength(usize),
}

/// Parses a `0x`-prefixed 32-byte hex value (intent ids, tx hashes).
pub fn parse_bytes32(s: &str) -> Result<Bytes32, Bytes32ParseError> {
	let stripped = s.strip_prefix("0x").ok_or(Bytes32ParseError::MissingPrefix)?;
	let bytes = hex::decode(stripped).map_err(|_| Bytes32ParseError::InvalidHex)?;
	if bytes.len() != 32 {
		return Err(Bytes32ParseError::WrongLength(bytes.len()));
	}
	Ok(Bytes32::from_slice(&bytes))
}

#[derive(Debug, thiserror::Error)]
pub enum Bytes32ParseError {
	#[error("value must start with 0x")]
	MissingPrefix,
	#[error("value is not valid hex")]
	InvalidHex,
	#[error("value must be 32 bytes, got {0}")]
	WrongLength(usize),
}

/// Derives a deterministic id for a fulfillment/settlement row from its
/// natural key, so repeated ingestion of the same log always produces the
/// same primary key instead of a fresh random one per run.
pub fn derive_record_id(tx_hash: &Bytes32, intent_id: &Bytes32, log_index: u64) -> Bytes32 {
	let mut preimage = Vec::with_capacity(32 + 32 + 8);
	preimage.extend_from_slice(tx_hash.as_slice());
	preimage.extend_from_slice(intent_id.as_slice());
	preimage.extend_from_slice(&log_index.to_be_bytes());
	alloy::primitives::keccak256(&preimage)
}

#[cfg(test)]
mod derive_record_id_tests {
	use super::*;

	#[test]
	fn derive_record_id_is_deterministic_and_index_sensitive() {
		let tx = Bytes32::from([0x33u8; 32]);
		let intent = Bytes32::from([0x44u8; 32]);
		let a = derive_record_id(&tx, &intent, 0);
		let b = derive_record_id(&tx, &intent, 0);
		let c = derive_record_id(&tx, &intent, 1);
		assert_eq!(a, b);
		assert_ne!(a, c);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn chain_id_display_and_parse() {
		assert_eq!(ChainId(8453).to_string(), "8453");
		assert_eq!("42161".parse::<ChainId>().unwrap(), ChainId(42161));
	}

	#[test]
	fn event_kind_roundtrips_through_str() {
		for kind in EventKind::ALL {
			assert_eq!(kind.to_string(), kind.as_str());
		}
	}

	#[test]
	fn address_hex_roundtrip() {
		let addr = Address::from([0x11u8; 20]);
		let hex_str = address_to_hex(&addr);
		assert_eq!(parse_address(&hex_str).unwrap(), addr);
	}

	#[test]
	fn address_rejects_short_payload() {
		assert!(matches!(
			parse_address("0x1234"),
			Err(AddressParseError::WrongLength(_))
		));
	}

	#[test]
	fn bytes32_hex_roundtrip() {
		let value = Bytes32::from([0x22u8; 32]);
		let hex_str = bytes32_to_hex(&value);
		assert_eq!(parse_bytes32(&hex_str).unwrap(), value);
	}
}
