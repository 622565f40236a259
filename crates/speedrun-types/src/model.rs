//! Persisted entities — §3 of the specification.

use crate::common::{Address, BlockNumber, Bytes32, ChainId, Timestamp, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
	Pending,
	Fulfilled,
	Settled,
}

impl IntentStatus {
	/// Numeric rank used both in Rust and mirrored in SQL (`status_rank`)
	/// so that a monotonic-status upsert can be expressed as a single
	/// `WHERE new_rank >= old_rank` guard instead of a check-then-write.
	pub fn rank(&self) -> i16 {
		match self {
			IntentStatus::Pending => 0,
			IntentStatus::Fulfilled => 1,
			IntentStatus::Settled => 2,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			IntentStatus::Pending => "pending",
			IntentStatus::Fulfilled => "fulfilled",
			IntentStatus::Settled => "settled",
		}
	}

	pub fn from_str_opt(s: &str) -> Option<Self> {
		match s {
			"pending" => Some(IntentStatus::Pending),
			"fulfilled" => Some(IntentStatus::Fulfilled),
			"settled" => Some(IntentStatus::Settled),
			_ => None,
		}
	}

	/// `true` when advancing from `self` to `next` is a permitted monotonic
	/// transition (including the identity transition, which is always a
	/// no-op-but-valid per §4.F).
	pub fn can_advance_to(&self, next: IntentStatus) -> bool {
		next.rank() >= self.rank()
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
	pub id: Bytes32,
	pub source_chain: ChainId,
	pub destination_chain: ChainId,
	pub token: Address,
	#[serde(with = "crate::common::amount_str")]
	pub amount: U256,
	#[serde(with = "crate::common::amount_str")]
	pub tip: U256,
	pub sender: Address,
	pub recipient: Address,
	pub is_call: bool,
	pub call_data: Option<Vec<u8>>,
	pub status: IntentStatus,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
	pub timestamp_is_fallback: bool,
	pub block_number: BlockNumber,
	pub tx_hash: Bytes32,
	/// Set when `target_chain == 0` was observed and remapped to
	/// `source_chain` per §4.B/§9.
	pub target_chain_fallback: bool,
	/// `true` for a row created from a `Fulfilled`/`Settled` record that
	/// arrived before its `Initiated`, per §4.F. Identity fields on a
	/// placeholder are best-effort guesses and get overwritten — never the
	/// other way around — once the real `Initiated` arrives.
	pub is_placeholder: bool,
}

impl Intent {
	/// `source_chain != destination_chain` and `amount > 0`, per §3.
	pub fn validate_invariants(&self) -> Result<(), &'static str> {
		if self.source_chain == self.destination_chain {
			return Err("source_chain must differ from destination_chain");
		}
		if self.amount.is_zero() {
			return Err("amount must be greater than zero");
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fulfillment {
	pub id: Bytes32,
	pub intent_id: Bytes32,
	pub asset: Address,
	#[serde(with = "crate::common::amount_str")]
	pub amount: U256,
	pub receiver: Address,
	pub is_call: bool,
	pub call_data: Option<Vec<u8>>,
	pub block_number: BlockNumber,
	pub tx_hash: Bytes32,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
	pub id: Bytes32,
	pub intent_id: Bytes32,
	pub asset: Address,
	#[serde(with = "crate::common::amount_str")]
	pub amount: U256,
	#[serde(with = "crate::common::amount_str")]
	pub actual_amount: U256,
	pub receiver: Address,
	pub fulfilled: bool,
	pub fulfiller: Address,
	#[serde(with = "crate::common::amount_str")]
	pub paid_tip: U256,
	pub is_call: bool,
	pub call_data: Option<Vec<u8>>,
	pub block_number: BlockNumber,
	pub tx_hash: Bytes32,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

/// Outcome of an idempotent upsert, per §4.C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
	Inserted,
	Updated,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_monotonicity_matrix() {
		use IntentStatus::*;
		assert!(Pending.can_advance_to(Pending));
		assert!(Pending.can_advance_to(Fulfilled));
		assert!(Pending.can_advance_to(Settled));
		assert!(Fulfilled.can_advance_to(Settled));
		assert!(!Fulfilled.can_advance_to(Pending));
		assert!(!Settled.can_advance_to(Fulfilled));
		assert!(!Settled.can_advance_to(Pending));
	}

	#[test]
	fn status_str_roundtrip() {
		for status in [IntentStatus::Pending, IntentStatus::Fulfilled, IntentStatus::Settled] {
			assert_eq!(IntentStatus::from_str_opt(status.as_str()), Some(status));
		}
	}
}
