//! Decoded event records — the output of `speedrun-decoder` (§4.B) and the
//! input to the Correlation / Lifecycle Engine (§4.F).

use crate::common::{Address, BlockNumber, Bytes32, ChainId, U256};
use serde::{Deserialize, Serialize};

/// Provenance shared by every decoded record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
	pub chain_id: ChainId,
	pub block_number: BlockNumber,
	pub tx_hash: Bytes32,
	pub log_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatedRecord {
	pub provenance: Provenance,
	pub intent_id: Bytes32,
	pub asset: Address,
	#[serde(with = "crate::common::amount_str")]
	pub amount: U256,
	pub target_chain: ChainId,
	/// `true` when the raw `targetChain` was `0` and was remapped to the
	/// source chain per §4.B / §9.
	pub target_chain_was_zero: bool,
	pub receiver: Address,
	#[serde(with = "crate::common::amount_str")]
	pub tip: U256,
	#[serde(with = "crate::common::amount_str")]
	pub salt: U256,
	pub sender: Address,
	pub is_call: bool,
	pub call_data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfilledRecord {
	pub provenance: Provenance,
	pub intent_id: Bytes32,
	pub asset: Address,
	#[serde(with = "crate::common::amount_str")]
	pub amount: U256,
	pub receiver: Address,
	pub is_call: bool,
	pub call_data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettledRecord {
	pub provenance: Provenance,
	pub intent_id: Bytes32,
	pub asset: Address,
	#[serde(with = "crate::common::amount_str")]
	pub amount: U256,
	pub receiver: Address,
	pub fulfilled: bool,
	pub fulfiller: Address,
	#[serde(with = "crate::common::amount_str")]
	pub actual_amount: U256,
	#[serde(with = "crate::common::amount_str")]
	pub paid_tip: U256,
	pub is_call: bool,
	pub call_data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DecodedRecord {
	Initiated(InitiatedRecord),
	Fulfilled(FulfilledRecord),
	Settled(SettledRecord),
}

impl DecodedRecord {
	pub fn intent_id(&self) -> Bytes32 {
		match self {
			DecodedRecord::Initiated(r) => r.intent_id,
			DecodedRecord::Fulfilled(r) => r.intent_id,
			DecodedRecord::Settled(r) => r.intent_id,
		}
	}

	pub fn provenance(&self) -> &Provenance {
		match self {
			DecodedRecord::Initiated(r) => &r.provenance,
			DecodedRecord::Fulfilled(r) => &r.provenance,
			DecodedRecord::Settled(r) => &r.provenance,
		}
	}
}
