//! Chain adapter trait — the seam the Chain Client Registry (`speedrun-chains`)
//! implements and every other crate programs against.

use crate::common::{Address, BlockNumber, Bytes32, ChainId, Timestamp};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
	#[error("rpc call failed: {0}")]
	Rpc(String),

	#[error("chain {0} is not registered")]
	UnknownChain(ChainId),

	#[error("timed out waiting for rpc response")]
	Timeout,
}

pub type ChainResult<T> = Result<T, ChainError>;

/// A single decoded-free log entry: topics + data, as returned by `eth_getLogs`.
#[derive(Debug, Clone)]
pub struct Log {
	pub address: Address,
	pub topics: Vec<Bytes32>,
	pub data: Vec<u8>,
	pub block_number: BlockNumber,
	pub transaction_hash: Bytes32,
	pub log_index: u64,
}

/// Block timestamp plus a flag saying whether it had to fall back to a
/// header-only fetch (full-block fetch failed but the header round-trip
/// succeeded), per the two-tier lookup in §4.A.
#[derive(Debug, Clone, Copy)]
pub struct BlockTime {
	pub timestamp: Timestamp,
	pub header_only: bool,
}

/// Read-only per-chain adapter. One implementation (`speedrun_chains::AlloyChainAdapter`)
/// wraps an `alloy` HTTP provider; tests use an in-memory fake.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
	fn chain_id(&self) -> ChainId;

	/// Current chain head.
	async fn block_number(&self) -> ChainResult<BlockNumber>;

	/// Block timestamp via the two-tier fallback described in §4.A: a full
	/// block fetch first, then a header-only fetch if that fails.
	async fn block_time(&self, number: BlockNumber) -> ChainResult<BlockTime>;

	/// Logs matching `addresses`/`topic0` in `[from_block, to_block]` inclusive.
	async fn get_logs(
		&self,
		addresses: &[Address],
		topic0: Bytes32,
		from_block: BlockNumber,
		to_block: BlockNumber,
	) -> ChainResult<Vec<Log>>;

	/// Resolves the `from` address of the transaction that emitted a log.
	/// `IntentInitiated` carries no `sender` topic of its own (see §6), so the
	/// decoder takes it as an input rather than deriving it from the log —
	/// this is where the ingestion worker looks it up.
	async fn transaction_sender(&self, tx_hash: Bytes32) -> ChainResult<Address>;
}
