use speedrun_types::{Address, ChainId};
use std::collections::HashMap;

/// A single chain's RPC endpoint, as resolved by the Chain Client Registry.
#[derive(Debug, Clone)]
pub struct ChainEndpoint {
	pub name: String,
	pub rpc_url: String,
	/// The intent-gateway contract address on this chain, if configured via
	/// `<CHAIN>_GATEWAY_ADDRESS`. `None` means the ingestion worker applies
	/// no address filter for this chain — topic0 alone selects the events.
	pub gateway_address: Option<Address>,
}

/// Tunables for ingestion, the supervisor, and outbound call deadlines —
/// named directly after the defaults called out in §4/§5 of the spec so
/// operators can override any of them without a code change.
#[derive(Debug, Clone, Copy)]
pub struct IngestionTuning {
	pub catchup_window_size: u64,
	pub heartbeat_interval_secs: u64,
	pub supervisor_interval_secs: u64,
	pub supervisor_max_concurrent_restarts: u64,
	pub supervisor_max_consecutive_failures: u64,
	pub shutdown_timeout_secs: u64,
	pub rpc_timeout_secs: u64,
	pub db_timeout_secs: u64,
}

impl IngestionTuning {
	/// `T_stall`, per §4.E: twice the heartbeat period by default.
	pub fn stall_threshold_secs(&self) -> u64 {
		2 * self.heartbeat_interval_secs
	}
}

/// Open-question feature flags from §9, decided per-deployment rather than
/// baked into the binary.
#[derive(Debug, Clone, Copy)]
pub struct FeatureFlags {
	/// When `true` (default), `targetChain == 0` on `Initiated` is
	/// reinterpreted as `source_chain` with a warning metric. When `false`,
	/// such records are decoded as-is (target chain `0`).
	pub target_chain_zero_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub port: u16,
	pub metrics_port: u16,
	pub zetachain_chain_id: ChainId,
	pub chains: HashMap<ChainId, ChainEndpoint>,
	pub allowed_origins: Vec<String>,
	pub log_level: String,
	pub log_json: bool,
	pub tuning: IngestionTuning,
	pub feature_flags: FeatureFlags,
}

impl Config {
	pub(crate) fn validate(&self) -> Result<(), crate::error::ConfigError> {
		if self.chains.is_empty() {
			return Err(crate::error::ConfigError::NoChainsConfigured);
		}
		Ok(())
	}

	pub fn non_zetachain_ids(&self) -> Vec<ChainId> {
		self.chains
			.keys()
			.filter(|id| **id != self.zetachain_chain_id)
			.copied()
			.collect()
	}
}
