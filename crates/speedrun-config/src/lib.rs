//! # Speedrun Config
//!
//! Environment-sourced configuration, loaded once at startup and shared
//! read-only thereafter (grounded in `solver_config::ConfigLoader`, adapted
//! from that crate's file+env layering to the distilled spec's pure-env
//! model — see §6.1 of `SPEC_FULL.md`).

mod error;
mod types;

pub use error::ConfigError;
pub use types::{ChainEndpoint, Config, FeatureFlags, IngestionTuning};

use speedrun_types::common::parse_address;
use speedrun_types::ChainId;
use std::collections::HashMap;
use std::env;

/// Chain-name aliases the loader recognizes for `<CHAIN>_RPC_URL`, mirroring
/// the well-known chain ids `solver_types::chains::ChainId` carries as
/// associated constants in the teacher crate.
const KNOWN_CHAINS: &[(&str, u64)] = &[
	("ETHEREUM", 1),
	("BASE", 8453),
	("ARBITRUM", 42161),
	("OPTIMISM", 10),
	("POLYGON", 137),
	("BSC", 56),
	("AVALANCHE", 43114),
];

impl Config {
	/// Loads configuration from the process environment. Fails fast with a
	/// `ConfigError` rather than panicking — the binary's `main` maps this
	/// to a clean non-zero exit (§7: `ConfigError` is fatal at startup).
	pub fn from_env() -> Result<Self, ConfigError> {
		let database_url =
			env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;

		let port = parse_env_or("PORT", 8080u16)?;
		let metrics_port = parse_env_or("METRICS_PORT", 9090u16)?;

		let zetachain_rpc_url = env::var("ZETACHAIN_RPC_URL")
			.map_err(|_| ConfigError::MissingVar("ZETACHAIN_RPC_URL"))?;
		let zetachain_chain_id: u64 = parse_env_or("ZETACHAIN_CHAIN_ID", 7000u64)?;

		let mut chains = HashMap::new();
		chains.insert(
			ChainId(zetachain_chain_id),
			ChainEndpoint {
				name: "zetachain".to_string(),
				rpc_url: zetachain_rpc_url.clone(),
				gateway_address: gateway_address_for("ZETACHAIN")?,
			},
		);

		for (name, id) in KNOWN_CHAINS {
			let var = format!("{name}_RPC_URL");
			if let Ok(url) = env::var(&var) {
				chains.insert(
					ChainId(*id),
					ChainEndpoint {
						name: name.to_ascii_lowercase(),
						rpc_url: url,
						gateway_address: gateway_address_for(name)?,
					},
				);
			}
		}

		// Generic fallback for chains without a well-known name alias,
		// mirroring `ConfigLoader::apply_env_overrides`'s `RPC_URL_<id>` scan.
		for (key, value) in env::vars() {
			if let Some(id_str) = key.strip_prefix("CHAIN_RPC_URL_") {
				if let Ok(id) = id_str.parse::<u64>() {
					let gateway_var = format!("CHAIN_GATEWAY_ADDRESS_{id_str}");
					let gateway_address = env::var(&gateway_var)
						.ok()
						.map(|raw| parse_address(&raw).map_err(|_| ConfigError::InvalidValue("gateway address", raw)))
						.transpose()?;
					chains.entry(ChainId(id)).or_insert(ChainEndpoint {
						name: format!("chain-{id}"),
						rpc_url: value,
						gateway_address,
					});
				}
			}
		}

		if chains.len() <= 1 {
			return Err(ConfigError::NoChainsConfigured);
		}

		let allowed_origins = env::var("ALLOWED_ORIGINS")
			.unwrap_or_default()
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
			.collect::<Vec<_>>();

		let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
		let log_json = env::var("LOG_FORMAT")
			.map(|v| v.eq_ignore_ascii_case("json"))
			.unwrap_or(false);

		let tuning = IngestionTuning {
			catchup_window_size: parse_env_or("CATCHUP_WINDOW_SIZE", 1000u64)?,
			heartbeat_interval_secs: parse_env_or("HEARTBEAT_INTERVAL_SECS", 15u64)?,
			supervisor_interval_secs: parse_env_or("SUPERVISOR_INTERVAL_SECS", 30u64)?,
			supervisor_max_concurrent_restarts: parse_env_or("SUPERVISOR_MAX_RESTARTS", 3u64)?,
			supervisor_max_consecutive_failures: parse_env_or(
				"SUPERVISOR_MAX_CONSECUTIVE_FAILURES",
				5u64,
			)?,
			shutdown_timeout_secs: parse_env_or("SHUTDOWN_TIMEOUT_SECS", 30u64)?,
			rpc_timeout_secs: parse_env_or("RPC_TIMEOUT_SECS", 15u64)?,
			db_timeout_secs: parse_env_or("DB_TIMEOUT_SECS", 10u64)?,
		};

		let feature_flags = FeatureFlags {
			target_chain_zero_fallback: parse_env_or("TARGET_CHAIN_ZERO_FALLBACK", true)?,
		};

		let config = Config {
			database_url,
			port,
			metrics_port,
			zetachain_chain_id: ChainId(zetachain_chain_id),
			chains,
			allowed_origins,
			log_level,
			log_json,
			tuning,
			feature_flags,
		};

		config.validate()?;
		Ok(config)
	}
}

/// `<NAME>_GATEWAY_ADDRESS`, parsed if present. Absent entirely is fine — it
/// just means this chain's worker applies no address filter.
fn gateway_address_for(name: &str) -> Result<Option<speedrun_types::Address>, ConfigError> {
	let var = format!("{name}_GATEWAY_ADDRESS");
	match env::var(&var) {
		Ok(raw) => parse_address(&raw)
			.map(Some)
			.map_err(|_| ConfigError::InvalidValue("gateway address", raw)),
		Err(_) => Ok(None),
	}
}

fn parse_env_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
	T: std::str::FromStr,
{
	match env::var(key) {
		Ok(raw) => raw
			.parse()
			.map_err(|_| ConfigError::InvalidValue(key, raw)),
		Err(_) => Ok(default),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	// Environment variables are process-global; serialize the tests that
	// touch them so they don't interleave.
	static ENV_LOCK: Mutex<()> = Mutex::new(());

	fn clear_speedrun_env() {
		for (key, _) in env::vars() {
			if key.ends_with("_RPC_URL")
				|| key.starts_with("CHAIN_RPC_URL_")
				|| key.ends_with("_GATEWAY_ADDRESS")
				|| key.starts_with("CHAIN_GATEWAY_ADDRESS_")
				|| matches!(
					key.as_str(),
					"DATABASE_URL"
						| "PORT" | "METRICS_PORT"
						| "ZETACHAIN_RPC_URL"
						| "ZETACHAIN_CHAIN_ID"
						| "ALLOWED_ORIGINS"
						| "LOG_LEVEL" | "LOG_FORMAT"
				)
			{
				env::remove_var(key);
			}
		}
	}

	#[test]
	fn missing_database_url_is_fatal() {
		let _guard = ENV_LOCK.lock().unwrap();
		clear_speedrun_env();
		let err = Config::from_env().unwrap_err();
		assert!(matches!(err, ConfigError::MissingVar("DATABASE_URL")));
	}

	#[test]
	fn loads_known_and_generic_chain_endpoints() {
		let _guard = ENV_LOCK.lock().unwrap();
		clear_speedrun_env();
		env::set_var("DATABASE_URL", "postgres://localhost/speedrun");
		env::set_var("ZETACHAIN_RPC_URL", "https://zeta.example");
		env::set_var("BASE_RPC_URL", "https://base.example");
		env::set_var("CHAIN_RPC_URL_999", "https://custom.example");

		let config = Config::from_env().unwrap();
		assert_eq!(
			config.chains.get(&ChainId(8453)).unwrap().rpc_url,
			"https://base.example"
		);
		assert_eq!(
			config.chains.get(&ChainId(999)).unwrap().rpc_url,
			"https://custom.example"
		);

		env::remove_var("DATABASE_URL");
		env::remove_var("ZETACHAIN_RPC_URL");
		env::remove_var("BASE_RPC_URL");
		env::remove_var("CHAIN_RPC_URL_999");
	}

	#[test]
	fn empty_allowed_origins_means_wildcard() {
		let _guard = ENV_LOCK.lock().unwrap();
		clear_speedrun_env();
		env::set_var("DATABASE_URL", "postgres://localhost/speedrun");
		env::set_var("ZETACHAIN_RPC_URL", "https://zeta.example");
		env::set_var("BASE_RPC_URL", "https://base.example");

		let config = Config::from_env().unwrap();
		assert!(config.allowed_origins.is_empty());

		env::remove_var("DATABASE_URL");
		env::remove_var("ZETACHAIN_RPC_URL");
		env::remove_var("BASE_RPC_URL");
	}
}
