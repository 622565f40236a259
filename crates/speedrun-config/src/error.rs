use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("missing required environment variable: {0}")]
	MissingVar(&'static str),

	#[error("invalid value for {0}: {1:?}")]
	InvalidValue(&'static str, String),

	#[error("no chain RPC endpoints configured (besides ZetaChain)")]
	NoChainsConfigured,
}
