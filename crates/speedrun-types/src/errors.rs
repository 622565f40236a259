//! Cross-crate error type.
//!
//! Each crate defines its own `thiserror` enum for the errors it can
//! produce (`ChainError`, `DecodeError`, `StoreError`, ...); this enum is
//! the one callers see at crate boundaries where several of those need to
//! collapse into one `Result`, mirroring `solver_types::errors::SolverError`
//! in the teacher crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpeedrunError>;

#[derive(Error, Debug)]
pub enum SpeedrunError {
	#[error("configuration error: {0}")]
	Config(String),

	#[error("rpc error: {0}")]
	Rpc(String),

	#[error("decode error: {0}")]
	Decode(String),

	#[error("store error: {0}")]
	Store(String),

	#[error("lifecycle error: {0}")]
	Lifecycle(String),

	#[error("validation error: {0}")]
	Validation(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("timeout: {0}")]
	Timeout(String),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}
