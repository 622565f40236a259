//! # Speedrun Chains
//!
//! The Chain Client Registry (§4.A): one `alloy` HTTP provider per configured
//! chain, connected and probed eagerly at startup, exposed to the rest of the
//! pipeline through the [`ChainAdapter`](speedrun_types::chains::ChainAdapter)
//! trait so decoding, ingestion, and the API never touch `alloy` directly.

mod adapter;
mod error;
mod registry;

pub use adapter::AlloyChainAdapter;
pub use error::ChainRegistryError;
pub use registry::ChainClientRegistry;
