use speedrun_types::ChainId;
use thiserror::Error;

/// Fatal at startup: the Chain Client Registry eagerly probes every
/// configured chain and refuses to come up if one is unreachable (§4.A).
#[derive(Error, Debug)]
pub enum ChainRegistryError {
    #[error("chain {chain_id} ({name}) failed startup probe: {source}")]
    ProbeFailed {
        chain_id: ChainId,
        name: String,
        source: String,
    },

    #[error("invalid rpc url for chain {chain_id} ({name}): {source}")]
    InvalidUrl {
        chain_id: ChainId,
        name: String,
        source: String,
    },
}
