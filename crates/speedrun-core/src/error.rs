use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("chain registry error: {0}")]
    ChainRegistry(#[from] speedrun_chains::ChainRegistryError),

    #[error("storage error: {0}")]
    Store(#[from] speedrun_storage::StoreError),

    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("http server error: {0}")]
    Http(String),
}
