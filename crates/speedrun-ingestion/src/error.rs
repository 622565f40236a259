use speedrun_types::chains::ChainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("store error: {0}")]
    Store(#[from] speedrun_storage::StoreError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] speedrun_lifecycle::LifecycleError),
}
