use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("ingestion worker task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}
