use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("log has no topic0")]
    MissingTopic0,

    #[error("topic0 {0:#x} does not match any known event for this kind")]
    UnknownTopic(alloy::primitives::B256),

    #[error("abi decode failed: {0}")]
    Abi(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}
