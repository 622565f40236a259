use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("store error: {0}")]
    Store(#[from] speedrun_storage::StoreError),

    #[error("refusing to build intent {intent_id}: {reason}")]
    InvalidIntent { intent_id: String, reason: &'static str },
}

impl LifecycleError {
    /// Delegates to [`speedrun_storage::StoreError::is_transient`] — an
    /// invalid-intent rejection is never worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, LifecycleError::Store(e) if e.is_transient())
    }
}
