use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("data integrity violation: {0}")]
    Integrity(String),

    #[error("operation timed out")]
    Timeout,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => StoreError::Connection(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

impl StoreError {
    /// `true` when the failure is worth one jittered retry (a dropped
    /// connection or a timed-out pool acquire) rather than an immediate
    /// worker halt (§4.D/§8): a bad query or an integrity violation will
    /// not succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Timeout)
    }
}
