pub mod fulfillments;
pub mod health;
pub mod intents;

use crate::error::ApiError;
use crate::state::AppState;
use std::future::Future;

/// Every gateway call on the read path goes through this so `DB_TIMEOUT_SECS`
/// (§5: a 10s default) is enforced uniformly instead of per-handler.
pub(crate) async fn with_db_timeout<T, F>(state: &AppState, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, speedrun_storage::StoreError>>,
{
    let result = tokio::time::timeout(state.db_timeout, fut).await?;
    Ok(result?)
}
