use super::with_db_timeout;
use crate::dto::{CreateIntentRequest, ListIntentsQuery, PageQuery};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use speedrun_storage::{IntentFilter, Pagination};
use speedrun_types::common::{parse_address, parse_bytes32, ChainId, U256};
use speedrun_types::model::{Intent, IntentStatus};
use validator::Validate;

fn pagination_of(page: Option<u32>, page_size: Option<u32>) -> Pagination {
    Pagination::new(page.unwrap_or(1), page_size.unwrap_or(Pagination::DEFAULT_PAGE_SIZE))
}

pub async fn list_intents(
    State(state): State<AppState>,
    Query(q): Query<ListIntentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = q
        .status
        .as_deref()
        .map(|s| IntentStatus::from_str_opt(s).ok_or_else(|| ApiError::BadRequest(format!("unknown status '{s}'"))))
        .transpose()?;

    let filter = IntentFilter {
        status,
        source_chain: q.source_chain.map(ChainId),
        destination_chain: q.destination_chain.map(ChainId),
    };
    let pagination = pagination_of(q.page, q.page_size);

    let page = with_db_timeout(&state, state.gateway.list_intents(filter, pagination)).await?;
    Ok(Json(page))
}

pub async fn get_intent(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let id = parse_bytes32(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let intent = with_db_timeout(&state, state.gateway.get_intent(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(intent))
}

pub async fn list_intents_by_sender(
    State(state): State<AppState>,
    Path(addr): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let addr = parse_address(&addr).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let pagination = pagination_of(q.page, q.page_size);
    let page = with_db_timeout(&state, state.gateway.list_intents_by_sender(addr, pagination)).await?;
    Ok(Json(page))
}

pub async fn list_intents_by_recipient(
    State(state): State<AppState>,
    Path(addr): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let addr = parse_address(&addr).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let pagination = pagination_of(q.page, q.page_size);
    let page = with_db_timeout(&state, state.gateway.list_intents_by_recipient(addr, pagination)).await?;
    Ok(Json(page))
}

/// Manual-ingest path (§4.G/§6, optional): lets an operator inject an intent
/// the indexer hasn't (yet, or ever will) observe on-chain — e.g. to
/// backfill a record during an incident. Goes through the same invariant
/// checks a decoded `Initiated` record would.
pub async fn create_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateIntentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    req.validate_chains_differ().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let intent_id = parse_bytes32(&req.intent_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let token = parse_address(&req.token).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let sender = parse_address(&req.sender).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let recipient = parse_address(&req.recipient).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let amount = U256::from_str_radix(req.amount.trim(), 10).map_err(|_| ApiError::BadRequest("amount must be a base-10 integer string".into()))?;
    let tip = U256::from_str_radix(req.tip.trim(), 10).map_err(|_| ApiError::BadRequest("tip must be a base-10 integer string".into()))?;

    let now = chrono_now();

    let intent = Intent {
        id: intent_id,
        source_chain: ChainId(req.source_chain),
        destination_chain: ChainId(req.destination_chain),
        token,
        amount,
        tip,
        sender,
        recipient,
        is_call: req.is_call,
        call_data: None,
        status: IntentStatus::Pending,
        created_at: now,
        updated_at: now,
        timestamp_is_fallback: true,
        block_number: 0,
        tx_hash: speedrun_types::common::Bytes32::ZERO,
        target_chain_fallback: false,
        is_placeholder: false,
    };
    intent.validate_invariants().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    with_db_timeout(&state, state.gateway.upsert_intent(intent.clone())).await?;
    Ok((StatusCode::CREATED, Json(intent)))
}

fn chrono_now() -> speedrun_types::common::Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_of_falls_back_to_defaults() {
        let p = pagination_of(None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, Pagination::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn pagination_of_honors_explicit_values() {
        let p = pagination_of(Some(3), Some(25));
        assert_eq!(p.page, 3);
        assert_eq!(p.page_size, 25);
    }
}
