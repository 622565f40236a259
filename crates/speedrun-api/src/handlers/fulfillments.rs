use super::with_db_timeout;
use crate::dto::PageQuery;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use speedrun_storage::Pagination;
use speedrun_types::common::parse_bytes32;

pub async fn list_fulfillments(State(state): State<AppState>, Query(q): Query<PageQuery>) -> Result<impl IntoResponse, ApiError> {
    let pagination = Pagination::new(q.page.unwrap_or(1), q.page_size.unwrap_or(Pagination::DEFAULT_PAGE_SIZE));
    let page = with_db_timeout(&state, state.gateway.list_fulfillments(pagination)).await?;
    Ok(Json(page))
}

pub async fn get_fulfillment(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let id = parse_bytes32(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let fulfillment = with_db_timeout(&state, state.gateway.get_fulfillment(id))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(fulfillment))
}
