//! Transactions API endpoints.

use axum::{Json, extract::State, http::StatusCode};
use engine::{Transaction, TransactionListFilter, TransactionUpdate, NewTransaction, Page};

use crate::{ById, ListRequest, MutationResponse, ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<NewTransaction>,
) -> Result<(StatusCode, Json<MutationResponse>), ServerError> {
    let id = state.engine.create_transaction(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::success("transaction created", Some(id))),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<Transaction>, ServerError> {
    let record = state.engine.transaction(&payload.id, &payload.user_id).await?;
    Ok(Json(record))
}

pub async fn list(
    State(state): State<ServerState>,
    Json(payload): Json<ListRequest<TransactionListFilter>>,
) -> Result<Json<Page<Transaction>>, ServerError> {
    let page = state
        .engine
        .list_transactions(&payload.filter, payload.page)
        .await?;
    Ok(Json(page))
}

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<MutationResponse>, ServerError> {
    let id = payload.id.clone();
    state.engine.update_transaction(payload).await?;
    Ok(Json(MutationResponse::success("transaction updated", Some(id))))
}

pub async fn delete(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<MutationResponse>, ServerError> {
    state
        .engine
        .delete_transaction(&payload.id, &payload.user_id)
        .await?;
    Ok(Json(MutationResponse::success(
        "transaction deleted",
        Some(payload.id),
    )))
}
