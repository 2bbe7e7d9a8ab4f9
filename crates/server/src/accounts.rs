//! Accounts API endpoints.

use axum::{Json, extract::State, http::StatusCode};
use engine::{Account, AccountListFilter, AccountUpdate, NewAccount, Page};

use crate::{ById, ListRequest, MutationResponse, ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<NewAccount>,
) -> Result<(StatusCode, Json<MutationResponse>), ServerError> {
    let id = state.engine.create_account(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::success("account created", Some(id))),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<Account>, ServerError> {
    let account = state.engine.account(&payload.id, &payload.user_id).await?;
    Ok(Json(account))
}

pub async fn list(
    State(state): State<ServerState>,
    Json(payload): Json<ListRequest<AccountListFilter>>,
) -> Result<Json<Page<Account>>, ServerError> {
    let page = state
        .engine
        .list_accounts(&payload.filter, payload.page)
        .await?;
    Ok(Json(page))
}

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<MutationResponse>, ServerError> {
    let id = payload.id.clone();
    state.engine.update_account(payload).await?;
    Ok(Json(MutationResponse::success("account updated", Some(id))))
}

pub async fn delete(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<MutationResponse>, ServerError> {
    state
        .engine
        .delete_account(&payload.id, &payload.user_id)
        .await?;
    Ok(Json(MutationResponse::success(
        "account deleted",
        Some(payload.id),
    )))
}
