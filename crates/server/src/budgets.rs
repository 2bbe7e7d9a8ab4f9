//! Budgets API endpoints.

use axum::{Json, extract::State, http::StatusCode};
use engine::{Budget, BudgetListFilter, BudgetUpdate, NewBudget, Page};

use crate::{ById, ListRequest, MutationResponse, ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<NewBudget>,
) -> Result<(StatusCode, Json<MutationResponse>), ServerError> {
    let id = state.engine.create_budget(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::success("budget created", Some(id))),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<Budget>, ServerError> {
    let record = state.engine.budget(&payload.id, &payload.user_id).await?;
    Ok(Json(record))
}

pub async fn list(
    State(state): State<ServerState>,
    Json(payload): Json<ListRequest<BudgetListFilter>>,
) -> Result<Json<Page<Budget>>, ServerError> {
    let page = state
        .engine
        .list_budgets(&payload.filter, payload.page)
        .await?;
    Ok(Json(page))
}

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<MutationResponse>, ServerError> {
    let id = payload.id.clone();
    state.engine.update_budget(payload).await?;
    Ok(Json(MutationResponse::success("budget updated", Some(id))))
}

pub async fn delete(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<MutationResponse>, ServerError> {
    state
        .engine
        .delete_budget(&payload.id, &payload.user_id)
        .await?;
    Ok(Json(MutationResponse::success(
        "budget deleted",
        Some(payload.id),
    )))
}
