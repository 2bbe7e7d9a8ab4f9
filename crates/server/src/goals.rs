//! Goals API endpoints.

use axum::{Json, extract::State, http::StatusCode};
use engine::{Goal, GoalListFilter, GoalUpdate, NewGoal, Page};

use crate::{ById, ListRequest, MutationResponse, ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<NewGoal>,
) -> Result<(StatusCode, Json<MutationResponse>), ServerError> {
    let id = state.engine.create_goal(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::success("goal created", Some(id))),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<Goal>, ServerError> {
    let record = state.engine.goal(&payload.id, &payload.user_id).await?;
    Ok(Json(record))
}

pub async fn list(
    State(state): State<ServerState>,
    Json(payload): Json<ListRequest<GoalListFilter>>,
) -> Result<Json<Page<Goal>>, ServerError> {
    let page = state
        .engine
        .list_goals(&payload.filter, payload.page)
        .await?;
    Ok(Json(page))
}

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<MutationResponse>, ServerError> {
    let id = payload.id.clone();
    state.engine.update_goal(payload).await?;
    Ok(Json(MutationResponse::success("goal updated", Some(id))))
}

pub async fn delete(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<MutationResponse>, ServerError> {
    state
        .engine
        .delete_goal(&payload.id, &payload.user_id)
        .await?;
    Ok(Json(MutationResponse::success(
        "goal deleted",
        Some(payload.id),
    )))
}
