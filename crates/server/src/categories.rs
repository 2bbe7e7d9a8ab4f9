//! Categories API endpoints.

use axum::{Json, extract::State, http::StatusCode};
use engine::{Category, CategoryListFilter, CategoryUpdate, NewCategory, Page};

use crate::{ById, ListRequest, MutationResponse, ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<NewCategory>,
) -> Result<(StatusCode, Json<MutationResponse>), ServerError> {
    let id = state.engine.create_category(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::success("category created", Some(id))),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<Category>, ServerError> {
    let record = state.engine.category(&payload.id, &payload.user_id).await?;
    Ok(Json(record))
}

pub async fn list(
    State(state): State<ServerState>,
    Json(payload): Json<ListRequest<CategoryListFilter>>,
) -> Result<Json<Page<Category>>, ServerError> {
    let page = state
        .engine
        .list_categories(&payload.filter, payload.page)
        .await?;
    Ok(Json(page))
}

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<MutationResponse>, ServerError> {
    let id = payload.id.clone();
    state.engine.update_category(payload).await?;
    Ok(Json(MutationResponse::success("category updated", Some(id))))
}

pub async fn delete(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<MutationResponse>, ServerError> {
    state
        .engine
        .delete_category(&payload.id, &payload.user_id)
        .await?;
    Ok(Json(MutationResponse::success(
        "category deleted",
        Some(payload.id),
    )))
}
