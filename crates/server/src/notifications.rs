//! Notifications API endpoints. Notifications are never edited, only marked
//! read.

use axum::{Json, extract::State, http::StatusCode};
use engine::{NewNotification, Notification, NotificationListFilter, Page};

use crate::{ById, ListRequest, MutationResponse, ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<NewNotification>,
) -> Result<(StatusCode, Json<MutationResponse>), ServerError> {
    let id = state.engine.create_notification(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::success("notification created", Some(id))),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<Notification>, ServerError> {
    let notification = state
        .engine
        .notification(&payload.id, &payload.user_id)
        .await?;
    Ok(Json(notification))
}

pub async fn list(
    State(state): State<ServerState>,
    Json(payload): Json<ListRequest<NotificationListFilter>>,
) -> Result<Json<Page<Notification>>, ServerError> {
    let page = state
        .engine
        .list_notifications(&payload.filter, payload.page)
        .await?;
    Ok(Json(page))
}

pub async fn mark_read(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<MutationResponse>, ServerError> {
    state
        .engine
        .mark_notification_read(&payload.id, &payload.user_id)
        .await?;
    Ok(Json(MutationResponse::success(
        "notification marked as read",
        Some(payload.id),
    )))
}

pub async fn delete(
    State(state): State<ServerState>,
    Json(payload): Json<ById>,
) -> Result<Json<MutationResponse>, ServerError> {
    state
        .engine
        .delete_notification(&payload.id, &payload.user_id)
        .await?;
    Ok(Json(MutationResponse::success(
        "notification deleted",
        Some(payload.id),
    )))
}
