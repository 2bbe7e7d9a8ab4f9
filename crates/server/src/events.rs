//! Event ingress: hands raw payloads to the engine intake channel. The body
//! is not decoded here; bad payloads are logged and dropped by the intake.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use engine::InboundMessage;

use crate::{MutationResponse, ServerError, server::ServerState};

pub async fn publish(
    State(state): State<ServerState>,
    Path(topic): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<MutationResponse>), ServerError> {
    let message = InboundMessage::new(topic, body.to_vec());
    state
        .events
        .send(message)
        .await
        .map_err(|_| ServerError::Unavailable("event intake is not running".to_string()))?;
    Ok((
        StatusCode::ACCEPTED,
        Json(MutationResponse::success("event queued", None)),
    ))
}
