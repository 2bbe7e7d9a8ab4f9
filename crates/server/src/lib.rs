use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, PageRequest};

use serde::{Deserialize, Serialize};
pub use server::{ServerState, router, run_with_listener, spawn_with_listener};

mod accounts;
mod balances;
mod budgets;
mod categories;
mod events;
mod goals;
mod notifications;
mod reports;
mod server;
mod transactions;

pub enum ServerError {
    Engine(EngineError),
    Unavailable(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

/// Body of every mutation answer.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MutationResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            id,
        }
    }
}

/// Selects one record of a user.
#[derive(Debug, Deserialize)]
pub struct ById {
    pub id: String,
    pub user_id: String,
}

/// Filter plus page window of a list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListRequest<F> {
    #[serde(default)]
    pub filter: F,
    #[serde(default)]
    pub page: PageRequest,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidDate(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Decode(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Decode(decode_err) => {
            tracing::error!("stored document error: {decode_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Unavailable(err) => (StatusCode::SERVICE_UNAVAILABLE, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
