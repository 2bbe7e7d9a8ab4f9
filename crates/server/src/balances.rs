use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub account_id: String,
    /// `null` when the running balance is not known.
    pub balance_minor: Option<i64>,
}

pub async fn get(
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance_minor = state.engine.balance(&account_id).await?;
    Ok(Json(BalanceView {
        account_id,
        balance_minor,
    }))
}

pub async fn recompute(
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = state.engine.recompute_balance(&account_id).await?;
    Ok(Json(BalanceView {
        account_id,
        balance_minor: Some(balance),
    }))
}
