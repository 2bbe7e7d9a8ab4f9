//! Reports API endpoints.

use axum::{Json, extract::State};
use engine::{BudgetPerformanceReport, CashFlowReport, GoalProgressReport, ReportWindow};
use serde::Deserialize;

use crate::{ServerError, server::ServerState};

#[derive(Debug, Deserialize)]
pub struct CashFlowRequest {
    pub user_id: String,
    #[serde(default)]
    pub yearly: bool,
    #[serde(default)]
    pub monthly: bool,
}

impl CashFlowRequest {
    fn window(&self) -> ReportWindow {
        ReportWindow {
            yearly: self.yearly,
            monthly: self.monthly,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BudgetPerformanceRequest {
    pub user_id: String,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct GoalProgressRequest {
    pub user_id: String,
}

pub async fn spending(
    State(state): State<ServerState>,
    Json(payload): Json<CashFlowRequest>,
) -> Result<Json<CashFlowReport>, ServerError> {
    let report = state
        .engine
        .spending_report(&payload.user_id, payload.window())
        .await?;
    Ok(Json(report))
}

pub async fn income(
    State(state): State<ServerState>,
    Json(payload): Json<CashFlowRequest>,
) -> Result<Json<CashFlowReport>, ServerError> {
    let report = state
        .engine
        .income_report(&payload.user_id, payload.window())
        .await?;
    Ok(Json(report))
}

pub async fn budget_performance(
    State(state): State<ServerState>,
    Json(payload): Json<BudgetPerformanceRequest>,
) -> Result<Json<BudgetPerformanceReport>, ServerError> {
    let report = state
        .engine
        .budget_performance(&payload.user_id, payload.year, payload.month)
        .await?;
    Ok(Json(report))
}

pub async fn goal_progress(
    State(state): State<ServerState>,
    Json(payload): Json<GoalProgressRequest>,
) -> Result<Json<GoalProgressReport>, ServerError> {
    let report = state.engine.goal_progress(&payload.user_id).await?;
    Ok(Json(report))
}
