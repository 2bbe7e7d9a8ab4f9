use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::mpsc;

use std::sync::Arc;

use crate::{
    accounts, balances, budgets, categories, events, goals, notifications, reports, transactions,
};
use engine::{Engine, InboundMessage};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Intake channel of the event ingress.
    pub events: mpsc::Sender<InboundMessage>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::create))
        .route("/accounts/get", post(accounts::get))
        .route("/accounts/list", post(accounts::list))
        .route("/accounts/update", post(accounts::update))
        .route("/accounts/delete", post(accounts::delete))
        .route("/accounts/{id}/balance", get(balances::get))
        .route("/accounts/{id}/balance/recompute", post(balances::recompute))
        .route("/transactions", post(transactions::create))
        .route("/transactions/get", post(transactions::get))
        .route("/transactions/list", post(transactions::list))
        .route("/transactions/update", post(transactions::update))
        .route("/transactions/delete", post(transactions::delete))
        .route("/categories", post(categories::create))
        .route("/categories/get", post(categories::get))
        .route("/categories/list", post(categories::list))
        .route("/categories/update", post(categories::update))
        .route("/categories/delete", post(categories::delete))
        .route("/budgets", post(budgets::create))
        .route("/budgets/get", post(budgets::get))
        .route("/budgets/list", post(budgets::list))
        .route("/budgets/update", post(budgets::update))
        .route("/budgets/delete", post(budgets::delete))
        .route("/goals", post(goals::create))
        .route("/goals/get", post(goals::get))
        .route("/goals/list", post(goals::list))
        .route("/goals/update", post(goals::update))
        .route("/goals/delete", post(goals::delete))
        .route("/notifications", post(notifications::create))
        .route("/notifications/get", post(notifications::get))
        .route("/notifications/list", post(notifications::list))
        .route("/notifications/read", post(notifications::mark_read))
        .route("/notifications/delete", post(notifications::delete))
        .route("/reports/spending", post(reports::spending))
        .route("/reports/income", post(reports::income))
        .route("/reports/budget-performance", post(reports::budget_performance))
        .route("/reports/goal-progress", post(reports::goal_progress))
        .route("/events/{topic}", post(events::publish))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    events: mpsc::Sender<InboundMessage>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState { engine, events };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Arc<Engine>,
    events: mpsc::Sender<InboundMessage>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, events, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
