use crate::{
    BudgetPerformanceReport, CashFlowReport, Engine, GoalProgressReport, ReportWindow,
    ResultEngine, TransactionKind, budgets, goals,
    reports::{
        budget_performance_pipeline, budget_performance_rows, cash_flow_breakdown,
        cash_flow_pipeline, goal_progress_pipeline, goal_progress_rows, month_bounds,
    },
    transactions,
};

impl Engine {
    /// Total (or per-month) expenses of the user over the window.
    pub async fn spending_report(
        &self,
        user_id: &str,
        window: ReportWindow,
    ) -> ResultEngine<CashFlowReport> {
        self.cash_flow_report(user_id, TransactionKind::Expense, window)
            .await
    }

    /// Total (or per-month) income of the user over the window.
    pub async fn income_report(
        &self,
        user_id: &str,
        window: ReportWindow,
    ) -> ResultEngine<CashFlowReport> {
        self.cash_flow_report(user_id, TransactionKind::Income, window)
            .await
    }

    async fn cash_flow_report(
        &self,
        user_id: &str,
        kind: TransactionKind,
        window: ReportWindow,
    ) -> ResultEngine<CashFlowReport> {
        let pipeline = cash_flow_pipeline(user_id, kind, window, self.now());
        tracing::debug!(user_id, %kind, %pipeline, "cash flow report");
        let rows = self
            .store
            .aggregate(transactions::COLLECTION, &pipeline)
            .await?
            .collect();

        Ok(CashFlowReport {
            kind,
            yearly: window.yearly,
            monthly: window.monthly,
            breakdown: cash_flow_breakdown(window, rows),
        })
    }

    /// Target against booked amount for every monthly budget starting in the
    /// given month.
    pub async fn budget_performance(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> ResultEngine<BudgetPerformanceReport> {
        let (start, end) = month_bounds(year, month)?;
        let pipeline = budget_performance_pipeline(user_id, start, end);
        tracing::debug!(user_id, year, month, %pipeline, "budget performance report");
        let rows = self
            .store
            .aggregate(budgets::COLLECTION, &pipeline)
            .await?
            .collect();

        Ok(BudgetPerformanceReport {
            user_id: user_id.to_string(),
            year,
            month,
            items: budget_performance_rows(rows),
        })
    }

    /// Progress of the user's goals still in progress.
    pub async fn goal_progress(&self, user_id: &str) -> ResultEngine<GoalProgressReport> {
        let pipeline = goal_progress_pipeline(user_id);
        tracing::debug!(user_id, %pipeline, "goal progress report");
        let rows = self
            .store
            .aggregate(goals::COLLECTION, &pipeline)
            .await?
            .collect();

        Ok(GoalProgressReport {
            user_id: user_id.to_string(),
            goals: goal_progress_rows(rows),
        })
    }
}
