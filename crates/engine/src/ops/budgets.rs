use crate::{
    Budget, BudgetListFilter, BudgetUpdate, Engine, NewBudget, Page, PageRequest, ResultEngine,
    budgets,
};

impl Engine {
    pub async fn create_budget(&self, new: NewBudget) -> ResultEngine<String> {
        let budget = new.into_budget(self.now())?;
        self.insert_record(budgets::COLLECTION, &budget).await
    }

    pub async fn budget(&self, id: &str, user_id: &str) -> ResultEngine<Budget> {
        self.find_record(budgets::COLLECTION, id, user_id).await
    }

    pub async fn list_budgets(
        &self,
        filter: &BudgetListFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Budget>> {
        self.list_records(filter, page).await
    }

    /// Updates a budget. The date window is validated against the stored
    /// bounds, so the current budget is read first.
    pub async fn update_budget(&self, update: BudgetUpdate) -> ResultEngine<()> {
        let mut budget: Budget = self
            .find_record(budgets::COLLECTION, &update.id, &update.user_id)
            .await?;
        let set = update.apply(&mut budget)?;
        self.update_record(budgets::COLLECTION, &update.id, &update.user_id, set)
            .await
    }

    pub async fn delete_budget(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        self.soft_delete(budgets::COLLECTION, id, user_id).await
    }
}
