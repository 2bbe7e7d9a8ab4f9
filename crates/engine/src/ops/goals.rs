use crate::{
    Engine, Goal, GoalListFilter, GoalUpdate, NewGoal, Page, PageRequest, ResultEngine, goals,
};

impl Engine {
    pub async fn create_goal(&self, new: NewGoal) -> ResultEngine<String> {
        let goal = new.into_goal(self.now())?;
        self.insert_record(goals::COLLECTION, &goal).await
    }

    pub async fn goal(&self, id: &str, user_id: &str) -> ResultEngine<Goal> {
        self.find_record(goals::COLLECTION, id, user_id).await
    }

    pub async fn list_goals(
        &self,
        filter: &GoalListFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Goal>> {
        self.list_records(filter, page).await
    }

    pub async fn update_goal(&self, update: GoalUpdate) -> ResultEngine<()> {
        let set = update.set_document()?;
        self.update_record(goals::COLLECTION, &update.id, &update.user_id, set)
            .await
    }

    pub async fn delete_goal(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        self.soft_delete(goals::COLLECTION, id, user_id).await
    }
}
