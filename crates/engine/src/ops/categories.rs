use crate::{
    Category, CategoryListFilter, CategoryUpdate, Engine, NewCategory, Page, PageRequest,
    ResultEngine, categories,
};

impl Engine {
    pub async fn create_category(&self, new: NewCategory) -> ResultEngine<String> {
        let category = new.into_category(self.now())?;
        self.insert_record(categories::COLLECTION, &category).await
    }

    pub async fn category(&self, id: &str, user_id: &str) -> ResultEngine<Category> {
        self.find_record(categories::COLLECTION, id, user_id).await
    }

    pub async fn list_categories(
        &self,
        filter: &CategoryListFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Category>> {
        self.list_records(filter, page).await
    }

    pub async fn update_category(&self, update: CategoryUpdate) -> ResultEngine<()> {
        let set = update.set_document()?;
        self.update_record(categories::COLLECTION, &update.id, &update.user_id, set)
            .await
    }

    pub async fn delete_category(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        self.soft_delete(categories::COLLECTION, id, user_id).await
    }
}
