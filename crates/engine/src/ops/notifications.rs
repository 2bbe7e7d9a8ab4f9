use serde_json::Value;

use crate::{
    Document, Engine, NewNotification, Notification, NotificationListFilter, Page, PageRequest,
    ResultEngine, notifications,
};

impl Engine {
    pub async fn create_notification(&self, new: NewNotification) -> ResultEngine<String> {
        let notification = new.into_notification(self.now());
        self.insert_record(notifications::COLLECTION, &notification)
            .await
    }

    pub async fn notification(&self, id: &str, user_id: &str) -> ResultEngine<Notification> {
        self.find_record(notifications::COLLECTION, id, user_id)
            .await
    }

    pub async fn list_notifications(
        &self,
        filter: &NotificationListFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Notification>> {
        self.list_records(filter, page).await
    }

    pub async fn mark_notification_read(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        let mut set = Document::new();
        set.insert("is_read".to_string(), Value::Bool(true));
        self.update_record(notifications::COLLECTION, id, user_id, set)
            .await
    }

    pub async fn delete_notification(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        self.soft_delete(notifications::COLLECTION, id, user_id)
            .await
    }
}
