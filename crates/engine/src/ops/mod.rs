use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    Document, Engine, EngineError, ListFilter, Page, PageRequest, ResultEngine,
    document::{DELETED_AT_FIELD, from_document, timestamp_value, to_document},
    executor,
    pipeline::Filter,
};

mod accounts;
mod balances;
mod budgets;
mod categories;
mod goals;
mod notifications;
mod reports;
mod transactions;

/// Selects one active document of `user_id` by id.
pub(super) fn owned_by(id: &str, user_id: &str) -> Filter {
    Filter::new()
        .eq("_id", id)
        .eq("user_id", user_id)
        .active()
}

impl Engine {
    /// Inserts a freshly built record as an active document and returns its
    /// id.
    pub(super) async fn insert_record<T: Serialize>(
        &self,
        collection: &str,
        record: &T,
    ) -> ResultEngine<String> {
        let mut document = to_document(record)?;
        document.insert(DELETED_AT_FIELD.to_string(), Value::Null);
        let id = crate::document::document_id(&document)
            .map(ToString::to_string)
            .ok_or_else(|| EngineError::Decode("record has no _id".to_string()))?;
        self.store.insert_one(collection, document).await?;
        tracing::debug!(collection, id = %id, "record created");
        Ok(id)
    }

    pub(super) async fn find_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        user_id: &str,
    ) -> ResultEngine<T> {
        let document = self
            .store
            .find_one(collection, &owned_by(id, user_id))
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("{collection} {id}")))?;
        from_document(document)
    }

    /// Applies a `$set` document and stamps `updated_at`. Matching nothing is
    /// a `KeyNotFound`.
    pub(super) async fn update_record(
        &self,
        collection: &str,
        id: &str,
        user_id: &str,
        set: Document,
    ) -> ResultEngine<()> {
        self.update_matching(collection, id, &owned_by(id, user_id), set)
            .await
    }

    /// Like [`Engine::update_record`], with a caller supplied filter that must
    /// still hold when the write lands.
    pub(super) async fn update_matching(
        &self,
        collection: &str,
        id: &str,
        filter: &Filter,
        mut set: Document,
    ) -> ResultEngine<()> {
        set.insert("updated_at".to_string(), timestamp_value(self.now()));
        let modified = self.store.update_one(collection, filter, set).await?;
        if modified == 0 {
            return Err(EngineError::KeyNotFound(format!("{collection} {id}")));
        }
        Ok(())
    }

    /// Marks the document deleted. Soft-deleted documents disappear from every
    /// read; deleting twice is a `KeyNotFound`.
    pub(super) async fn soft_delete(
        &self,
        collection: &str,
        id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        self.soft_delete_matching(collection, id, &owned_by(id, user_id))
            .await
    }

    pub(super) async fn soft_delete_matching(
        &self,
        collection: &str,
        id: &str,
        filter: &Filter,
    ) -> ResultEngine<()> {
        let mut set = Document::new();
        set.insert(DELETED_AT_FIELD.to_string(), timestamp_value(self.now()));
        self.update_matching(collection, id, filter, set).await?;
        tracing::debug!(collection, id, "record deleted");
        Ok(())
    }

    pub(super) async fn list_records<F, T>(
        &self,
        filter: &F,
        page: PageRequest,
    ) -> ResultEngine<Page<T>>
    where
        F: ListFilter + Sync,
        T: DeserializeOwned,
    {
        let pipeline = filter.pipeline(self.now());
        executor::paginate(self.store.as_ref(), F::COLLECTION, &pipeline, page).await
    }
}
