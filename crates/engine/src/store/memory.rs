use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EngineError, ResultEngine,
    document::{Document, document_id},
    pipeline::{Filter, Pipeline},
};

use super::{
    CursorTracker, DocumentCursor, DocumentStore,
    eval::{Evaluator, matches},
};

/// Process-local document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    cursors: CursorTracker,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursors handed out and not yet released.
    pub fn open_cursors(&self) -> usize {
        self.cursors.open_cursors()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, document: Document) -> ResultEngine<()> {
        let id = document_id(&document)
            .ok_or_else(|| EngineError::InvalidRequest("document without _id".to_string()))?
            .to_string();
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| document_id(d) == Some(id.as_str())) {
            return Err(EngineError::InvalidRequest(format!(
                "duplicate id {id} in {collection}"
            )));
        }
        docs.push(document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> ResultEngine<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, filter)).cloned()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> ResultEngine<DocumentCursor> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default();
        Ok(DocumentCursor::new(docs, Some(self.cursors.open())))
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
    ) -> ResultEngine<DocumentCursor> {
        let collections = self.collections.read().await;
        let mut sources = HashMap::new();
        for source in pipeline.lookup_sources() {
            sources.insert(
                source.to_string(),
                collections.get(source).cloned().unwrap_or_default(),
            );
        }
        let base = collections.get(collection).cloned().unwrap_or_default();
        drop(collections);

        let docs = Evaluator::new(&sources).run(base, pipeline);
        Ok(DocumentCursor::new(docs, Some(self.cursors.open())))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> ResultEngine<u64> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| matches(d, filter)))
        else {
            return Ok(0);
        };
        for (field, value) in set {
            doc.insert(field, value);
        }
        Ok(1)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> ResultEngine<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).count() as u64)
            .unwrap_or(0))
    }
}
