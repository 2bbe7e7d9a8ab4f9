use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveValue, DatabaseConnection, QueryFilter, QueryOrder, prelude::*, sea_query::Expr,
};
use serde_json::Value;

use crate::{
    EngineError, ResultEngine,
    document::{Document, ID_FIELD, document_id},
    pipeline::{Condition, Filter, Pipeline},
};

use super::{
    CursorTracker, DocumentCursor, DocumentStore, documents,
    eval::{Evaluator, matches},
};

/// Durable store: every document is a JSON row of the `documents` table,
/// created by the `migration` crate.
///
/// Filters and pipelines run in-process over a collection scan ordered by
/// insertion, which keeps results stable across calls. A filter with an `_id`
/// equality narrows the scan through the indexed `doc_id` column.
///
/// `update_one` is a compare-and-swap on the stored body: the write only lands
/// if the row still holds the body the filter was checked against, otherwise
/// the row is read again and the filter re-evaluated.
#[derive(Debug, Clone)]
pub struct SqlStore {
    database: DatabaseConnection,
    cursors: CursorTracker,
}

impl SqlStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            cursors: CursorTracker::default(),
        }
    }

    pub fn open_cursors(&self) -> usize {
        self.cursors.open_cursors()
    }

    async fn rows(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> ResultEngine<Vec<documents::Model>> {
        let mut query = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection));
        if let Some(id) = id_hint(filter) {
            query = query.filter(documents::Column::DocId.eq(id));
        }
        Ok(query
            .order_by_asc(documents::Column::Seq)
            .all(&self.database)
            .await?)
    }

    async fn scan(&self, collection: &str, filter: &Filter) -> ResultEngine<Vec<Document>> {
        self.rows(collection, filter)
            .await?
            .iter()
            .map(|row| decode_row(collection, row))
            .collect()
    }
}

fn decode_row(collection: &str, row: &documents::Model) -> ResultEngine<Document> {
    serde_json::from_str(&row.body)
        .map_err(|err| EngineError::Decode(format!("{collection}/{}: {err}", row.doc_id)))
}

/// The `_id` a filter pins down, if any.
fn id_hint(filter: &Filter) -> Option<&str> {
    filter
        .predicates()
        .iter()
        .find_map(|predicate| match &predicate.condition {
            Condition::Eq(Value::String(id)) if predicate.field == ID_FIELD => Some(id.as_str()),
            _ => None,
        })
}

#[async_trait]
impl DocumentStore for SqlStore {
    async fn insert_one(&self, collection: &str, document: Document) -> ResultEngine<()> {
        let id = document_id(&document)
            .ok_or_else(|| EngineError::InvalidRequest("document without _id".to_string()))?
            .to_string();
        let body = serde_json::to_string(&document)?;
        documents::ActiveModel {
            seq: ActiveValue::NotSet,
            collection: ActiveValue::Set(collection.to_string()),
            doc_id: ActiveValue::Set(id),
            body: ActiveValue::Set(body),
        }
        .insert(&self.database)
        .await?;
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> ResultEngine<Option<Document>> {
        Ok(self
            .scan(collection, filter)
            .await?
            .into_iter()
            .find(|d| matches(d, filter)))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> ResultEngine<DocumentCursor> {
        let docs = self
            .scan(collection, filter)
            .await?
            .into_iter()
            .filter(|d| matches(d, filter))
            .collect();
        Ok(DocumentCursor::new(docs, Some(self.cursors.open())))
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
    ) -> ResultEngine<DocumentCursor> {
        let mut sources = HashMap::new();
        for source in pipeline.lookup_sources() {
            sources.insert(source.to_string(), self.scan(source, &Filter::new()).await?);
        }
        let base = self.scan(collection, &Filter::new()).await?;
        let docs = Evaluator::new(&sources).run(base, pipeline);
        Ok(DocumentCursor::new(docs, Some(self.cursors.open())))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> ResultEngine<u64> {
        loop {
            let mut target = None;
            for row in self.rows(collection, filter).await? {
                let doc = decode_row(collection, &row)?;
                if matches(&doc, filter) {
                    target = Some((row, doc));
                    break;
                }
            }
            let Some((row, mut doc)) = target else {
                return Ok(0);
            };

            for (field, value) in &set {
                doc.insert(field.clone(), value.clone());
            }
            let written = documents::Entity::update_many()
                .col_expr(
                    documents::Column::Body,
                    Expr::value(serde_json::to_string(&doc)?),
                )
                .filter(documents::Column::Seq.eq(row.seq))
                .filter(documents::Column::Body.eq(row.body))
                .exec(&self.database)
                .await?
                .rows_affected;
            if written == 1 {
                return Ok(1);
            }
            tracing::debug!(
                collection,
                doc_id = %row.doc_id,
                "document changed during update, retrying"
            );
        }
    }

    async fn count(&self, collection: &str, filter: &Filter) -> ResultEngine<u64> {
        Ok(self
            .scan(collection, filter)
            .await?
            .iter()
            .filter(|d| matches(d, filter))
            .count() as u64)
    }
}
