//! Document store abstraction.
//!
//! The engine talks to its durable store only through [`DocumentStore`]. Two
//! implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local, used by tests and the `memory` database
//!   setting.
//! - [`SqlStore`]: JSON documents persisted in the `documents` table through
//!   `sea-orm`.
//!
//! Both evaluate pipelines with the same in-process evaluator, so a pipeline
//! behaves identically whichever store runs it.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    ResultEngine,
    document::{Document, from_document},
    pipeline::{Filter, Pipeline},
};

pub(crate) mod documents;
mod eval;
mod memory;
mod sql;

pub use memory::MemoryStore;
pub use sql::SqlStore;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, collection: &str, document: Document) -> ResultEngine<()>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> ResultEngine<Option<Document>>;

    async fn find(&self, collection: &str, filter: &Filter) -> ResultEngine<DocumentCursor>;

    async fn aggregate(&self, collection: &str, pipeline: &Pipeline)
    -> ResultEngine<DocumentCursor>;

    /// Applies `set` (field → value, `$set` semantics) to the first document
    /// matching `filter`. Returns the number of modified documents (0 or 1).
    async fn update_one(&self, collection: &str, filter: &Filter, set: Document)
    -> ResultEngine<u64>;

    async fn count(&self, collection: &str, filter: &Filter) -> ResultEngine<u64>;
}

/// Counts cursors that have been opened and not yet released.
#[derive(Clone, Debug, Default)]
pub struct CursorTracker {
    open: Arc<AtomicUsize>,
}

impl CursorTracker {
    pub fn open(&self) -> CursorGuard {
        self.open.fetch_add(1, Ordering::SeqCst);
        CursorGuard {
            open: Arc::clone(&self.open),
        }
    }

    pub fn open_cursors(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// Releases its cursor slot on drop.
#[derive(Debug)]
pub struct CursorGuard {
    open: Arc<AtomicUsize>,
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Result stream of a `find` or `aggregate`.
///
/// The cursor releases its server-side slot as soon as it is exhausted,
/// closed, or dropped, whichever comes first.
#[derive(Debug)]
pub struct DocumentCursor {
    batch: VecDeque<Document>,
    guard: Option<CursorGuard>,
}

impl DocumentCursor {
    pub fn new(documents: Vec<Document>, guard: Option<CursorGuard>) -> Self {
        Self {
            batch: documents.into(),
            guard,
        }
    }

    pub fn next_document(&mut self) -> Option<Document> {
        let next = self.batch.pop_front();
        if next.is_none() {
            self.guard.take();
        }
        next
    }

    pub fn close(mut self) {
        self.batch.clear();
        self.guard.take();
    }

    /// Drains the cursor, decoding every document. The cursor is released on
    /// every path, including a decode failure halfway through.
    pub fn decode_all<T: DeserializeOwned>(mut self) -> ResultEngine<Vec<T>> {
        let mut out = Vec::with_capacity(self.batch.len());
        while let Some(doc) = self.next_document() {
            out.push(from_document(doc)?);
        }
        Ok(out)
    }
}

impl Iterator for DocumentCursor {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document()
    }
}
