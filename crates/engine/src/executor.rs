//! Paginated aggregation executor.
//!
//! A list runs its filter pipeline twice: once with a `Count` stage appended
//! to read the total, once with `Skip`/`Limit` appended to read the page.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    DocumentStore, ResultEngine,
    pipeline::{Pipeline, Stage},
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
const COUNT_FIELD: &str = "total_count";

/// 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Page size actually used: non-positive limits fall back to the default.
    pub fn effective_limit(&self) -> u64 {
        if self.limit <= 0 {
            DEFAULT_PAGE_SIZE as u64
        } else {
            self.limit as u64
        }
    }

    /// `(page - 1) * limit`, clamped to 0 for pages below 1.
    pub fn skip(&self) -> u64 {
        let page = self.page.max(1) as u64;
        (page - 1).saturating_mul(self.effective_limit())
    }
}

/// One page of a list. An empty `items` is a valid answer; `total_count`
/// tells "nothing matched" apart from "past the last page".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        let limit = PageRequest::new(self.page, self.limit);
        limit.skip() + (self.items.len() as u64) < self.total_count
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Appends the page window to a copy of `pipeline`.
pub fn page_pipeline(pipeline: &Pipeline, request: PageRequest) -> Pipeline {
    pipeline
        .clone()
        .then(Stage::Skip(request.skip()))
        .then(Stage::Limit(request.effective_limit()))
}

pub fn count_pipeline(pipeline: &Pipeline) -> Pipeline {
    pipeline.clone().then(Stage::Count(COUNT_FIELD.to_string()))
}

pub async fn paginate<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    pipeline: &Pipeline,
    request: PageRequest,
) -> ResultEngine<Page<T>> {
    tracing::debug!(collection, %pipeline, page = request.page, limit = request.limit, "paginated aggregation");

    let mut count_cursor = store.aggregate(collection, &count_pipeline(pipeline)).await?;
    let total_count = count_cursor
        .next_document()
        .and_then(|doc| doc.get(COUNT_FIELD).and_then(Value::as_u64))
        .unwrap_or(0);
    count_cursor.close();

    let items = store
        .aggregate(collection, &page_pipeline(pipeline, request))
        .await?
        .decode_all::<T>()?;

    Ok(Page {
        items,
        total_count,
        page: request.page.max(1),
        limit: request.effective_limit() as i64,
    })
}
