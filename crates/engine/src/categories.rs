use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    Document, EngineError, ResultEngine,
    filters::{ListFilter, StageBuilder},
    pipeline::Pipeline,
};

pub const COLLECTION: &str = "categories";

/// Whether a category classifies income or expenses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "INCOME",
            CategoryKind::Expense => "EXPENSE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewCategory {
    pub user_id: String,
    pub name: String,
    pub kind: CategoryKind,
}

fn normalize_name(name: &str) -> ResultEngine<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidRequest(
            "category name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

impl NewCategory {
    pub(crate) fn into_category(self, now: DateTime<Utc>) -> ResultEngine<Category> {
        Ok(Category {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            name: normalize_name(&self.name)?,
            kind: self.kind,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
}

impl CategoryUpdate {
    pub(crate) fn set_document(&self) -> ResultEngine<Document> {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            set.insert("name".to_string(), Value::from(normalize_name(name)?));
        }
        if let Some(kind) = self.kind {
            set.insert("kind".to_string(), Value::from(kind.as_str()));
        }
        Ok(set)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryListFilter {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
}

impl ListFilter for CategoryListFilter {
    const COLLECTION: &'static str = COLLECTION;

    fn pipeline(&self, _now: DateTime<Utc>) -> Pipeline {
        StageBuilder::new()
            .equals("user_id", self.user_id.as_deref())
            .contains("name", self.name.as_deref())
            .equals("kind", self.kind.map(|kind| kind.as_str()))
            .build()
    }
}
