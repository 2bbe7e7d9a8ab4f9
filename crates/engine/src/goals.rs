//! Savings goals.
//!
//! `current_minor` is never written through the mutation path: goals are
//! created at 0 and the progress report derives the live figure from the
//! linked account's transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    Document, EngineError, ResultEngine,
    document::{require_timestamp, timestamp_value},
    filters::{ListFilter, StageBuilder},
    pipeline::Pipeline,
};

pub const COLLECTION: &str = "goals";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    #[default]
    InProgress,
    Achieved,
    Failed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::InProgress => "IN_PROGRESS",
            GoalStatus::Achieved => "ACHIEVED",
            GoalStatus::Failed => "FAILED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub deadline: DateTime<Utc>,
    pub status: GoalStatus,
    #[serde(default)]
    pub account_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn check_target(target_minor: i64) -> ResultEngine<i64> {
    if target_minor <= 0 {
        return Err(EngineError::InvalidAmount(format!(
            "goal target must be positive, got {target_minor}"
        )));
    }
    Ok(target_minor)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewGoal {
    pub user_id: String,
    pub name: String,
    pub target_minor: i64,
    pub deadline: String,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl NewGoal {
    pub(crate) fn into_goal(self, now: DateTime<Utc>) -> ResultEngine<Goal> {
        Ok(Goal {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            name: self.name,
            target_minor: check_target(self.target_minor)?,
            current_minor: 0,
            deadline: require_timestamp(&self.deadline, "deadline")?,
            status: self.status,
            account_id: self.account_id,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub target_minor: Option<i64>,
    pub deadline: Option<String>,
    pub status: Option<GoalStatus>,
    pub account_id: Option<String>,
}

impl GoalUpdate {
    pub(crate) fn set_document(&self) -> ResultEngine<Document> {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            set.insert("name".to_string(), Value::from(name.as_str()));
        }
        if let Some(target) = self.target_minor {
            set.insert("target_minor".to_string(), Value::from(check_target(target)?));
        }
        if let Some(deadline) = &self.deadline {
            let deadline = require_timestamp(deadline, "deadline")?;
            set.insert("deadline".to_string(), timestamp_value(deadline));
        }
        if let Some(status) = self.status {
            set.insert("status".to_string(), Value::from(status.as_str()));
        }
        if let Some(account_id) = &self.account_id {
            set.insert("account_id".to_string(), Value::from(account_id.as_str()));
        }
        Ok(set)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalListFilter {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub status: Option<GoalStatus>,
    pub min_target_minor: Option<i64>,
    pub deadline_from: Option<String>,
    pub deadline_to: Option<String>,
}

impl ListFilter for GoalListFilter {
    const COLLECTION: &'static str = COLLECTION;

    fn pipeline(&self, _now: DateTime<Utc>) -> Pipeline {
        StageBuilder::new()
            .equals("user_id", self.user_id.as_deref())
            .contains("name", self.name.as_deref())
            .equals("status", self.status.map(|status| status.as_str()))
            .at_least("target_minor", self.min_target_minor)
            .date_range(
                "deadline",
                self.deadline_from.as_deref(),
                self.deadline_to.as_deref(),
            )
            .build()
    }
}
