use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    filters::{ListFilter, StageBuilder},
    pipeline::Pipeline,
};

pub const COLLECTION: &str = "notifications";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub message: String,
    pub status: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: String,
    pub kind: String,
    pub message: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "PENDING".to_string()
}

impl NewNotification {
    /// Notifications are always created unread.
    pub(crate) fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            kind: self.kind,
            message: self.message,
            status: self.status,
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationListFilter {
    pub user_id: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub is_read: Option<bool>,
}

impl ListFilter for NotificationListFilter {
    const COLLECTION: &'static str = COLLECTION;

    fn pipeline(&self, _now: DateTime<Utc>) -> Pipeline {
        StageBuilder::new()
            .equals("user_id", self.user_id.as_deref())
            .equals("kind", self.kind.as_deref())
            .equals("status", self.status.as_deref())
            .equals("is_read", self.is_read)
            .build()
    }
}
