//! Accounts.
//!
//! The stored `balance_minor` is the snapshot given at creation or update; the
//! running balance derived from transactions lives in the
//! [`BalanceLedger`](crate::BalanceLedger).

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    Document, EngineError, ResultEngine,
    filters::{ListFilter, StageBuilder},
    pipeline::Pipeline,
};

pub const COLLECTION: &str = "accounts";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub account_type: String,
    pub balance_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAccount {
    pub user_id: String,
    pub name: String,
    pub account_type: String,
    #[serde(default)]
    pub balance_minor: i64,
    pub currency: String,
}

impl NewAccount {
    pub(crate) fn into_account(self, now: DateTime<Utc>) -> ResultEngine<Account> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidRequest(
                "account name must not be empty".to_string(),
            ));
        }
        Ok(Account {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            name: name.to_string(),
            account_type: self.account_type,
            balance_minor: self.balance_minor,
            currency: self.currency,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub account_type: Option<String>,
    pub balance_minor: Option<i64>,
    pub currency: Option<String>,
}

impl AccountUpdate {
    pub(crate) fn set_document(&self) -> ResultEngine<Document> {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(EngineError::InvalidRequest(
                    "account name must not be empty".to_string(),
                ));
            }
            set.insert("name".to_string(), Value::from(name));
        }
        if let Some(account_type) = &self.account_type {
            set.insert("account_type".to_string(), Value::from(account_type.as_str()));
        }
        if let Some(balance) = self.balance_minor {
            set.insert("balance_minor".to_string(), Value::from(balance));
        }
        if let Some(currency) = &self.currency {
            set.insert("currency".to_string(), Value::from(currency.as_str()));
        }
        Ok(set)
    }
}

/// Filters for listing accounts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountListFilter {
    pub user_id: Option<String>,
    /// Case-insensitive substring.
    pub name: Option<String>,
    pub account_type: Option<String>,
    /// Case-insensitive substring.
    pub currency: Option<String>,
    pub min_balance_minor: Option<i64>,
    /// Only accounts created during the last month.
    pub created_last_month: bool,
}

impl ListFilter for AccountListFilter {
    const COLLECTION: &'static str = COLLECTION;

    fn pipeline(&self, now: DateTime<Utc>) -> Pipeline {
        let since = self
            .created_last_month
            .then(|| now.checked_sub_months(Months::new(1)))
            .flatten();
        StageBuilder::new()
            .equals("user_id", self.user_id.as_deref())
            .contains("name", self.name.as_deref())
            .equals("account_type", self.account_type.as_deref())
            .contains("currency", self.currency.as_deref())
            .at_least("balance_minor", self.min_balance_minor)
            .since("created_at", since)
            .build()
    }
}
