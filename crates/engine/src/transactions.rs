//! Transactions: the durable log every balance is derived from.
//!
//! Amounts are stored non-negative; the sign of their effect on the account
//! comes from the [`TransactionKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    Document, EngineError, ResultEngine, categories,
    document::{require_timestamp, timestamp_value},
    filters::{ListFilter, StageBuilder},
    pipeline::Pipeline,
};

pub const COLLECTION: &str = "transactions";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            other => Err(EngineError::InvalidRequest(format!(
                "unknown transaction kind '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub account_id: String,
    pub user_id: String,
    pub category_id: String,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Effect of this transaction on its account balance.
    pub fn signed_amount(&self) -> i64 {
        crate::signed_amount(self.kind, self.amount_minor)
    }
}

fn check_amount(amount_minor: i64) -> ResultEngine<i64> {
    if amount_minor < 0 {
        return Err(EngineError::InvalidAmount(format!(
            "amount must not be negative, got {amount_minor}"
        )));
    }
    Ok(amount_minor)
}

/// A transaction to record. Also the payload of the `transaction.create`
/// topic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: String,
    pub user_id: String,
    pub category_id: String,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    #[serde(default)]
    pub description: String,
    /// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or RFC 3339.
    pub date: String,
}

impl NewTransaction {
    pub(crate) fn into_transaction(self, now: DateTime<Utc>) -> ResultEngine<Transaction> {
        let amount_minor = check_amount(self.amount_minor)?;
        let date = require_timestamp(&self.date, "date")?;
        if self.account_id.is_empty() {
            return Err(EngineError::InvalidRequest(
                "account_id is required".to_string(),
            ));
        }
        Ok(Transaction {
            id: Uuid::new_v4().to_string(),
            account_id: self.account_id,
            user_id: self.user_id,
            category_id: self.category_id,
            kind: self.kind,
            amount_minor,
            description: self.description,
            date,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub id: String,
    pub user_id: String,
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    pub kind: Option<TransactionKind>,
    pub amount_minor: Option<i64>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl TransactionUpdate {
    /// Applies the update to `record` and returns the matching `$set`
    /// document. Nothing is written if validation fails.
    pub(crate) fn apply(&self, record: &mut Transaction) -> ResultEngine<Document> {
        let amount = self.amount_minor.map(check_amount).transpose()?;
        let date = self
            .date
            .as_deref()
            .map(|date| require_timestamp(date, "date"))
            .transpose()?;

        let mut set = Document::new();
        if let Some(account_id) = &self.account_id {
            record.account_id = account_id.clone();
            set.insert("account_id".to_string(), Value::from(account_id.as_str()));
        }
        if let Some(category_id) = &self.category_id {
            record.category_id = category_id.clone();
            set.insert("category_id".to_string(), Value::from(category_id.as_str()));
        }
        if let Some(kind) = self.kind {
            record.kind = kind;
            set.insert("kind".to_string(), Value::from(kind.as_str()));
        }
        if let Some(amount) = amount {
            record.amount_minor = amount;
            set.insert("amount_minor".to_string(), Value::from(amount));
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
            set.insert("description".to_string(), Value::from(description.as_str()));
        }
        if let Some(date) = date {
            record.date = date;
            set.insert("date".to_string(), timestamp_value(date));
        }
        Ok(set)
    }
}

/// Filters for listing transactions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionListFilter {
    pub user_id: Option<String>,
    pub account_id: Option<String>,
    pub category_id: Option<String>,
    pub kind: Option<TransactionKind>,
    pub description: Option<String>,
    pub min_amount_minor: Option<i64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Substring of the joined category's name.
    pub category_name: Option<String>,
}

impl ListFilter for TransactionListFilter {
    const COLLECTION: &'static str = COLLECTION;

    fn pipeline(&self, _now: DateTime<Utc>) -> Pipeline {
        StageBuilder::new()
            .equals("user_id", self.user_id.as_deref())
            .equals("account_id", self.account_id.as_deref())
            .equals("category_id", self.category_id.as_deref())
            .equals("kind", self.kind.map(|kind| kind.as_str()))
            .contains("description", self.description.as_deref())
            .at_least("amount_minor", self.min_amount_minor)
            .date_range("date", self.date_from.as_deref(), self.date_to.as_deref())
            .joined_name(
                categories::COLLECTION,
                "category_id",
                "category",
                self.category_name.as_deref(),
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;

    fn new_transaction(amount_minor: i64, date: &str) -> NewTransaction {
        NewTransaction {
            account_id: "acc".to_string(),
            user_id: "u1".to_string(),
            category_id: "cat".to_string(),
            kind: TransactionKind::Expense,
            amount_minor,
            description: "coffee".to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn kind_uses_uppercase_wire_names() {
        assert_eq!(
            serde_json::to_value(TransactionKind::Income).unwrap(),
            Value::from("INCOME")
        );
        assert_eq!(
            TransactionKind::try_from("EXPENSE").unwrap(),
            TransactionKind::Expense
        );
        assert!(TransactionKind::try_from("expense").is_err());
    }

    #[test]
    fn creation_validates_amount_and_date() {
        let now = Utc::now();
        assert!(matches!(
            new_transaction(-1, "2024-01-01").into_transaction(now),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            new_transaction(10, "yesterday").into_transaction(now),
            Err(EngineError::InvalidDate(_))
        ));
        let created = new_transaction(10, "2024-01-01 12:30:00")
            .into_transaction(now)
            .unwrap();
        assert_eq!(created.signed_amount(), -10);
        assert_eq!(created.created_at, now);
    }

    #[test]
    fn update_touches_only_given_fields() {
        let mut record = new_transaction(10, "2024-01-01")
            .into_transaction(Utc::now())
            .unwrap();
        let update = TransactionUpdate {
            id: record.id.clone(),
            user_id: "u1".to_string(),
            kind: Some(TransactionKind::Income),
            ..Default::default()
        };
        let set = update.apply(&mut record).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set["kind"], "INCOME");
        assert_eq!(record.signed_amount(), 10);
    }

    #[test]
    fn category_name_filter_joins_categories() {
        let filter = TransactionListFilter {
            user_id: Some("u1".to_string()),
            category_name: Some("groc".to_string()),
            ..Default::default()
        };
        let pipeline = filter.pipeline(Utc::now());
        assert_eq!(pipeline.len(), 5);
        match &pipeline.stages()[1] {
            Stage::Lookup(lookup) => assert_eq!(lookup.from, "categories"),
            other => panic!("expected a lookup, got {other:?}"),
        }
    }
}
