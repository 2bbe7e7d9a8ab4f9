//! Budgets: a spending target for one category over a period.

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

pub const COLLECTION: &str = "budgets";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Daily => "DAILY",
            BudgetPeriod::Weekly => "WEEKLY",
            BudgetPeriod::Monthly => "MONTHLY",
            BudgetPeriod::Yearly => "YEARLY",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount_minor: i64,
    pub period: BudgetPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> ResultEngine<()> {
    if start > end {
        return Err(EngineError::InvalidDate(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

fn check_amount(amount_minor: i64) -> ResultEngine<i64> {
    if amount_minor < 0 {
        return Err(EngineError::InvalidAmount(format!(
            "budget amount must not be negative, got {amount_minor}"
        )));
    }
    Ok(amount_minor)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewBudget {
    pub user_id: String,
    pub category_id: String,
    pub amount_minor: i64,
    pub period: BudgetPeriod,
    pub start_date: String,
    pub end_date: String,
}

impl NewBudget {
    pub(crate) fn into_budget(self, now: DateTime<Utc>) -> ResultEngine<Budget> {
        let amount_minor = check_amount(self.amount_minor)?;
        let start_date = require_timestamp(&self.start_date, "start_date")?;
        let end_date = require_timestamp(&self.end_date, "end_date")?;
        check_window(start_date, end_date)?;
        Ok(Budget {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            category_id: self.category_id,
            amount_minor,
            period: self.period,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial budget update. Also the payload of the `budget.update` topic.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub id: String,
    pub user_id: String,
    pub category_id: Option<String>,
    pub amount_minor: Option<i64>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl BudgetUpdate {
    /// Validates against the stored budget, since a single bound can only be
    /// checked together with the other one.
    pub(crate) fn apply(&self, record: &mut Budget) -> ResultEngine<Document> {
        let amount = self.amount_minor.map(check_amount).transpose()?;
        let start = self
            .start_date
            .as_deref()
            .map(|date| require_timestamp(date, "start_date"))
            .transpose()?;
        let end = self
            .end_date
            .as_deref()
            .map(|date| require_timestamp(date, "end_date"))
            .transpose()?;
        check_window(
            start.unwrap_or(record.start_date),
            end.unwrap_or(record.end_date),
        )?;

        let mut set = Document::new();
        if let Some(category_id) = &self.category_id {
            record.category_id = category_id.clone();
            set.insert("category_id".to_string(), Value::from(category_id.as_str()));
        }
        if let Some(amount) = amount {
            record.amount_minor = amount;
            set.insert("amount_minor".to_string(), Value::from(amount));
        }
        if let Some(period) = self.period {
            record.period = period;
            set.insert("period".to_string(), Value::from(period.as_str()));
        }
        if let Some(start) = start {
            record.start_date = start;
            set.insert("start_date".to_string(), timestamp_value(start));
        }
        if let Some(end) = end {
            record.end_date = end;
            set.insert("end_date".to_string(), timestamp_value(end));
        }
        Ok(set)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetListFilter {
    pub user_id: Option<String>,
    pub category_id: Option<String>,
    pub period: Option<BudgetPeriod>,
    pub min_amount_minor: Option<i64>,
    pub start_from: Option<String>,
    pub start_to: Option<String>,
    pub category_name: Option<String>,
}

impl ListFilter for BudgetListFilter {
    const COLLECTION: &'static str = COLLECTION;

    fn pipeline(&self, _now: DateTime<Utc>) -> Pipeline {
        StageBuilder::new()
            .equals("user_id", self.user_id.as_deref())
            .equals("category_id", self.category_id.as_deref())
            .equals("period", self.period.map(|period| period.as_str()))
            .at_least("amount_minor", self.min_amount_minor)
            .date_range(
                "start_date",
                self.start_from.as_deref(),
                self.start_to.as_deref(),
            )
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

    fn new_budget(start: &str, end: &str) -> NewBudget {
        NewBudget {
            user_id: "u1".to_string(),
            category_id: "cat".to_string(),
            amount_minor: 500,
            period: BudgetPeriod::Monthly,
            start_date: start.to_string(),
            end_date: end.to_string(),
        }
    }

    #[test]
    fn start_after_end_is_rejected() {
        let result = new_budget("2024-02-01", "2024-01-01").into_budget(Utc::now());
        assert!(matches!(result, Err(EngineError::InvalidDate(_))));
    }

    #[test]
    fn update_checks_window_against_stored_bounds() {
        let mut budget = new_budget("2024-01-01", "2024-01-31")
            .into_budget(Utc::now())
            .unwrap();
        let update = BudgetUpdate {
            id: budget.id.clone(),
            user_id: "u1".to_string(),
            start_date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            update.apply(&mut budget),
            Err(EngineError::InvalidDate(_))
        ));

        let update = BudgetUpdate {
            amount_minor: Some(750),
            start_date: None,
            end_date: Some("2024-02-29".to_string()),
            ..update
        };
        let set = update.apply(&mut budget).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(budget.amount_minor, 750);
    }
}
