//! Reporting aggregator: read-only summaries built as pipelines over the
//! committed collections.
//!
//! Three reports exist:
//!
//! - cash flow (spending or income) over a trailing window, either as one
//!   total or broken down by calendar month;
//! - budget performance for one month, comparing each monthly budget's
//!   target with what was actually booked on its category;
//! - goal progress for the goals still in progress.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    BudgetPeriod, Document, EngineError, GoalStatus, ResultEngine, TransactionKind, accounts,
    document::timestamp_value,
    pipeline::{Condition, Filter, Group, GroupKey, Lookup, Pipeline, SortOrder, Stage, Unwind},
    transactions,
};

/// Trailing window of a cash flow report. `yearly` wins over `monthly`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportWindow {
    pub yearly: bool,
    pub monthly: bool,
}

impl ReportWindow {
    /// Lower bound of the window, `None` for all time.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.yearly {
            now.checked_sub_months(Months::new(12))
        } else if self.monthly {
            now.checked_sub_months(Months::new(1))
        } else {
            None
        }
    }

    /// The report is broken down by month only when `monthly` alone is set.
    pub fn by_month(&self) -> bool {
        self.monthly && !self.yearly
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`.
    pub month: String,
    pub total_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowBreakdown {
    Total(i64),
    Monthly(Vec<MonthlyTotal>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowReport {
    pub kind: TransactionKind,
    pub yearly: bool,
    pub monthly: bool,
    pub breakdown: CashFlowBreakdown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPerformance {
    pub category_id: String,
    pub target_minor: i64,
    pub actual_minor: i64,
    /// `target - actual`; negative once the budget is overspent.
    pub remaining_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPerformanceReport {
    pub user_id: String,
    pub year: i32,
    pub month: u32,
    pub items: Vec<BudgetPerformance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_id: String,
    pub name: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalProgressReport {
    pub user_id: String,
    pub goals: Vec<GoalProgress>,
}

/// `current / target * 100`, or 0 for a zero target.
pub fn percent_of(current_minor: i64, target_minor: i64) -> f64 {
    if target_minor == 0 {
        return 0.0;
    }
    current_minor as f64 / target_minor as f64 * 100.0
}

pub(crate) fn cash_flow_pipeline(
    user_id: &str,
    kind: TransactionKind,
    window: ReportWindow,
    now: DateTime<Utc>,
) -> Pipeline {
    let mut filter = Filter::new()
        .eq("user_id", user_id)
        .eq("kind", kind.as_str())
        .active();
    if let Some(since) = window.since(now) {
        filter = filter.and("date", Condition::Gte(timestamp_value(since)));
    }

    let pipeline = Pipeline::new().then(Stage::Match(filter));
    if window.by_month() {
        pipeline
            .then(Stage::Group(
                Group::by(GroupKey::YearMonth("date".to_string())).sum("total", "amount_minor"),
            ))
            .then(Stage::Sort(vec![("_id".to_string(), SortOrder::Asc)]))
    } else {
        pipeline.then(Stage::Group(
            Group::by(GroupKey::Null).sum("total", "amount_minor"),
        ))
    }
}

pub(crate) fn cash_flow_breakdown(window: ReportWindow, rows: Vec<Document>) -> CashFlowBreakdown {
    if window.by_month() {
        CashFlowBreakdown::Monthly(
            rows.into_iter()
                .filter_map(|row| {
                    Some(MonthlyTotal {
                        month: row.get("_id")?.as_str()?.to_string(),
                        total_minor: int_field(&row, "total"),
                    })
                })
                .collect(),
        )
    } else {
        CashFlowBreakdown::Total(rows.first().map(|row| int_field(row, "total")).unwrap_or(0))
    }
}

/// First day of `year-month` and of the month after, as a half-open window.
pub(crate) fn month_bounds(year: i32, month: u32) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = || EngineError::InvalidDate(format!("invalid report month {year}-{month}"));
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(invalid)?;
    match (start.and_hms_opt(0, 0, 0), end.and_hms_opt(0, 0, 0)) {
        (Some(start), Some(end)) => Ok((start.and_utc(), end.and_utc())),
        _ => Err(invalid()),
    }
}

pub(crate) fn budget_performance_pipeline(
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Pipeline {
    Pipeline::new()
        .then(Stage::Match(
            Filter::new()
                .eq("user_id", user_id)
                .eq("period", BudgetPeriod::Monthly.as_str())
                .and(
                    "start_date",
                    Condition::Range {
                        gte: timestamp_value(start),
                        lt: timestamp_value(end),
                    },
                )
                .active(),
        ))
        .then(Stage::Lookup(Lookup {
            from: transactions::COLLECTION.to_string(),
            local_field: "category_id".to_string(),
            foreign_field: "category_id".to_string(),
            as_field: "transactions".to_string(),
            active_only: true,
        }))
        .then(Stage::Unwind(Unwind {
            path: "transactions".to_string(),
            preserve_empty: true,
        }))
        .then(Stage::Group(
            Group::by(GroupKey::Field("category_id".to_string()))
                .first("target", "amount_minor")
                .sum("actual", "transactions.amount_minor"),
        ))
}

pub(crate) fn budget_performance_rows(rows: Vec<Document>) -> Vec<BudgetPerformance> {
    rows.into_iter()
        .map(|row| {
            let target_minor = int_field(&row, "target");
            let actual_minor = int_field(&row, "actual");
            BudgetPerformance {
                category_id: row
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                target_minor,
                actual_minor,
                remaining_minor: target_minor - actual_minor,
            }
        })
        .collect()
}

pub(crate) fn goal_progress_pipeline(user_id: &str) -> Pipeline {
    Pipeline::new()
        .then(Stage::Match(
            Filter::new()
                .eq("user_id", user_id)
                .eq("status", GoalStatus::InProgress.as_str())
                .active(),
        ))
        .then(Stage::Lookup(Lookup {
            from: accounts::COLLECTION.to_string(),
            local_field: "account_id".to_string(),
            foreign_field: "_id".to_string(),
            as_field: "account".to_string(),
            active_only: true,
        }))
        .then(Stage::Unwind(Unwind {
            path: "account".to_string(),
            preserve_empty: true,
        }))
        .then(Stage::Lookup(Lookup {
            from: transactions::COLLECTION.to_string(),
            local_field: "account_id".to_string(),
            foreign_field: "account_id".to_string(),
            as_field: "transactions".to_string(),
            active_only: true,
        }))
        .then(Stage::Unwind(Unwind {
            path: "transactions".to_string(),
            preserve_empty: true,
        }))
        .then(Stage::Group(
            Group::by(GroupKey::Field("_id".to_string()))
                .first("name", "name")
                .first("target", "target_minor")
                .sum("current", "transactions.amount_minor"),
        ))
}

pub(crate) fn goal_progress_rows(rows: Vec<Document>) -> Vec<GoalProgress> {
    rows.into_iter()
        .map(|row| {
            let target_minor = int_field(&row, "target");
            let current_minor = int_field(&row, "current");
            GoalProgress {
                goal_id: str_field(&row, "_id"),
                name: str_field(&row, "name"),
                target_minor,
                current_minor,
                percent: percent_of(current_minor, target_minor),
            }
        })
        .collect()
}

fn int_field(row: &Document, field: &str) -> i64 {
    row.get(field).and_then(Value::as_i64).unwrap_or(0)
}

fn str_field(row: &Document, field: &str) -> String {
    row.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn yearly_wins_over_monthly() {
        let both = ReportWindow {
            yearly: true,
            monthly: true,
        };
        assert_eq!(
            both.since(now()),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap())
        );
        assert!(!both.by_month());

        let monthly = ReportWindow {
            yearly: false,
            monthly: true,
        };
        assert_eq!(
            monthly.since(now()),
            Some(Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap())
        );
        assert!(monthly.by_month());
        assert_eq!(ReportWindow::default().since(now()), None);
    }

    #[test]
    fn monthly_pipeline_groups_and_sorts() {
        let window = ReportWindow {
            yearly: false,
            monthly: true,
        };
        let rendered =
            cash_flow_pipeline("u1", TransactionKind::Expense, window, now()).explain();
        assert_eq!(rendered[0]["$match"]["kind"], "EXPENSE");
        assert_eq!(
            rendered[1]["$group"]["_id"]["$dateToString"]["format"],
            "%Y-%m"
        );
        assert_eq!(rendered[2]["$sort"]["_id"], 1);
    }

    #[test]
    fn empty_results_normalize_per_shape() {
        assert_eq!(
            cash_flow_breakdown(ReportWindow::default(), Vec::new()),
            CashFlowBreakdown::Total(0)
        );
        let monthly = ReportWindow {
            yearly: false,
            monthly: true,
        };
        assert_eq!(
            cash_flow_breakdown(monthly, Vec::new()),
            CashFlowBreakdown::Monthly(Vec::new())
        );
    }

    #[test]
    fn month_bounds_rolls_over_the_year() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert!(month_bounds(2024, 0).is_err());
        assert!(month_bounds(2024, 13).is_err());
    }

    #[test]
    fn remaining_is_target_minus_actual() {
        let rows = vec![
            json!({"_id": "cat", "target": 500, "actual": 175})
                .as_object()
                .cloned()
                .unwrap(),
        ];
        let items = budget_performance_rows(rows);
        assert_eq!(items[0].remaining_minor, 325);
    }

    #[test]
    fn zero_target_gives_zero_percent() {
        assert_eq!(percent_of(250, 0), 0.0);
        assert_eq!(percent_of(250, 1_000), 25.0);
    }
}
