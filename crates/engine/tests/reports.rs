use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sea_orm::Database;

use engine::{
    BudgetPeriod, CashFlowBreakdown, Engine, EngineError, GoalStatus, GoalUpdate, ManualClock,
    MonthlyTotal, NewAccount, NewBudget, NewGoal, NewTransaction, ReportWindow, TransactionKind,
};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
    ));
    Engine::builder()
        .database(db)
        .clock(clock)
        .build()
        .await
        .unwrap()
}

async fn book(
    engine: &Engine,
    account_id: &str,
    category_id: &str,
    kind: TransactionKind,
    amount_minor: i64,
    date: &str,
) -> String {
    engine
        .create_transaction(NewTransaction {
            account_id: account_id.to_string(),
            user_id: "alice".to_string(),
            category_id: category_id.to_string(),
            kind,
            amount_minor,
            description: String::new(),
            date: date.to_string(),
        })
        .await
        .unwrap()
}

async fn monthly_budget(engine: &Engine, category_id: &str, amount_minor: i64, start: &str) {
    engine
        .create_budget(NewBudget {
            user_id: "alice".to_string(),
            category_id: category_id.to_string(),
            amount_minor,
            period: BudgetPeriod::Monthly,
            start_date: start.to_string(),
            end_date: "2024-12-31".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn yearly_window_wins_and_excludes_older_spending() {
    let engine = engine().await;
    // 40 and 400 days before the fixed clock.
    book(&engine, "acc", "food", TransactionKind::Expense, 120, "2024-05-06 12:00:00").await;
    book(&engine, "acc", "food", TransactionKind::Expense, 999, "2023-05-12 12:00:00").await;

    let report = engine
        .spending_report(
            "alice",
            ReportWindow {
                yearly: true,
                monthly: true,
            },
        )
        .await
        .unwrap();
    assert!(report.yearly && report.monthly);
    assert_eq!(report.breakdown, CashFlowBreakdown::Total(120));

    let all_time = engine
        .spending_report("alice", ReportWindow::default())
        .await
        .unwrap();
    assert_eq!(all_time.breakdown, CashFlowBreakdown::Total(1_119));
}

#[tokio::test]
async fn monthly_window_breaks_down_by_month() {
    let engine = engine().await;
    book(&engine, "acc", "food", TransactionKind::Expense, 10, "2024-06-10 08:00:00").await;
    book(&engine, "acc", "food", TransactionKind::Expense, 5, "2024-05-26 08:00:00").await;
    book(&engine, "acc", "food", TransactionKind::Expense, 7, "2024-06-01 08:00:00").await;
    book(&engine, "acc", "food", TransactionKind::Expense, 50, "2024-04-01 08:00:00").await;
    book(&engine, "acc", "pay", TransactionKind::Income, 900, "2024-06-01 08:00:00").await;

    let window = ReportWindow {
        yearly: false,
        monthly: true,
    };
    let report = engine.spending_report("alice", window).await.unwrap();
    assert_eq!(
        report.breakdown,
        CashFlowBreakdown::Monthly(vec![
            MonthlyTotal {
                month: "2024-05".to_string(),
                total_minor: 5,
            },
            MonthlyTotal {
                month: "2024-06".to_string(),
                total_minor: 17,
            },
        ])
    );

    let income = engine.income_report("alice", window).await.unwrap();
    assert_eq!(income.kind, TransactionKind::Income);
    assert_eq!(
        income.breakdown,
        CashFlowBreakdown::Monthly(vec![MonthlyTotal {
            month: "2024-06".to_string(),
            total_minor: 900,
        }])
    );
}

#[tokio::test]
async fn empty_reports_are_successes() {
    let engine = engine().await;
    let total = engine
        .income_report("nobody", ReportWindow::default())
        .await
        .unwrap();
    assert_eq!(total.breakdown, CashFlowBreakdown::Total(0));

    let monthly = engine
        .spending_report(
            "nobody",
            ReportWindow {
                yearly: false,
                monthly: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(monthly.breakdown, CashFlowBreakdown::Monthly(Vec::new()));

    let budgets = engine.budget_performance("nobody", 2024, 6).await.unwrap();
    assert!(budgets.items.is_empty());
    let goals = engine.goal_progress("nobody").await.unwrap();
    assert!(goals.goals.is_empty());
}

#[tokio::test]
async fn budget_performance_compares_target_and_actual() {
    let engine = engine().await;
    monthly_budget(&engine, "food", 500, "2024-06-01").await;
    monthly_budget(&engine, "rent", 800, "2024-06-01").await;
    monthly_budget(&engine, "fun", 300, "2024-05-01").await;

    book(&engine, "acc", "food", TransactionKind::Expense, 100, "2024-06-02").await;
    book(&engine, "acc", "food", TransactionKind::Expense, 50, "2024-06-03").await;
    book(&engine, "acc", "food", TransactionKind::Expense, 25, "2024-06-04").await;
    let deleted = book(&engine, "acc", "food", TransactionKind::Expense, 1_000, "2024-06-05").await;
    engine.delete_transaction(&deleted, "alice").await.unwrap();

    let report = engine.budget_performance("alice", 2024, 6).await.unwrap();
    assert_eq!(report.items.len(), 2);

    let food = &report.items[0];
    assert_eq!(food.category_id, "food");
    assert_eq!(food.target_minor, 500);
    assert_eq!(food.actual_minor, 175);
    assert_eq!(food.remaining_minor, 325);

    let rent = &report.items[1];
    assert_eq!(rent.category_id, "rent");
    assert_eq!(rent.actual_minor, 0);
    assert_eq!(rent.remaining_minor, 800);
}

#[tokio::test]
async fn budget_performance_rejects_invalid_month() {
    let engine = engine().await;
    let err = engine.budget_performance("alice", 2024, 13).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));
}

#[tokio::test]
async fn goal_progress_follows_the_linked_account() {
    let engine = engine().await;
    let savings = engine
        .create_account(NewAccount {
            user_id: "alice".to_string(),
            name: "Savings".to_string(),
            account_type: "savings".to_string(),
            balance_minor: 0,
            currency: "EUR".to_string(),
        })
        .await
        .unwrap();
    book(&engine, &savings, "deposit", TransactionKind::Income, 150, "2024-06-01").await;
    book(&engine, &savings, "deposit", TransactionKind::Income, 100, "2024-06-08").await;

    let new_goal = |name: &str, account_id: Option<String>| NewGoal {
        user_id: "alice".to_string(),
        name: name.to_string(),
        target_minor: 1_000,
        deadline: "2025-01-01".to_string(),
        status: GoalStatus::InProgress,
        account_id,
    };
    let linked = engine
        .create_goal(new_goal("Holiday", Some(savings.clone())))
        .await
        .unwrap();
    let unlinked = engine.create_goal(new_goal("Bike", None)).await.unwrap();
    let done = engine
        .create_goal(new_goal("Laptop", Some(savings)))
        .await
        .unwrap();
    engine
        .update_goal(GoalUpdate {
            id: done,
            user_id: "alice".to_string(),
            status: Some(GoalStatus::Achieved),
            ..Default::default()
        })
        .await
        .unwrap();

    let report = engine.goal_progress("alice").await.unwrap();
    assert_eq!(report.goals.len(), 2);

    let holiday = report.goals.iter().find(|g| g.goal_id == linked).unwrap();
    assert_eq!(holiday.name, "Holiday");
    assert_eq!(holiday.current_minor, 250);
    assert_eq!(holiday.percent, 25.0);

    let bike = report.goals.iter().find(|g| g.goal_id == unlinked).unwrap();
    assert_eq!(bike.current_minor, 0);
    assert_eq!(bike.percent, 0.0);
}
