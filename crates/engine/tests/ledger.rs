use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use sea_orm::Database;

use engine::{
    Engine, EngineError, ManualClock, NewAccount, NewTransaction, TransactionKind,
    TransactionUpdate,
};
use migration::MigratorTrait;

async fn engine_with_clock() -> (Engine, Arc<ManualClock>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
    ));
    let engine = Engine::builder()
        .database(db)
        .clock(clock.clone())
        .build()
        .await
        .unwrap();
    (engine, clock)
}

async fn account(engine: &Engine, name: &str) -> String {
    engine
        .create_account(NewAccount {
            user_id: "alice".to_string(),
            name: name.to_string(),
            account_type: "checking".to_string(),
            balance_minor: 0,
            currency: "EUR".to_string(),
        })
        .await
        .unwrap()
}

fn transaction(account_id: &str, kind: TransactionKind, amount_minor: i64) -> NewTransaction {
    NewTransaction {
        account_id: account_id.to_string(),
        user_id: "alice".to_string(),
        category_id: "general".to_string(),
        kind,
        amount_minor,
        description: String::new(),
        date: "2024-06-10 09:00:00".to_string(),
    }
}

#[tokio::test]
async fn expenses_accumulate_on_the_account() {
    let (engine, _clock) = engine_with_clock().await;
    let a = account(&engine, "A").await;

    engine
        .create_transaction(transaction(&a, TransactionKind::Expense, 30))
        .await
        .unwrap();
    assert_eq!(engine.balance(&a).await.unwrap(), Some(-30));

    engine
        .create_transaction(transaction(&a, TransactionKind::Expense, 20))
        .await
        .unwrap();
    assert_eq!(engine.balance(&a).await.unwrap(), Some(-50));
}

#[tokio::test]
async fn balance_expires_after_ttl_and_can_be_recomputed() {
    let (engine, clock) = engine_with_clock().await;
    let a = account(&engine, "A").await;

    assert_eq!(engine.balance(&a).await.unwrap(), None);
    engine
        .create_transaction(transaction(&a, TransactionKind::Expense, 40))
        .await
        .unwrap();
    assert_eq!(engine.balance(&a).await.unwrap(), Some(-40));

    clock.advance(Duration::minutes(10));
    assert_eq!(engine.balance(&a).await.unwrap(), None);

    assert_eq!(engine.recompute_balance(&a).await.unwrap(), -40);
    assert_eq!(engine.balance(&a).await.unwrap(), Some(-40));
}

#[tokio::test]
async fn miss_after_expiry_is_rebuilt_from_the_log() {
    let (engine, clock) = engine_with_clock().await;
    let a = account(&engine, "A").await;

    engine
        .create_transaction(transaction(&a, TransactionKind::Expense, 40))
        .await
        .unwrap();
    clock.advance(Duration::minutes(11));

    engine
        .create_transaction(transaction(&a, TransactionKind::Expense, 10))
        .await
        .unwrap();
    assert_eq!(engine.balance(&a).await.unwrap(), Some(-50));
}

#[tokio::test]
async fn income_credits_the_balance() {
    let (engine, _clock) = engine_with_clock().await;
    let a = account(&engine, "A").await;

    engine
        .create_transaction(transaction(&a, TransactionKind::Expense, 30))
        .await
        .unwrap();
    engine
        .create_transaction(transaction(&a, TransactionKind::Income, 100))
        .await
        .unwrap();
    assert_eq!(engine.balance(&a).await.unwrap(), Some(70));
    assert_eq!(engine.recompute_balance(&a).await.unwrap(), 70);
}

#[tokio::test]
async fn delete_reverses_the_effect() {
    let (engine, _clock) = engine_with_clock().await;
    let a = account(&engine, "A").await;

    let id = engine
        .create_transaction(transaction(&a, TransactionKind::Expense, 30))
        .await
        .unwrap();
    engine.delete_transaction(&id, "alice").await.unwrap();
    assert_eq!(engine.balance(&a).await.unwrap(), Some(0));
    assert_eq!(engine.recompute_balance(&a).await.unwrap(), 0);

    let err = engine.delete_transaction(&id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn update_posts_the_difference() {
    let (engine, _clock) = engine_with_clock().await;
    let a = account(&engine, "A").await;
    let b = account(&engine, "B").await;

    let id = engine
        .create_transaction(transaction(&a, TransactionKind::Expense, 30))
        .await
        .unwrap();
    engine
        .update_transaction(TransactionUpdate {
            id: id.clone(),
            user_id: "alice".to_string(),
            amount_minor: Some(50),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(engine.balance(&a).await.unwrap(), Some(-50));

    engine
        .update_transaction(TransactionUpdate {
            id: id.clone(),
            user_id: "alice".to_string(),
            account_id: Some(b.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(engine.balance(&a).await.unwrap(), Some(0));
    assert_eq!(engine.balance(&b).await.unwrap(), Some(-50));

    let moved = engine.transaction(&id, "alice").await.unwrap();
    assert_eq!(moved.account_id, b);
    assert_eq!(moved.amount_minor, 50);
}

#[tokio::test]
async fn rejected_mutations_leave_the_balance_alone() {
    let (engine, _clock) = engine_with_clock().await;
    let a = account(&engine, "A").await;

    let err = engine
        .create_transaction(transaction(&a, TransactionKind::Expense, -5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert_eq!(engine.balance(&a).await.unwrap(), None);

    let mut bad_date = transaction(&a, TransactionKind::Expense, 5);
    bad_date.date = "10/06/2024".to_string();
    let err = engine.create_transaction(bad_date).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));
    assert_eq!(engine.recompute_balance(&a).await.unwrap(), 0);
}

#[tokio::test]
async fn racing_update_and_delete_keep_the_balance_in_step() {
    let (engine, _clock) = engine_with_clock().await;
    let a = account(&engine, "A").await;

    for round in 0..20 {
        let id = engine
            .create_transaction(transaction(&a, TransactionKind::Expense, 10))
            .await
            .unwrap();

        let (updated, deleted) = tokio::join!(
            engine.update_transaction(TransactionUpdate {
                id: id.clone(),
                user_id: "alice".to_string(),
                amount_minor: Some(20),
                ..Default::default()
            }),
            engine.delete_transaction(&id, "alice"),
        );
        for outcome in [&updated, &deleted] {
            assert!(
                matches!(outcome, Ok(()) | Err(EngineError::KeyNotFound(_))),
                "round {round}: {outcome:?}"
            );
        }
        assert!(updated.is_ok() || deleted.is_ok(), "round {round}");

        let cached = engine.balance(&a).await.unwrap();
        let from_log = engine.recompute_balance(&a).await.unwrap();
        assert_eq!(cached, Some(from_log), "round {round}");
    }
}
