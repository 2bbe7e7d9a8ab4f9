use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use engine::{
    AccountListFilter, AccountUpdate, CategoryKind, CategoryListFilter, DocumentStore, Engine,
    EngineError, ManualClock, MemoryStore, NewAccount, NewCategory, NewNotification,
    NewTransaction, NotificationListFilter, PageRequest, TransactionKind, TransactionListFilter,
};

struct Fixture {
    engine: Engine,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
    ));
    let engine = Engine::builder()
        .store(store.clone())
        .clock(clock.clone())
        .build()
        .await
        .unwrap();
    Fixture {
        engine,
        store,
        clock,
    }
}

fn new_account(name: &str, currency: &str, balance_minor: i64) -> NewAccount {
    NewAccount {
        user_id: "alice".to_string(),
        name: name.to_string(),
        account_type: "checking".to_string(),
        balance_minor,
        currency: currency.to_string(),
    }
}

#[tokio::test]
async fn empty_page_is_a_success() {
    let f = fixture().await;
    let page = f
        .engine
        .list_accounts(&AccountListFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 0);
    assert!(!page.has_more());
}

#[tokio::test]
async fn pages_walk_through_the_result() {
    let f = fixture().await;
    for i in 0..25 {
        f.engine
            .create_category(NewCategory {
                user_id: "alice".to_string(),
                name: format!("category {i:02}"),
                kind: CategoryKind::Expense,
            })
            .await
            .unwrap();
    }
    let filter = CategoryListFilter {
        user_id: Some("alice".to_string()),
        ..Default::default()
    };

    let first = f
        .engine
        .list_categories(&filter, PageRequest::new(1, 10))
        .await
        .unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_count, 25);
    assert_eq!(first.items[0].name, "category 00");
    assert!(first.has_more());

    let last = f
        .engine
        .list_categories(&filter, PageRequest::new(3, 10))
        .await
        .unwrap();
    assert_eq!(last.items.len(), 5);
    assert_eq!(last.items[0].name, "category 20");
    assert!(!last.has_more());

    let clamped = f
        .engine
        .list_categories(&filter, PageRequest::new(0, 0))
        .await
        .unwrap();
    assert_eq!(clamped.page, 1);
    assert_eq!(clamped.limit, 10);
    assert_eq!(clamped.items[0].name, "category 00");

    let beyond = f
        .engine
        .list_categories(&filter, PageRequest::new(9, 10))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total_count, 25);
}

#[tokio::test]
async fn account_filters_are_anded() {
    let f = fixture().await;
    f.engine
        .create_account(new_account("Main Checking", "EUR", 100))
        .await
        .unwrap();
    f.engine
        .create_account(new_account("Side checking", "usd", 0))
        .await
        .unwrap();
    f.engine
        .create_account(new_account("Savings", "EUR", 5_000))
        .await
        .unwrap();

    let filter = AccountListFilter {
        name: Some("CHECK".to_string()),
        currency: Some("eur".to_string()),
        ..Default::default()
    };
    let page = f
        .engine
        .list_accounts(&filter, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].name, "Main Checking");

    let zero_threshold = AccountListFilter {
        min_balance_minor: Some(0),
        ..Default::default()
    };
    let page = f
        .engine
        .list_accounts(&zero_threshold, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 3);

    let rich = AccountListFilter {
        min_balance_minor: Some(101),
        ..Default::default()
    };
    let page = f
        .engine
        .list_accounts(&rich, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Savings");
}

#[tokio::test]
async fn created_last_month_follows_the_clock() {
    let f = fixture().await;
    f.engine
        .create_account(new_account("Old", "EUR", 0))
        .await
        .unwrap();
    f.clock.advance(Duration::days(45));
    f.engine
        .create_account(new_account("New", "EUR", 0))
        .await
        .unwrap();

    let filter = AccountListFilter {
        created_last_month: true,
        ..Default::default()
    };
    let page = f
        .engine
        .list_accounts(&filter, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].name, "New");
}

#[tokio::test]
async fn deleted_records_disappear_from_every_read() {
    let f = fixture().await;
    let id = f
        .engine
        .create_account(new_account("Gone", "EUR", 0))
        .await
        .unwrap();
    f.engine.delete_account(&id, "alice").await.unwrap();

    let page = f
        .engine
        .list_accounts(&AccountListFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 0);
    assert!(matches!(
        f.engine.account(&id, "alice").await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        f.engine
            .update_account(AccountUpdate {
                id: id.clone(),
                user_id: "alice".to_string(),
                name: Some("Back".to_string()),
                ..Default::default()
            })
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn records_are_scoped_to_their_user() {
    let f = fixture().await;
    let id = f
        .engine
        .create_account(new_account("Mine", "EUR", 0))
        .await
        .unwrap();
    assert!(matches!(
        f.engine.account(&id, "mallory").await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        f.engine.delete_account(&id, "mallory").await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert_eq!(f.engine.account(&id, "alice").await.unwrap().name, "Mine");
}

#[tokio::test]
async fn transactions_filter_by_category_name_and_date() {
    let f = fixture().await;
    let food = f
        .engine
        .create_category(NewCategory {
            user_id: "alice".to_string(),
            name: "Groceries".to_string(),
            kind: CategoryKind::Expense,
        })
        .await
        .unwrap();
    let rent = f
        .engine
        .create_category(NewCategory {
            user_id: "alice".to_string(),
            name: "Rent".to_string(),
            kind: CategoryKind::Expense,
        })
        .await
        .unwrap();

    for (category_id, amount_minor, date) in [
        (&food, 40, "2024-06-01 10:00:00"),
        (&food, 60, "2024-05-20 10:00:00"),
        (&rent, 900, "2024-06-01 09:00:00"),
    ] {
        f.engine
            .create_transaction(NewTransaction {
                account_id: "acc".to_string(),
                user_id: "alice".to_string(),
                category_id: category_id.clone(),
                kind: TransactionKind::Expense,
                amount_minor,
                description: "weekly".to_string(),
                date: date.to_string(),
            })
            .await
            .unwrap();
    }

    let by_name = TransactionListFilter {
        category_name: Some("groc".to_string()),
        ..Default::default()
    };
    let page = f
        .engine
        .list_transactions(&by_name, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);
    assert!(page.items.iter().all(|t| t.category_id == food));

    let june = TransactionListFilter {
        date_from: Some("2024-06-01".to_string()),
        date_to: Some("2024-07-01".to_string()),
        ..by_name.clone()
    };
    let page = f
        .engine
        .list_transactions(&june, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].amount_minor, 40);

    // A partial range is dropped, not treated as open-ended.
    let partial = TransactionListFilter {
        date_from: Some("2024-06-01".to_string()),
        ..Default::default()
    };
    let page = f
        .engine
        .list_transactions(&partial, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 3);

    // Deleting the category hides its transactions from name searches.
    f.engine.delete_category(&food, "alice").await.unwrap();
    let page = f
        .engine
        .list_transactions(&by_name, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn notifications_start_unread() {
    let f = fixture().await;
    let id = f
        .engine
        .create_notification(NewNotification {
            user_id: "alice".to_string(),
            kind: "BUDGET".to_string(),
            message: "Food budget at 90%".to_string(),
            status: "SENT".to_string(),
        })
        .await
        .unwrap();

    let unread = NotificationListFilter {
        is_read: Some(false),
        ..Default::default()
    };
    let page = f
        .engine
        .list_notifications(&unread, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);

    f.engine.mark_notification_read(&id, "alice").await.unwrap();
    let page = f
        .engine
        .list_notifications(&unread, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 0);
    assert!(f.engine.notification(&id, "alice").await.unwrap().is_read);
}

#[tokio::test]
async fn cursors_are_released_after_decode_failure() {
    let f = fixture().await;
    f.engine
        .create_account(new_account("Fine", "EUR", 0))
        .await
        .unwrap();
    let broken = json!({"_id": "broken", "name": 42, "deleted_at": null});
    f.store
        .insert_one("accounts", broken.as_object().cloned().unwrap())
        .await
        .unwrap();

    let err = f
        .engine
        .list_accounts(&AccountListFilter::default(), PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Decode(_)));
    assert_eq!(f.store.open_cursors(), 0);

    let ok = f
        .engine
        .list_accounts(
            &AccountListFilter {
                name: Some("fine".to_string()),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(ok.items.len(), 1);
    assert_eq!(f.store.open_cursors(), 0);
}
