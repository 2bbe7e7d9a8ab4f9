//! Record-keeping engine for personal finance.
//!
//! The engine owns the document collections (accounts, transactions,
//! categories, budgets, goals, notifications), builds the filter and report
//! pipelines that run against them, and keeps the cached running balance of
//! every account in step with the transaction log.

use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

pub use accounts::{Account, AccountListFilter, AccountUpdate, NewAccount};
pub use budgets::{Budget, BudgetListFilter, BudgetPeriod, BudgetUpdate, NewBudget};
pub use cache::{BalanceCache, MemoryBalanceCache};
#[cfg(feature = "redis")]
pub use cache::RedisBalanceCache;
pub use categories::{Category, CategoryKind, CategoryListFilter, CategoryUpdate, NewCategory};
pub use clock::{Clock, ManualClock, SystemClock};
pub use document::Document;
pub use error::{CacheError, EngineError};
pub use events::{InboundMessage, Topic};
pub use executor::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use filters::{ListFilter, StageBuilder};
pub use goals::{Goal, GoalListFilter, GoalStatus, GoalUpdate, NewGoal};
pub use ledger::{BalanceLedger, DEFAULT_BALANCE_TTL, signed_amount};
pub use notifications::{NewNotification, Notification, NotificationListFilter};
pub use pipeline::{Pipeline, Stage};
pub use reports::{
    BudgetPerformance, BudgetPerformanceReport, CashFlowBreakdown, CashFlowReport,
    GoalProgress, GoalProgressReport, MonthlyTotal, ReportWindow,
};
pub use store::{DocumentCursor, DocumentStore, MemoryStore, SqlStore};
pub use transactions::{
    NewTransaction, Transaction, TransactionKind, TransactionListFilter, TransactionUpdate,
};

mod accounts;
mod budgets;
mod cache;
mod categories;
mod clock;
pub mod document;
mod error;
pub mod events;
pub mod executor;
pub mod filters;
mod goals;
mod ledger;
mod notifications;
mod ops;
pub mod pipeline;
pub mod reports;
pub mod store;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;

pub struct Engine {
    store: Arc<dyn DocumentStore>,
    ledger: BalanceLedger,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn DocumentStore>>,
    cache: Option<Arc<dyn BalanceCache>>,
    clock: Option<Arc<dyn Clock>>,
    balance_ttl: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database; documents are kept in its `documents`
    /// table.
    pub fn database(self, db: DatabaseConnection) -> EngineBuilder {
        self.store(Arc::new(SqlStore::new(db)))
    }

    /// Use an explicit document store instead of a database.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Balance cache. Defaults to an in-memory cache on the engine clock.
    pub fn cache(mut self, cache: Arc<dyn BalanceCache>) -> EngineBuilder {
        self.cache = Some(cache);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> EngineBuilder {
        self.clock = Some(clock);
        self
    }

    pub fn balance_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.balance_ttl = Some(ttl);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let store = self.store.ok_or_else(|| {
            EngineError::InvalidRequest("a database or document store is required".to_string())
        })?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryBalanceCache::with_clock(Arc::clone(&clock))));
        let ttl = self.balance_ttl.unwrap_or(DEFAULT_BALANCE_TTL);

        Ok(Engine {
            store,
            ledger: BalanceLedger::new(cache, ttl),
            clock,
        })
    }
}
