//! Balance ledger: a cache-resident running balance per account, derived from
//! the transaction log.
//!
//! The cache is a read optimization, never the system of record. Writes to it
//! are not part of the durable write: a failure is logged and absorbed, and a
//! crash in between leaves an entry that is stale until its TTL runs out.
//!
//! Invariant kept within the freshness window: the cached balance equals the
//! sum of signed amounts (income positive, expense negative) of the account's
//! non-deleted transactions. A hit is advanced by the delta; a miss is rebuilt
//! from the log, which already holds the committed mutation.
//!
//! Known gap: when a miss is rebuilt while another mutation on the same
//! account has committed but not yet posted, the rebuild already counts that
//! mutation and its later delta lands on top of it. Concurrent hits race the
//! same way (last write wins). Either drift lasts until the entry expires or
//! `recompute_balance` rewrites it from the log.

use std::{sync::Arc, time::Duration};

use serde_json::Value;

use crate::{
    BalanceCache, DocumentStore, ResultEngine,
    pipeline::{Filter, Group, GroupKey, Pipeline, Stage},
    transactions::{self, TransactionKind},
};

pub const DEFAULT_BALANCE_TTL: Duration = Duration::from_secs(10 * 60);

/// Effect of a transaction on its account balance.
pub fn signed_amount(kind: TransactionKind, amount_minor: i64) -> i64 {
    match kind {
        TransactionKind::Income => amount_minor,
        TransactionKind::Expense => -amount_minor,
    }
}

#[derive(Clone)]
pub struct BalanceLedger {
    cache: Arc<dyn BalanceCache>,
    ttl: Duration,
}

impl std::fmt::Debug for BalanceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceLedger")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl BalanceLedger {
    pub fn new(cache: Arc<dyn BalanceCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached balance, `None` when unknown.
    pub async fn cached_balance(&self, account_id: &str) -> ResultEngine<Option<i64>> {
        Ok(self.cache.balance(account_id).await?)
    }

    /// Sums the account's non-deleted transactions from the durable log.
    pub async fn balance_from_log(
        &self,
        store: &dyn DocumentStore,
        account_id: &str,
    ) -> ResultEngine<i64> {
        let pipeline = Pipeline::new()
            .then(Stage::Match(
                Filter::new().eq("account_id", account_id).active(),
            ))
            .then(Stage::Group(
                Group::by(GroupKey::Field("kind".to_string())).sum("total", "amount_minor"),
            ));

        let cursor = store
            .aggregate(transactions::COLLECTION, &pipeline)
            .await?;
        let mut balance = 0_i64;
        for doc in cursor {
            let total = doc.get("total").and_then(Value::as_i64).unwrap_or(0);
            match doc.get("_id").and_then(Value::as_str).map(TransactionKind::try_from) {
                Some(Ok(kind)) => balance += signed_amount(kind, total),
                _ => tracing::warn!(account_id, "ignoring transactions with an unknown kind"),
            }
        }
        Ok(balance)
    }

    /// Recomputes the balance from the log and refreshes the cache entry.
    pub async fn rebuild(&self, store: &dyn DocumentStore, account_id: &str) -> ResultEngine<i64> {
        let balance = self.balance_from_log(store, account_id).await?;
        self.cache
            .set_balance(account_id, balance, self.ttl)
            .await?;
        Ok(balance)
    }

    /// Posts a committed mutation's delta. Never fails: the durable write
    /// already happened, so problems here only leave the cache stale.
    pub async fn post_delta(&self, store: &dyn DocumentStore, account_id: &str, delta: i64) {
        match self.cache.balance(account_id).await {
            Ok(Some(current)) => {
                let next = current.saturating_add(delta);
                if let Err(err) = self.cache.set_balance(account_id, next, self.ttl).await {
                    tracing::warn!(account_id, delta, "failed to update cached balance: {err}");
                }
            }
            Ok(None) => {
                if let Err(err) = self.rebuild(store, account_id).await {
                    tracing::warn!(account_id, delta, "failed to rebuild cached balance: {err}");
                }
            }
            Err(err) => {
                tracing::warn!(account_id, delta, "failed to read cached balance: {err}");
            }
        }
    }
}
