use crate::{Engine, ResultEngine};

impl Engine {
    /// Cached running balance of the account. `None` means unknown (never
    /// computed, or expired), not zero.
    pub async fn balance(&self, account_id: &str) -> ResultEngine<Option<i64>> {
        self.ledger.cached_balance(account_id).await
    }

    /// Recomputes the balance from the transaction log and refreshes the
    /// cache.
    pub async fn recompute_balance(&self, account_id: &str) -> ResultEngine<i64> {
        let balance = self
            .ledger
            .rebuild(self.store.as_ref(), account_id)
            .await?;
        tracing::info!(account_id, balance, "balance recomputed");
        Ok(balance)
    }
}
