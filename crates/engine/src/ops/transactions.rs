//! Transaction operations. Every committed mutation posts its balance effect
//! to the ledger after the durable write.

use crate::{
    Engine, NewTransaction, Page, PageRequest, ResultEngine, Transaction, TransactionListFilter,
    TransactionUpdate, pipeline::Filter, transactions,
};

use super::owned_by;

/// Matches the transaction only while its balance effect is still the one
/// that was read, so a concurrent change turns the write into a
/// `KeyNotFound` instead of posting a stale delta.
fn unchanged(transaction: &Transaction) -> Filter {
    owned_by(&transaction.id, &transaction.user_id)
        .eq("account_id", transaction.account_id.as_str())
        .eq("kind", transaction.kind.as_str())
        .eq("amount_minor", transaction.amount_minor)
}

impl Engine {
    /// Records a transaction and posts its signed amount to the account
    /// balance.
    pub async fn create_transaction(&self, new: NewTransaction) -> ResultEngine<String> {
        let transaction = new.into_transaction(self.now())?;
        let id = self
            .insert_record(transactions::COLLECTION, &transaction)
            .await?;
        self.ledger
            .post_delta(
                self.store.as_ref(),
                &transaction.account_id,
                transaction.signed_amount(),
            )
            .await;
        Ok(id)
    }

    pub async fn transaction(&self, id: &str, user_id: &str) -> ResultEngine<Transaction> {
        self.find_record(transactions::COLLECTION, id, user_id)
            .await
    }

    pub async fn list_transactions(
        &self,
        filter: &TransactionListFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Transaction>> {
        self.list_records(filter, page).await
    }

    /// Updates a transaction. The ledger receives the difference between the
    /// new and the old effect; moving a transaction between accounts reverses
    /// it on the old account and applies it on the new one.
    pub async fn update_transaction(&self, update: TransactionUpdate) -> ResultEngine<()> {
        let before: Transaction = self
            .find_record(transactions::COLLECTION, &update.id, &update.user_id)
            .await?;
        let mut after = before.clone();
        let set = update.apply(&mut after)?;
        self.update_matching(transactions::COLLECTION, &update.id, &unchanged(&before), set)
            .await?;

        let store = self.store.as_ref();
        if before.account_id == after.account_id {
            let delta = after.signed_amount() - before.signed_amount();
            if delta != 0 {
                self.ledger
                    .post_delta(store, &after.account_id, delta)
                    .await;
            }
        } else {
            self.ledger
                .post_delta(store, &before.account_id, -before.signed_amount())
                .await;
            self.ledger
                .post_delta(store, &after.account_id, after.signed_amount())
                .await;
        }
        Ok(())
    }

    /// Soft-deletes a transaction and reverses its effect on the balance.
    pub async fn delete_transaction(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        let transaction: Transaction = self
            .find_record(transactions::COLLECTION, id, user_id)
            .await?;
        self.soft_delete_matching(transactions::COLLECTION, id, &unchanged(&transaction))
            .await?;
        self.ledger
            .post_delta(
                self.store.as_ref(),
                &transaction.account_id,
                -transaction.signed_amount(),
            )
            .await;
        Ok(())
    }
}
