use crate::{
    Account, AccountListFilter, AccountUpdate, Engine, NewAccount, Page, PageRequest,
    ResultEngine, accounts,
};

impl Engine {
    /// Creates an account and returns its id.
    pub async fn create_account(&self, new: NewAccount) -> ResultEngine<String> {
        let account = new.into_account(self.now())?;
        self.insert_record(accounts::COLLECTION, &account).await
    }

    pub async fn account(&self, id: &str, user_id: &str) -> ResultEngine<Account> {
        self.find_record(accounts::COLLECTION, id, user_id).await
    }

    pub async fn list_accounts(
        &self,
        filter: &AccountListFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Account>> {
        self.list_records(filter, page).await
    }

    pub async fn update_account(&self, update: AccountUpdate) -> ResultEngine<()> {
        let set = update.set_document()?;
        self.update_record(accounts::COLLECTION, &update.id, &update.user_id, set)
            .await
    }

    pub async fn delete_account(&self, id: &str, user_id: &str) -> ResultEngine<()> {
        self.soft_delete(accounts::COLLECTION, id, user_id).await
    }
}
