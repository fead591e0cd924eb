//! Account Reader
//!
//! Read-only lookups of balances and ledger history.

use crate::domain::{Account, LedgerEntry};
use crate::store::Backend;

use super::WalletError;

#[derive(Debug, Clone)]
pub struct AccountReader<B> {
    backend: B,
}

impl<B: Backend> AccountReader<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get an account by id
    pub async fn get_account(&self, account_id: i64) -> Result<Account, WalletError> {
        self.backend
            .find_account(account_id)
            .await?
            .ok_or(WalletError::AccountNotFound(account_id))
    }

    /// Get one page of an account's ledger, newest first.
    ///
    /// An account without entries yields an empty page. `limit` and
    /// `offset` are passed to the store as given.
    pub async fn get_ledger(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, WalletError> {
        let entries = self
            .backend
            .list_entries(account_id, limit, offset)
            .await?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OpType;
    use crate::store::{MemoryBackend, UnitOfWork};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Commit one deposit entry per amount, each in its own unit of work
    async fn seed_entries(backend: &MemoryBackend, account_id: i64, amounts: &[Decimal]) {
        for amount in amounts {
            let mut tx = backend.begin().await.unwrap();
            tx.add_to_balance(account_id, *amount).await.unwrap();
            tx.insert_entry(account_id, OpType::Deposit, *amount).await.unwrap();
            tx.commit().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_get_account() {
        let backend = MemoryBackend::new();
        let id = backend.create_account("user1", dec!(12.50)).await;
        let reader = AccountReader::new(backend);

        let account = reader.get_account(id).await.unwrap();
        assert_eq!(account.id, id);
        assert_eq!(account.balance, dec!(12.50));
        assert_eq!(account.owner_ref, "user1");
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let reader = AccountReader::new(MemoryBackend::new());

        let err = reader.get_account(7).await.unwrap_err();
        assert_eq!(err, WalletError::AccountNotFound(7));
    }

    #[tokio::test]
    async fn test_empty_ledger_is_not_an_error() {
        let backend = MemoryBackend::new();
        let id = backend.create_account("user1", dec!(0.00)).await;
        let reader = AccountReader::new(backend);

        assert!(reader.get_ledger(id, 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_pages_newest_first() {
        let backend = MemoryBackend::new();
        let id = backend.create_account("user1", dec!(0.00)).await;
        let other = backend.create_account("user2", dec!(0.00)).await;
        seed_entries(&backend, id, &[dec!(1.00), dec!(2.00), dec!(3.00), dec!(4.00), dec!(5.00)]).await;
        seed_entries(&backend, other, &[dec!(9.00)]).await;
        let reader = AccountReader::new(backend);

        let all = reader.get_ledger(id, 100, 0).await.unwrap();
        let amounts: Vec<Decimal> = all.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![dec!(5.00), dec!(4.00), dec!(3.00), dec!(2.00), dec!(1.00)]);
        assert!(all.iter().all(|e| e.account_id == id));

        let page = reader.get_ledger(id, 2, 1).await.unwrap();
        assert_eq!(page, all[1..3].to_vec());

        let tail = reader.get_ledger(id, 2, 4).await.unwrap();
        assert_eq!(tail, all[4..].to_vec());

        assert!(reader.get_ledger(id, 2, 5).await.unwrap().is_empty());
    }
}
