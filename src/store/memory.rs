//! In-memory backend
//!
//! A `Backend` that keeps accounts and ledger entries in process memory.
//! Units of work are serialized by a single async mutex held from `begin`
//! to commit/rollback, and their writes are staged until commit. Fail points
//! make individual statements fail so rollback behaviour can be exercised.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{Account, LedgerEntry, OpType};

use super::{Backend, StoreError, StoreErrorKind, UnitOfWork};

/// Exclusive upper bound of a `NUMERIC(10,2)` value
fn numeric_limit() -> Decimal {
    Decimal::new(100_000_000, 0)
}

/// Statement that should fail when reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    Lock(i64),
    AddToBalance(i64),
    InsertEntry(i64),
    Commit,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: BTreeMap<i64, Account>,
    entries: Vec<LedgerEntry>,
    next_account_id: i64,
    next_entry_id: i64,
    fail_points: HashMap<FailPoint, StoreErrorKind>,
}

impl LedgerState {
    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        match self.fail_points.get(&point) {
            Some(kind) => Err(StoreError::new(
                *kind,
                format!("injected failure at {:?}", point),
            )),
            None => Ok(()),
        }
    }
}

/// Process-local ledger backend
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an account with an opening balance and return its id.
    pub async fn create_account(&self, owner_ref: &str, balance: Decimal) -> i64 {
        let mut state = self.state.lock().await;
        state.next_account_id += 1;
        let id = state.next_account_id;
        state.accounts.insert(
            id,
            Account {
                id,
                balance,
                owner_ref: owner_ref.to_string(),
            },
        );
        id
    }

    /// Make the given statement fail with `kind` until cleared.
    pub async fn fail_on(&self, point: FailPoint, kind: StoreErrorKind) {
        self.state.lock().await.fail_points.insert(point, kind);
    }

    pub async fn clear_fail_points(&self) {
        self.state.lock().await.fail_points.clear();
    }

    /// Every committed ledger entry in insertion order.
    pub async fn all_entries(&self) -> Vec<LedgerEntry> {
        self.state.lock().await.entries.clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        guard.check(FailPoint::Begin)?;

        Ok(MemoryUnitOfWork {
            state: guard,
            balances: HashMap::new(),
            entries: Vec::new(),
        })
    }

    async fn find_account(&self, account_id: i64) -> Result<Option<Account>, StoreError> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        if limit < 0 {
            return Err(StoreError::new(
                StoreErrorKind::Unexpected,
                "LIMIT must not be negative",
            ));
        }
        if offset < 0 {
            return Err(StoreError::new(
                StoreErrorKind::Unexpected,
                "OFFSET must not be negative",
            ));
        }

        let state = self.state.lock().await;
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|entry| entry.account_id == account_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(entries
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

/// Staged writes of one in-memory unit of work
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    state: OwnedMutexGuard<LedgerState>,
    balances: HashMap<i64, Decimal>,
    entries: Vec<(i64, OpType, Decimal)>,
}

impl MemoryUnitOfWork {
    fn current_balance(&self, account_id: i64) -> Option<Decimal> {
        self.balances.get(&account_id).copied().or_else(|| {
            self.state
                .accounts
                .get(&account_id)
                .map(|account| account.balance)
        })
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_account(&mut self, account_id: i64) -> Result<Option<Decimal>, StoreError> {
        self.state.check(FailPoint::Lock(account_id))?;
        Ok(self.current_balance(account_id))
    }

    async fn add_to_balance(
        &mut self,
        account_id: i64,
        delta: Decimal,
    ) -> Result<Option<Decimal>, StoreError> {
        self.state.check(FailPoint::AddToBalance(account_id))?;

        let Some(current) = self.current_balance(account_id) else {
            return Ok(None);
        };

        let updated = current + delta;
        if updated.abs() >= numeric_limit() {
            return Err(StoreError::new(
                StoreErrorKind::Unexpected,
                "numeric field overflow",
            ));
        }

        self.balances.insert(account_id, updated);
        Ok(Some(updated))
    }

    async fn insert_entry(
        &mut self,
        account_id: i64,
        op_type: OpType,
        amount: Decimal,
    ) -> Result<(), StoreError> {
        self.state.check(FailPoint::InsertEntry(account_id))?;

        if !self.state.accounts.contains_key(&account_id) {
            return Err(StoreError::new(
                StoreErrorKind::ConstraintViolation,
                format!(
                    "insert on ledger_entry violates foreign key: account {} does not exist",
                    account_id
                ),
            ));
        }

        self.entries.push((account_id, op_type, amount));
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.state.check(FailPoint::Commit)?;

        let mut this = self;
        let state = &mut *this.state;
        for (account_id, balance) in this.balances.drain() {
            if let Some(account) = state.accounts.get_mut(&account_id) {
                account.balance = balance;
            }
        }

        // All entries of one unit of work share its timestamp
        let created_at = Utc::now();
        for (account_id, op_type, amount) in this.entries.drain(..) {
            state.next_entry_id += 1;
            state.entries.push(LedgerEntry {
                id: state.next_entry_id,
                account_id,
                op_type,
                amount,
                created_at,
            });
        }

        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_commit_applies_staged_writes() {
        let backend = MemoryBackend::new();
        let id = backend.create_account("user1", dec!(100.00)).await;

        let mut tx = backend.begin().await.unwrap();
        assert_eq!(tx.add_to_balance(id, dec!(-30.00)).await.unwrap(), Some(dec!(70.00)));
        tx.insert_entry(id, OpType::Withdraw, dec!(-30.00)).await.unwrap();
        tx.commit().await.unwrap();

        let account = backend.find_account(id).await.unwrap().unwrap();
        assert_eq!(account.balance, dec!(70.00));
        assert_eq!(backend.all_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let backend = MemoryBackend::new();
        let id = backend.create_account("user1", dec!(100.00)).await;

        let mut tx = backend.begin().await.unwrap();
        tx.add_to_balance(id, dec!(5.00)).await.unwrap();
        tx.insert_entry(id, OpType::Deposit, dec!(5.00)).await.unwrap();
        tx.rollback().await.unwrap();

        let account = backend.find_account(id).await.unwrap().unwrap();
        assert_eq!(account.balance, dec!(100.00));
        assert!(backend.all_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_writes() {
        let backend = MemoryBackend::new();
        let id = backend.create_account("user1", dec!(1.00)).await;

        {
            let mut tx = backend.begin().await.unwrap();
            tx.add_to_balance(id, dec!(1.00)).await.unwrap();
        }

        let account = backend.find_account(id).await.unwrap().unwrap();
        assert_eq!(account.balance, dec!(1.00));
    }

    #[tokio::test]
    async fn test_missing_account_behaviour() {
        let backend = MemoryBackend::new();

        let mut tx = backend.begin().await.unwrap();
        assert_eq!(tx.lock_account(42).await.unwrap(), None);
        assert_eq!(tx.add_to_balance(42, dec!(1.00)).await.unwrap(), None);
        let err = tx.insert_entry(42, OpType::Deposit, dec!(1.00)).await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::ConstraintViolation);
    }

    #[tokio::test]
    async fn test_fail_point_reports_configured_kind() {
        let backend = MemoryBackend::new();
        let id = backend.create_account("user1", dec!(0.00)).await;
        backend
            .fail_on(FailPoint::Lock(id), StoreErrorKind::LockTimeout)
            .await;

        let mut tx = backend.begin().await.unwrap();
        let err = tx.lock_account(id).await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::LockTimeout);
        drop(tx);

        backend.clear_fail_points().await;
        let mut tx = backend.begin().await.unwrap();
        assert_eq!(tx.lock_account(id).await.unwrap(), Some(dec!(0.00)));
    }

    #[tokio::test]
    async fn test_numeric_overflow_rejected() {
        let backend = MemoryBackend::new();
        let id = backend.create_account("user1", dec!(99999999.99)).await;

        let mut tx = backend.begin().await.unwrap();
        let err = tx.add_to_balance(id, dec!(0.01)).await.unwrap_err();
        assert_eq!(err.to_string(), "numeric field overflow");
    }

    #[tokio::test]
    async fn test_list_entries_rejects_negative_paging() {
        let backend = MemoryBackend::new();
        assert!(backend.list_entries(1, -1, 0).await.is_err());
        assert!(backend.list_entries(1, 10, -1).await.is_err());
        assert!(backend.list_entries(1, 10, 0).await.unwrap().is_empty());
    }
}
