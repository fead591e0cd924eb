//! Wallet module
//!
//! The transactional core: balance deltas, two-account transfers and
//! account reads, exposed through the `WalletStore` capability trait.

mod error;
mod mutator;
mod reader;
mod transfer;

pub use error::{TransferPhase, WalletError};
pub use mutator::BalanceMutator;
pub use reader::AccountReader;
pub use transfer::{LockOrder, TransferCoordinator};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Account, Amount, LedgerEntry, OpType};
use crate::store::{Backend, UnitOfWork};

/// Wallet operations offered to callers.
///
/// Callers validate their input (operation whitelist, positive amounts,
/// distinct transfer accounts) before calling.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Apply a signed delta to one account and record it in the ledger
    async fn apply_delta(
        &self,
        account_id: i64,
        op_type: OpType,
        amount: Decimal,
    ) -> Result<(), WalletError>;

    /// Move `amount` from one account to another
    async fn transfer(&self, from_id: i64, to_id: i64, amount: Amount)
        -> Result<(), WalletError>;

    async fn get_account(&self, account_id: i64) -> Result<Account, WalletError>;

    /// One page of ledger history, newest first
    async fn get_ledger(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, WalletError>;
}

/// Behaviour switches of the wallet core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletOptions {
    pub lock_order: LockOrder,
    /// Reject debits that would leave a balance below zero
    pub enforce_funds: bool,
}

impl Default for WalletOptions {
    fn default() -> Self {
        Self {
            lock_order: LockOrder::AscendingId,
            enforce_funds: true,
        }
    }
}

/// `WalletStore` over any ledger backend
#[derive(Debug, Clone)]
pub struct Wallet<B> {
    mutator: BalanceMutator<B>,
    coordinator: TransferCoordinator<B>,
    reader: AccountReader<B>,
}

impl<B: Backend + Clone> Wallet<B> {
    pub fn new(backend: B, options: WalletOptions) -> Self {
        Self {
            mutator: BalanceMutator::new(backend.clone(), options.enforce_funds),
            coordinator: TransferCoordinator::new(
                backend.clone(),
                options.lock_order,
                options.enforce_funds,
            ),
            reader: AccountReader::new(backend),
        }
    }
}

#[async_trait]
impl<B: Backend + Clone> WalletStore for Wallet<B> {
    async fn apply_delta(
        &self,
        account_id: i64,
        op_type: OpType,
        amount: Decimal,
    ) -> Result<(), WalletError> {
        self.mutator.apply_delta(account_id, op_type, amount).await
    }

    async fn transfer(
        &self,
        from_id: i64,
        to_id: i64,
        amount: Amount,
    ) -> Result<(), WalletError> {
        self.coordinator.transfer(from_id, to_id, amount).await
    }

    async fn get_account(&self, account_id: i64) -> Result<Account, WalletError> {
        self.reader.get_account(account_id).await
    }

    async fn get_ledger(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, WalletError> {
        self.reader.get_ledger(account_id, limit, offset).await
    }
}

/// Roll back a failed unit of work. The failure that triggered it is what the caller
/// sees, so a rollback failure is only logged.
async fn abort<T: UnitOfWork>(tx: T, operation: &'static str) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(operation, error = %e, "Failed to roll back unit of work");
    }
}
