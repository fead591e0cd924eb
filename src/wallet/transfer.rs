//! Transfer Coordinator
//!
//! Moves an amount between two accounts: both rows are locked, the sender
//! is debited, the receiver credited and one ledger entry is written per
//! side, all inside one unit of work.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::domain::{Amount, OpType};
use crate::store::{Backend, UnitOfWork};

use super::{abort, TransferPhase, WalletError};

/// Order in which the two account rows of a transfer are locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockOrder {
    /// Lower account id first. Two transfers touching the same pair of
    /// accounts always contend on the same first row, so they cannot
    /// deadlock regardless of direction.
    #[default]
    AscendingId,
    /// Sender first, then receiver. Opposite-direction transfers between
    /// the same pair can deadlock; the store then aborts one of them with
    /// a retryable deadlock error.
    CallerOrder,
}

impl LockOrder {
    /// Account ids in the order their rows are locked
    pub fn sequence(&self, from_id: i64, to_id: i64) -> [i64; 2] {
        match self {
            LockOrder::AscendingId if to_id < from_id => [to_id, from_id],
            LockOrder::AscendingId | LockOrder::CallerOrder => [from_id, to_id],
        }
    }
}

impl fmt::Display for LockOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockOrder::AscendingId => f.write_str("ascending"),
            LockOrder::CallerOrder => f.write_str("caller"),
        }
    }
}

impl FromStr for LockOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" | "ascending_id" => Ok(LockOrder::AscendingId),
            "caller" | "caller_order" => Ok(LockOrder::CallerOrder),
            other => Err(format!("unknown lock order: {}", other)),
        }
    }
}

/// Two-account transfers
#[derive(Debug, Clone)]
pub struct TransferCoordinator<B> {
    backend: B,
    lock_order: LockOrder,
    enforce_funds: bool,
}

impl<B: Backend> TransferCoordinator<B> {
    pub fn new(backend: B, lock_order: LockOrder, enforce_funds: bool) -> Self {
        Self {
            backend,
            lock_order,
            enforce_funds,
        }
    }

    /// Execute the transfer.
    ///
    /// Either both balances change and both ledger entries are written, or
    /// nothing is. Store failures are tagged with the step that failed.
    pub async fn transfer(
        &self,
        from_id: i64,
        to_id: i64,
        amount: Amount,
    ) -> Result<(), WalletError> {
        if from_id == to_id {
            return Err(WalletError::SameAccountTransfer);
        }

        let mut tx = self
            .backend
            .begin()
            .await
            .map_err(|e| TransferPhase::Begin.fail(e))?;

        if let Err(e) = self.run(&mut tx, from_id, to_id, amount).await {
            tracing::debug!(
                from_id,
                to_id,
                amount = %amount,
                error = %e,
                "Transfer aborted"
            );
            abort(tx, "transfer").await;
            return Err(e);
        }

        tx.commit()
            .await
            .map_err(|e| TransferPhase::Commit.fail(e))?;

        tracing::debug!(from_id, to_id, amount = %amount, "Transfer committed");

        Ok(())
    }

    async fn run(
        &self,
        tx: &mut B::Tx,
        from_id: i64,
        to_id: i64,
        amount: Amount,
    ) -> Result<(), WalletError> {
        // Lock phase: both rows before any write
        let [first, second] = self.lock_order.sequence(from_id, to_id);
        let first_balance = lock(tx, first).await?;
        let second_balance = lock(tx, second).await?;
        let available = if first == from_id {
            first_balance
        } else {
            second_balance
        };

        // Checked under the sender's lock, so no concurrent debit can slip in
        if self.enforce_funds && !amount.is_covered_by(available) {
            return Err(WalletError::insufficient_funds(
                from_id,
                amount.value(),
                available,
            ));
        }

        tx.add_to_balance(from_id, amount.debit())
            .await
            .map_err(|e| TransferPhase::Debit.fail(e))?
            .ok_or(WalletError::AccountNotFound(from_id))?;

        tx.add_to_balance(to_id, amount.credit())
            .await
            .map_err(|e| TransferPhase::Credit.fail(e))?
            .ok_or(WalletError::AccountNotFound(to_id))?;

        tx.insert_entry(from_id, OpType::Transfer, amount.debit())
            .await
            .map_err(|e| TransferPhase::SenderEntry.fail(e))?;

        tx.insert_entry(to_id, OpType::Transfer, amount.credit())
            .await
            .map_err(|e| TransferPhase::ReceiverEntry.fail(e))?;

        Ok(())
    }
}

async fn lock<T: UnitOfWork>(tx: &mut T, account_id: i64) -> Result<Decimal, WalletError> {
    tx.lock_account(account_id)
        .await
        .map_err(|e| TransferPhase::Lock.fail(e))?
        .ok_or(WalletError::AccountNotFound(account_id))
}
