//! Balance Mutator
//!
//! Applies one signed delta to one account and appends the matching ledger
//! entry in a single unit of work.

use rust_decimal::Decimal;

use crate::domain::OpType;
use crate::store::{Backend, UnitOfWork};

use super::{abort, WalletError};

/// Single-account deposits and withdrawals
#[derive(Debug, Clone)]
pub struct BalanceMutator<B> {
    backend: B,
    enforce_funds: bool,
}

impl<B: Backend> BalanceMutator<B> {
    pub fn new(backend: B, enforce_funds: bool) -> Self {
        Self {
            backend,
            enforce_funds,
        }
    }

    /// Add `amount` to the account balance and record it in the ledger.
    ///
    /// `amount` is already oriented by the caller: positive for deposits,
    /// negative for withdrawals. Store errors are returned unchanged.
    pub async fn apply_delta(
        &self,
        account_id: i64,
        op_type: OpType,
        amount: Decimal,
    ) -> Result<(), WalletError> {
        if !op_type.is_single_account() {
            return Err(WalletError::UnsupportedOperation(op_type));
        }

        let mut tx = self.backend.begin().await?;

        let balance = match self.write(&mut tx, account_id, op_type, amount).await {
            Ok(balance) => balance,
            Err(e) => {
                abort(tx, "apply_delta").await;
                return Err(e);
            }
        };

        tx.commit().await?;

        tracing::debug!(
            account_id,
            op_type = %op_type,
            amount = %amount,
            balance = %balance,
            "Balance delta applied"
        );

        Ok(())
    }

    async fn write(
        &self,
        tx: &mut B::Tx,
        account_id: i64,
        op_type: OpType,
        amount: Decimal,
    ) -> Result<Decimal, WalletError> {
        // The store performs the addition; the row lock it takes orders
        // concurrent deltas on the same account.
        let balance = tx
            .add_to_balance(account_id, amount)
            .await?
            .ok_or(WalletError::AccountNotFound(account_id))?;

        if self.enforce_funds && amount < Decimal::ZERO && balance < Decimal::ZERO {
            return Err(WalletError::insufficient_funds(
                account_id,
                -amount,
                balance - amount,
            ));
        }

        tx.insert_entry(account_id, op_type, amount).await?;

        Ok(balance)
    }
}
