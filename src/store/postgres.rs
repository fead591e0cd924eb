//! PostgreSQL backend
//!
//! Runs units of work as `sqlx` transactions against the `account` and
//! `ledger_entry` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

use crate::domain::{Account, LedgerEntry, OpType};

use super::{Backend, StoreError, StoreErrorKind, UnitOfWork};

/// Ledger backend over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
    lock_timeout: Option<Duration>,
}

impl PgBackend {
    /// Create a backend whose lock waits are bounded only by the server defaults
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    /// Bound every row-lock wait inside a unit of work. A zero duration
    /// leaves lock waits unbounded.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }
}

fn lock_timeout_setting(timeout: Duration) -> String {
    format!("{}ms", timeout.as_millis())
}

#[async_trait]
impl Backend for PgBackend {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Some(timeout) = self.lock_timeout {
            // is_local = true scopes the setting to this transaction
            sqlx::query("SELECT set_config('lock_timeout', $1, true)")
                .bind(lock_timeout_setting(timeout))
                .execute(&mut *tx)
                .await?;
        }

        Ok(PgUnitOfWork { tx })
    }

    async fn find_account(&self, account_id: i64) -> Result<Option<Account>, StoreError> {
        let row: Option<(i64, Decimal, String)> = sqlx::query_as(
            r#"
            SELECT id, balance, owner_ref
            FROM account
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, balance, owner_ref)| Account {
            id,
            balance,
            owner_ref,
        }))
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows: Vec<(i64, i64, String, Decimal, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, account_id, op_type, amount, created_at
            FROM ledger_entry
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, account_id, op_type, amount, created_at)| {
                let op_type = op_type
                    .parse::<OpType>()
                    .map_err(|e| StoreError::new(StoreErrorKind::Unexpected, e.to_string()))?;
                Ok(LedgerEntry {
                    id,
                    account_id,
                    op_type,
                    amount,
                    created_at,
                })
            })
            .collect()
    }
}

/// One open PostgreSQL transaction
#[derive(Debug)]
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_account(&mut self, account_id: i64) -> Result<Option<Decimal>, StoreError> {
        let balance: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM account WHERE id = $1 FOR UPDATE")
                .bind(account_id)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(balance)
    }

    async fn add_to_balance(
        &mut self,
        account_id: i64,
        delta: Decimal,
    ) -> Result<Option<Decimal>, StoreError> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            UPDATE account
            SET balance = balance + $1
            WHERE id = $2
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(account_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(balance)
    }

    async fn insert_entry(
        &mut self,
        account_id: i64,
        op_type: OpType,
        amount: Decimal,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entry (account_id, op_type, amount)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(account_id)
        .bind(op_type.as_str())
        .bind(amount)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
