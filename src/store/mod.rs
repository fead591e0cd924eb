//! Ledger Store module
//!
//! The transactional store the wallet core runs against. A `Backend` opens
//! units of work and serves unlocked reads; a `UnitOfWork` executes the
//! statements of one atomic operation and ends in commit or rollback.

mod error;
pub mod memory;
pub mod postgres;

pub use error::{StoreError, StoreErrorKind};
pub use memory::{FailPoint, MemoryBackend};
pub use postgres::PgBackend;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Account, LedgerEntry, OpType};

/// Store that can start atomic units of work.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    type Tx: UnitOfWork;

    /// Open a unit of work. Nothing written through it is visible to others
    /// until `commit`.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Read one account without taking a lock.
    async fn find_account(&self, account_id: i64) -> Result<Option<Account>, StoreError>;

    /// Ledger entries of one account, newest first, ties broken by id.
    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, StoreError>;
}

/// Statements available inside one unit of work.
///
/// Dropping a unit of work without calling `commit` discards its writes.
#[async_trait]
pub trait UnitOfWork: Send + Sized {
    /// Blocking locking read. Returns the balance of the locked row, or
    /// `None` if the account does not exist.
    async fn lock_account(&mut self, account_id: i64) -> Result<Option<Decimal>, StoreError>;

    /// Add `delta` to the account balance with store-side arithmetic and
    /// return the new balance, or `None` if no row matched.
    async fn add_to_balance(
        &mut self,
        account_id: i64,
        delta: Decimal,
    ) -> Result<Option<Decimal>, StoreError>;

    /// Append one ledger entry.
    async fn insert_entry(
        &mut self,
        account_id: i64,
        op_type: OpType,
        amount: Decimal,
    ) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
