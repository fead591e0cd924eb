//! wallet_ledger Library
//!
//! Account balances with an append-only ledger, single-account deltas and
//! two-account transfers over a transactional store.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod store;
pub mod wallet;

pub use config::Config;
pub use domain::{Account, Amount, AmountError, LedgerEntry, OpType};
pub use error::{AppError, AppResult};
pub use store::{Backend, MemoryBackend, PgBackend, StoreError, StoreErrorKind, UnitOfWork};
pub use wallet::{LockOrder, TransferPhase, Wallet, WalletError, WalletOptions, WalletStore};
