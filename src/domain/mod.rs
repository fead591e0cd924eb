//! Domain module
//!
//! Core domain types: accounts, ledger entries and monetary amounts.

pub mod account;
pub mod amount;

pub use account::{Account, LedgerEntry, OpType, UnknownOpType};
pub use amount::{Amount, AmountError, MONEY_SCALE};
