//! Account and ledger records
//!
//! Row-level types read from and written to the ledger store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A wallet account and its current balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub balance: Decimal,
    pub owner_ref: String,
}

/// Kind of balance-changing operation recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpType {
    Deposit,
    Withdraw,
    Transfer,
}

impl OpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpType::Deposit => "deposit",
            OpType::Withdraw => "withdraw",
            OpType::Transfer => "transfer",
        }
    }

    /// Whether this operation may be applied as a single-account delta.
    pub fn is_single_account(&self) -> bool {
        matches!(self, OpType::Deposit | OpType::Withdraw)
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an op_type string is not one of the known kinds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid operation type: {0}")]
pub struct UnknownOpType(pub String);

impl FromStr for OpType {
    type Err = UnknownOpType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(OpType::Deposit),
            "withdraw" => Ok(OpType::Withdraw),
            "transfer" => Ok(OpType::Transfer),
            other => Err(UnknownOpType(other.to_string())),
        }
    }
}

/// One immutable, signed balance change on one account.
///
/// Positive amounts credit the account, negative amounts debit it. A transfer
/// is recorded as two entries whose amounts sum to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub account_id: i64,
    pub op_type: OpType,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}
