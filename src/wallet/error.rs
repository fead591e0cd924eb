//! Wallet Error Types
//!
//! Failures returned by the balance mutator, transfer coordinator and
//! account reader.

use rust_decimal::Decimal;
use std::fmt;

use crate::domain::OpType;
use crate::store::{StoreError, StoreErrorKind};

/// Step of the transfer protocol at which a store failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferPhase {
    Begin,
    Lock,
    Debit,
    Credit,
    SenderEntry,
    ReceiverEntry,
    Commit,
}

impl TransferPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPhase::Begin => "failed to begin transfer",
            TransferPhase::Lock => "failed to lock accounts",
            TransferPhase::Debit => "failed to deduct from sender's balance",
            TransferPhase::Credit => "failed to add to receiver's balance",
            TransferPhase::SenderEntry => "failed to insert sender's transaction",
            TransferPhase::ReceiverEntry => "failed to insert receiver's transaction",
            TransferPhase::Commit => "failed to commit transfer",
        }
    }

    /// Tag a store failure with this phase.
    pub fn fail(self, source: StoreError) -> WalletError {
        WalletError::Transfer {
            phase: self,
            source,
        }
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by wallet operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WalletError {
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    #[error("Insufficient funds in account {account_id}: required {required}, available {available}")]
    InsufficientFunds {
        account_id: i64,
        required: Decimal,
        available: Decimal,
    },

    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    #[error("Operation '{0}' cannot be applied to a single account")]
    UnsupportedOperation(OpType),

    #[error("{phase}: {source}")]
    Transfer {
        phase: TransferPhase,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WalletError {
    pub fn insufficient_funds(account_id: i64, required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            account_id,
            required,
            available,
        }
    }

    /// Transfer step that failed, if this came from the transfer protocol
    pub fn transfer_phase(&self) -> Option<TransferPhase> {
        match self {
            Self::Transfer { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Classification of the underlying store failure, if any
    pub fn store_kind(&self) -> Option<StoreErrorKind> {
        match self {
            Self::Transfer { source, .. } => Some(source.kind()),
            Self::Store(source) => Some(source.kind()),
            _ => None,
        }
    }

    /// Check if retrying the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transfer { source, .. } | Self::Store(source) => source.is_retryable(),
            _ => false,
        }
    }

    /// Check if this error was caused by the request rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound(_)
                | Self::InsufficientFunds { .. }
                | Self::SameAccountTransfer
                | Self::UnsupportedOperation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_phase_messages() {
        let err = TransferPhase::Credit.fail(StoreError::new(
            StoreErrorKind::Unexpected,
            "connection reset",
        ));

        assert_eq!(
            err.to_string(),
            "failed to add to receiver's balance: connection reset"
        );
        assert_eq!(err.transfer_phase(), Some(TransferPhase::Credit));
        assert_eq!(err.store_kind(), Some(StoreErrorKind::Unexpected));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_reference_phase_texts() {
        assert_eq!(
            TransferPhase::Debit.to_string(),
            "failed to deduct from sender's balance"
        );
        assert_eq!(
            TransferPhase::SenderEntry.to_string(),
            "failed to insert sender's transaction"
        );
        assert_eq!(
            TransferPhase::ReceiverEntry.to_string(),
            "failed to insert receiver's transaction"
        );
    }

    #[test]
    fn test_store_error_passes_through() {
        let err: WalletError = StoreError::new(StoreErrorKind::Deadlock, "deadlock detected").into();

        assert_eq!(err.to_string(), "deadlock detected");
        assert_eq!(err.transfer_phase(), None);
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_insufficient_funds_error() {
        let err = WalletError::insufficient_funds(1, dec!(100.00), dec!(50.00));

        assert!(err.is_client_error());
        assert!(!err.is_retryable());
        assert_eq!(err.store_kind(), None);
        assert!(err.to_string().contains("100.00"));
        assert!(err.to_string().contains("50.00"));
    }
}
