//! Store Errors
//!
//! Classified failures reported by a ledger backend.

use std::fmt;

/// SQLSTATE codes that identify contention and cancellation in PostgreSQL
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";
const SQLSTATE_LOCK_NOT_AVAILABLE: &str = "55P03";
const SQLSTATE_QUERY_CANCELED: &str = "57014";

/// Kind of store failure, independent of the backend that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// A row that had to exist was absent
    NotFound,
    /// Check, foreign-key, not-null or uniqueness constraint rejected a write
    ConstraintViolation,
    /// A lock could not be acquired within the configured wait
    LockTimeout,
    /// The store aborted the unit of work to break a lock cycle
    Deadlock,
    /// A serializable transaction conflicted with a concurrent one
    SerializationFailure,
    /// A statement was cancelled by `statement_timeout` or a cancel request
    Cancelled,
    /// The store could not be reached or the pool is exhausted
    Unavailable,
    /// Anything else, passed through as-is
    Unexpected,
}

impl StoreErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorKind::NotFound => "not_found",
            StoreErrorKind::ConstraintViolation => "constraint_violation",
            StoreErrorKind::LockTimeout => "lock_timeout",
            StoreErrorKind::Deadlock => "deadlock",
            StoreErrorKind::SerializationFailure => "serialization_failure",
            StoreErrorKind::Cancelled => "statement_cancelled",
            StoreErrorKind::Unavailable => "store_unavailable",
            StoreErrorKind::Unexpected => "unexpected_store_error",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by a backend statement, begin, commit or rollback
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// Contention and connectivity failures may succeed when the whole
    /// operation is retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::LockTimeout
                | StoreErrorKind::Deadlock
                | StoreErrorKind::SerializationFailure
                | StoreErrorKind::Cancelled
                | StoreErrorKind::Unavailable
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let kind = classify(&err);
        Self::new(kind, err.to_string())
    }
}

fn classify(err: &sqlx::Error) -> StoreErrorKind {
    match err {
        sqlx::Error::RowNotFound => StoreErrorKind::NotFound,
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(code) => classify_sqlstate(code),
            None => StoreErrorKind::Unexpected,
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreErrorKind::Unavailable,
        _ => StoreErrorKind::Unexpected,
    }
}

fn classify_sqlstate(code: &str) -> StoreErrorKind {
    match code {
        SQLSTATE_DEADLOCK_DETECTED => StoreErrorKind::Deadlock,
        SQLSTATE_SERIALIZATION_FAILURE => StoreErrorKind::SerializationFailure,
        SQLSTATE_LOCK_NOT_AVAILABLE => StoreErrorKind::LockTimeout,
        SQLSTATE_QUERY_CANCELED => StoreErrorKind::Cancelled,
        // Class 23: integrity constraint violation
        code if code.starts_with("23") => StoreErrorKind::ConstraintViolation,
        // Class 08: connection exception
        code if code.starts_with("08") => StoreErrorKind::Unavailable,
        _ => StoreErrorKind::Unexpected,
    }
}
