//! Amount type
//!
//! Domain primitive for positive monetary amounts moved by a transfer or
//! requested by a deposit/withdrawal. Values are validated at construction
//! so an invalid amount never reaches the store.

use rust_decimal::Decimal;
use std::fmt;

/// Largest value a `NUMERIC(10,2)` column can hold
fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, MONEY_SCALE)
}

/// Maximum decimal places (matches the store's fixed scale)
pub const MONEY_SCALE: u32 = 2;

/// Amount represents a validated, strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - At most 2 decimal places
/// - At most 99,999,999.99
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use wallet_ledger::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(4000, 2)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(40, 0));
/// assert_eq!(amount.debit(), Decimal::new(-4000, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Amount has too many decimal places (max {MONEY_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value (99999999.99)")]
    Overflow,
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// Trailing zeros beyond two places (`"1.500"`) are accepted; they are
    /// normalized away before the scale check.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        let normalized = value.normalize();
        if normalized.scale() > MONEY_SCALE {
            return Err(AmountError::TooManyDecimals(normalized.scale()));
        }

        if value > max_amount() {
            return Err(AmountError::Overflow);
        }

        let mut fixed = normalized;
        fixed.rescale(MONEY_SCALE);
        Ok(Self(fixed))
    }

    /// Get the underlying Decimal value (scale 2).
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The signed delta that credits an account by this amount.
    pub fn credit(&self) -> Decimal {
        self.0
    }

    /// The signed delta that debits an account by this amount.
    pub fn debit(&self) -> Decimal {
        -self.0
    }

    /// Check whether `balance` covers this amount.
    pub fn is_covered_by(&self, balance: Decimal) -> bool {
        balance >= self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
