//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Two value
/// objects with the same attributes are the same value; to "modify" one,
/// build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct DateRange { start: NaiveDate, end: NaiveDate }
///
/// impl ValueObject for DateRange {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Monetary amount in minor currency units (e.g. fen / cents).
///
/// Integer arithmetic keeps `price * quantity` exact; every operation that
/// can overflow is checked and reported as a validation failure.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl ValueObject for Amount {}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self * quantity`, failing on overflow.
    pub fn times(self, quantity: i64) -> DomainResult<Amount> {
        self.0
            .checked_mul(quantity)
            .map(Amount)
            .ok_or_else(|| DomainError::validation(format!("amount overflow: {} x {}", self.0, quantity)))
    }

    pub fn checked_add(self, other: Amount) -> DomainResult<Amount> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_multiplies_exactly() {
        assert_eq!(Amount::from_minor(10).times(3).unwrap(), Amount::from_minor(30));
    }

    #[test]
    fn times_reports_overflow_as_validation() {
        let err = Amount::from_minor(i64::MAX).times(2).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn display_renders_major_and_minor_units() {
        assert_eq!(Amount::from_minor(1234).to_string(), "12.34");
        assert_eq!(Amount::from_minor(-5).to_string(), "-0.05");
    }
}
