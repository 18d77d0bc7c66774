//! Token amounts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer token balance.
///
/// Both the participation token and the reward token are whole-unit
/// ledgers, so an amount is just a `u128` with checked arithmetic.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    /// Zero tokens
    pub const ZERO: Self = Self(0);

    /// Wrap a raw integer amount
    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// The underlying integer
    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Whether this amount is zero
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Saturating addition
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl From<u64> for Amount {
    fn from(raw: u64) -> Self {
        Self(u128::from(raw))
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::from_raw(100);
        let b = Amount::from_raw(30);

        assert_eq!(a.checked_sub(b), Some(Amount::from_raw(70)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(Amount::from_raw(u128::MAX).checked_add(b), None);
    }

    #[test]
    fn test_saturating() {
        let a = Amount::from_raw(5);
        assert_eq!(a.saturating_sub(Amount::from_raw(10)), Amount::ZERO);
        assert_eq!(
            Amount::from_raw(u128::MAX).saturating_add(a).raw(),
            u128::MAX
        );
    }
}
