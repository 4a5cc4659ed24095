//! Coupon discounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Discount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    #[error("discount cannot be negative")]
    Negative,
    #[error("percentage discount must be at most 100")]
    PercentageOver100,
    #[error("unknown discount kind: {0}")]
    UnknownKind(String),
}

/// What a coupon takes off an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// A fixed amount in the order currency.
    Fixed(Decimal),
    /// A percentage of the order subtotal, `0..=100`.
    Percentage(Decimal),
}

impl Discount {
    /// Build a discount from its stored `(kind, value)` pair.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] for unknown kinds, negative values, or
    /// percentages above 100.
    pub fn from_parts(kind: &str, value: Decimal) -> Result<Self, DiscountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DiscountError::Negative);
        }
        match kind {
            "fixed" => Ok(Self::Fixed(value)),
            "percentage" if value > Decimal::ONE_HUNDRED => Err(DiscountError::PercentageOver100),
            "percentage" => Ok(Self::Percentage(value)),
            other => Err(DiscountError::UnknownKind(other.to_owned())),
        }
    }

    /// Stored kind name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::Percentage(_) => "percentage",
        }
    }

    /// Stored value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        match self {
            Self::Fixed(v) | Self::Percentage(v) => *v,
        }
    }

    /// Amount taken off `subtotal`, never more than `subtotal` itself.
    #[must_use]
    pub fn amount_off(&self, subtotal: Decimal) -> Decimal {
        let off = match self {
            Self::Fixed(amount) => *amount,
            Self::Percentage(pct) => (subtotal * *pct / Decimal::ONE_HUNDRED).round_dp(2),
        };
        off.min(subtotal).max(Decimal::ZERO)
    }
}
