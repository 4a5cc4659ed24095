//! Small enums for catalog items, addresses, payments and order state.
//!
//! Each enum round-trips through the lowercase string stored in the database
//! (`as_str` / `FromStr`).

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A stored enum value was not one of the known variants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Stored string representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Where an order is in its lifecycle.
///
/// ```text
/// Cart --(billing address set)--> AwaitingPayment --(charge succeeds)--> Finalized
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Active cart with no billing address yet.
    #[default]
    Cart,
    /// Billing address attached; the order can be charged.
    AwaitingPayment,
    /// Paid for; immutable apart from the refund flag.
    Finalized,
}

string_enum!(OrderStatus, "order status", {
    Cart => "cart",
    AwaitingPayment => "awaiting_payment",
    Finalized => "finalized",
});

/// Which role an address plays on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Shipping,
    Billing,
}

string_enum!(AddressType, "address type", {
    Shipping => "shipping",
    Billing => "billing",
});

/// Catalog category of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Shirt,
    SportWear,
    OutWear,
}

string_enum!(ItemCategory, "item category", {
    Shirt => "shirt",
    SportWear => "sport_wear",
    OutWear => "out_wear",
});

impl ItemCategory {
    /// Human readable name for listings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Shirt => "Shirt",
            Self::SportWear => "Sport wear",
            Self::OutWear => "Outwear",
        }
    }
}

/// Badge colour shown next to an item in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemLabel {
    Primary,
    Secondary,
    Danger,
}

string_enum!(ItemLabel, "item label", {
    Primary => "primary",
    Secondary => "secondary",
    Danger => "danger",
});

/// Payment method chosen on the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOption {
    Stripe,
    #[serde(rename = "paypal")]
    PayPal,
}

string_enum!(PaymentOption, "payment option", {
    Stripe => "stripe",
    PayPal => "paypal",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_strings() {
        for t in [AddressType::Shipping, AddressType::Billing] {
            assert_eq!(t.as_str().parse::<AddressType>(), Ok(t));
        }
        for c in [ItemCategory::Shirt, ItemCategory::SportWear, ItemCategory::OutWear] {
            assert_eq!(c.as_str().parse::<ItemCategory>(), Ok(c));
        }
        assert_eq!("paypal".parse::<PaymentOption>(), Ok(PaymentOption::PayPal));
    }

    #[test]
    fn test_parse_error_names_kind() {
        let err = "home".parse::<AddressType>().unwrap_err();
        assert_eq!(err.to_string(), "invalid address type: \"home\"");
    }
}
