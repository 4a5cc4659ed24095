//! Domain error taxonomy for storefront operations.

use thiserror::Error;

use boutique_core::AddressType;

use crate::db::RepositoryError;
use crate::payments::PaymentError;

/// Broad category of a [`ShopError`], deciding how the request boundary
/// reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Something the user referred to does not exist. Message and redirect.
    NotFound,
    /// The submitted form was incomplete or invalid. Message and re-prompt.
    Validation,
    /// The payment processor refused or failed. Message, order untouched.
    Payment,
    /// Storage failure. Reported as a server error.
    Internal,
}

/// Errors returned by the storefront services.
#[derive(Debug, Error)]
pub enum ShopError {
    /// No catalog item has this slug.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// The user has no cart.
    #[error("no active order")]
    NoActiveOrder,

    /// "Use default" was requested but no default address exists.
    #[error("no default {0} address")]
    DefaultAddressMissing(AddressType),

    /// Required address fields were left blank.
    #[error("{address_type} address is missing: {}", fields.join(", "))]
    MissingAddressFields {
        address_type: AddressType,
        fields: Vec<&'static str>,
    },

    /// No coupon has this code.
    #[error("coupon not found")]
    CouponNotFound,

    /// No finalized order has this reference code.
    #[error("order not found")]
    OrderNotFound,

    /// Payment was requested before a billing address was set.
    #[error("order has no billing address")]
    MissingBillingAddress,

    /// Invalid form input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The payment processor reported a failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ShopError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ItemNotFound(_)
            | Self::NoActiveOrder
            | Self::DefaultAddressMissing(_)
            | Self::CouponNotFound
            | Self::OrderNotFound => ErrorKind::NotFound,
            Self::MissingAddressFields { .. } | Self::MissingBillingAddress | Self::Validation(_) => {
                ErrorKind::Validation
            }
            Self::Payment(_) => ErrorKind::Payment,
            Self::Repository(_) => ErrorKind::Internal,
        }
    }

    /// Text to flash to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ItemNotFound(_) => "This item does not exist".to_owned(),
            Self::NoActiveOrder => "You do not have an active order".to_owned(),
            Self::DefaultAddressMissing(address_type) => {
                format!("No default {address_type} address available")
            }
            Self::MissingAddressFields { address_type, .. } => {
                format!("Please fill in the required {address_type} address fields")
            }
            Self::CouponNotFound => "This coupon does not exist".to_owned(),
            Self::OrderNotFound => "This order does not exist".to_owned(),
            Self::MissingBillingAddress => "You have not provided a billing address".to_owned(),
            Self::Validation(message) => message.clone(),
            Self::Payment(err) => err.user_message().to_owned(),
            Self::Repository(_) => "Something went wrong, please try again".to_owned(),
        }
    }
}
