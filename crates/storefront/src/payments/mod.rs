//! Payment processor seam.
//!
//! The [`PaymentGateway`] trait is the only thing the payment orchestrator
//! knows about the processor. [`StripeClient`] implements it over Stripe's
//! REST API; tests substitute a mock or scripted gateway.

mod stripe;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use boutique_core::CurrencyCode;

pub use stripe::StripeClient;

/// Message shown when the processor failed in a way we could not classify.
pub const UNKNOWN_FAILURE_MESSAGE: &str =
    "A serious error has occurred, we have been notified and will look into it";

/// A payment intent created with the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Processor-side intent identifier, posted back on confirmation.
    pub id: String,
    /// Secret the browser uses to confirm the card payment.
    pub client_secret: String,
}

/// Proof that the processor captured the money.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeConfirmation {
    /// Identifier stored on the payment record.
    pub charge_id: String,
}

/// Failure categories reported by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentErrorKind {
    /// The card was declined.
    Declined,
    /// Too many requests to the processor.
    RateLimited,
    /// The processor rejected the request parameters.
    InvalidRequest,
    /// The processor rejected our credentials.
    AuthenticationFailure,
    /// The processor could not be reached.
    ConnectionFailure,
    /// The processor reported an internal error.
    ProcessorError,
    /// Anything else.
    Unknown,
}

impl PaymentErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Declined => "declined",
            Self::RateLimited => "rate_limited",
            Self::InvalidRequest => "invalid_request",
            Self::AuthenticationFailure => "authentication_failure",
            Self::ConnectionFailure => "connection_failure",
            Self::ProcessorError => "processor_error",
            Self::Unknown => "unknown",
        }
    }

    /// Message shown when the processor did not supply one.
    const fn fallback_message(self) -> &'static str {
        match self {
            Self::Declined => "Your card was declined.",
            Self::RateLimited => "Too many payment attempts, please try again shortly.",
            Self::InvalidRequest => "The payment request was invalid.",
            Self::AuthenticationFailure => "Payment is temporarily unavailable.",
            Self::ConnectionFailure => "Could not reach the payment processor, please try again.",
            Self::ProcessorError => "Something went wrong. You were not charged. Please try again.",
            Self::Unknown => UNKNOWN_FAILURE_MESSAGE,
        }
    }
}

impl fmt::Display for PaymentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed processor call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payment {kind}: {message}")]
pub struct PaymentError {
    pub kind: PaymentErrorKind,
    /// Processor-supplied explanation, possibly empty.
    pub message: String,
}

impl PaymentError {
    pub fn new(kind: PaymentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text to show the customer.
    ///
    /// Classified failures pass the processor's explanation through;
    /// unclassified ones get a generic apology.
    #[must_use]
    pub fn user_message(&self) -> &str {
        if self.kind == PaymentErrorKind::Unknown || self.message.trim().is_empty() {
            self.kind.fallback_message()
        } else {
            &self.message
        }
    }

    /// Whether operators should be alerted.
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(
            self.kind,
            PaymentErrorKind::Unknown
                | PaymentErrorKind::AuthenticationFailure
                | PaymentErrorKind::ProcessorError
        )
    }
}

/// Operations the storefront needs from a payment processor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent to collect `amount_minor` (e.g. cents) in `currency`.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: CurrencyCode,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Check that the intent was paid in full and return the charge to
    /// record.
    async fn confirm_payment(
        &self,
        intent_id: &str,
        amount_minor: i64,
        currency: CurrencyCode,
    ) -> Result<ChargeConfirmation, PaymentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declined_passes_processor_message_through() {
        let err = PaymentError::new(PaymentErrorKind::Declined, "Your card has insufficient funds.");
        assert_eq!(err.user_message(), "Your card has insufficient funds.");
        assert!(!err.needs_attention());
    }

    #[test]
    fn test_unknown_hides_processor_message() {
        let err = PaymentError::new(PaymentErrorKind::Unknown, "unexpected EOF");
        assert_eq!(err.user_message(), UNKNOWN_FAILURE_MESSAGE);
        assert!(err.needs_attention());
    }

    #[test]
    fn test_empty_message_uses_fallback() {
        let err = PaymentError::new(PaymentErrorKind::RateLimited, "");
        assert_eq!(
            err.user_message(),
            "Too many payment attempts, please try again shortly."
        );
    }
}
