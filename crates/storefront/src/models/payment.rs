//! Payment records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use boutique_core::{PaymentId, UserId};

/// A successful charge against the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: PaymentId,
    /// Processor-side identifier of the charge.
    pub charge_id: String,
    pub user_id: UserId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub charge_id: String,
    pub user_id: UserId,
    pub amount: Decimal,
}
