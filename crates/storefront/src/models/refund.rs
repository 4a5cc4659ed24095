//! Refund requests.

use chrono::{DateTime, Utc};

use boutique_core::{Email, OrderId, RefundId};

/// A customer's request for a refund on a finalized order.
///
/// Refunds are processed by hand; `accepted` is flipped by staff once the
/// money has been returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    pub id: RefundId,
    pub order_id: OrderId,
    pub reason: String,
    pub email: Email,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a refund request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefund {
    pub reason: String,
    pub email: Email,
}
