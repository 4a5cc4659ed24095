//! Coupon domain type.

use boutique_core::{CouponId, Discount};

/// A discount code customers can apply at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub id: CouponId,
    /// Unique code as typed by customers.
    pub code: String,
    pub discount: Discount,
}
