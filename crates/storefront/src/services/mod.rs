//! Storefront business logic.
//!
//! Each service borrows the [`ShopStore`] (and, for payment, the
//! [`PaymentGateway`]) for the duration of one request and takes the caller's
//! [`RequestContext`] explicitly.
//!
//! # Services
//!
//! - `catalog` - Paginated item listing and item detail
//! - `cart` - Add, remove and decrement cart lines
//! - `checkout` - Resolve shipping and billing addresses for the cart
//! - `coupons` - Attach a discount code to the cart
//! - `payment` - Create payment intents and finalize paid orders
//! - `refunds` - Record refund requests against finalized orders
//!
//! [`ShopStore`]: crate::db::ShopStore
//! [`PaymentGateway`]: crate::payments::PaymentGateway

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupons;
mod error;
pub mod payment;
pub mod refunds;

use boutique_core::UserId;

pub use cart::{CartOutcome, CartService};
pub use catalog::{CatalogPage, CatalogService, PAGE_SIZE};
pub use checkout::{CheckoutForm, CheckoutService};
pub use coupons::CouponService;
pub use error::{ErrorKind, ShopError};
pub use payment::{
    CHARGE_ALREADY_USED_MESSAGE, PaymentOrchestrator, PaymentPage, generate_ref_code,
};
pub use refunds::{RefundForm, RefundService};

/// Who is making the request.
///
/// Built by the `RequireUser` extractor from the session and passed to every
/// service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user: UserId,
}

impl RequestContext {
    #[must_use]
    pub const fn new(user: UserId) -> Self {
        Self { user }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rust_decimal::Decimal;

    use boutique_core::{ItemCategory, Slug};

    use crate::db::MemoryStore;
    use crate::models::{Item, NewItem};

    /// Catalog item input with the given slug and price in cents.
    #[allow(clippy::unwrap_used)]
    pub fn new_item(slug: &str, cents: i64) -> NewItem {
        NewItem {
            name: slug.to_uppercase(),
            slug: Slug::parse(slug).unwrap(),
            price: Decimal::new(cents, 2),
            discount_price: None,
            category: ItemCategory::Shirt,
            label: None,
            description: String::new(),
            image: None,
        }
    }

    /// A store holding `widget` (10.00) and `gadget` (5.00).
    pub async fn store_with_items() -> (MemoryStore, Item, Item) {
        let store = MemoryStore::new();
        let widget = store.add_item(new_item("widget", 1000)).await;
        let gadget = store.add_item(new_item("gadget", 500)).await;
        (store, widget, gadget)
    }
}
