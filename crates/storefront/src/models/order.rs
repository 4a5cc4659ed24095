//! Orders and order lines.
//!
//! An [`Order`] with `ordered == false` is the user's cart. There is at most
//! one such order per user; the database enforces this with a partial unique
//! index and [`crate::db::MemoryStore`] checks it on insert.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use boutique_core::{
    CurrencyCode, OrderId, OrderItemId, OrderStatus, Price, ReferenceCode, UserId,
};

use super::{Address, Coupon, Item, Payment};

/// One item in a cart, with its quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub user_id: UserId,
    pub item: Item,
    /// Always at least 1 while attached to an order.
    pub quantity: i32,
    /// Set when the owning order is paid for.
    pub ordered: bool,
}

impl OrderItem {
    /// Quantity times the list price.
    #[must_use]
    pub fn total_item_price(&self) -> Decimal {
        self.item.price * Decimal::from(self.quantity)
    }

    /// Quantity times the effective unit price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.item.unit_price() * Decimal::from(self.quantity)
    }

    /// How much the sale price saves on this line.
    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.total_item_price() - self.line_total()
    }
}

/// A cart or a finalized order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub ordered: bool,
    /// When the cart was started.
    pub ordered_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub coupon: Option<Coupon>,
    pub payment: Option<Payment>,
    /// Assigned when the order is finalized.
    pub ref_code: Option<ReferenceCode>,
    pub refund_requested: bool,
}

impl Order {
    /// Lifecycle state derived from the order's fields.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        if self.ordered {
            OrderStatus::Finalized
        } else if self.billing_address.is_some() {
            OrderStatus::AwaitingPayment
        } else {
            OrderStatus::Cart
        }
    }

    /// The line for the item with this slug, if the order contains it.
    #[must_use]
    pub fn line_for(&self, slug: &str) -> Option<&OrderItem> {
        self.items.iter().find(|line| line.item.slug.as_str() == slug)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|line| i64::from(line.quantity)).sum()
    }

    /// Sum of line totals before any coupon.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Amount taken off by the attached coupon.
    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.coupon
            .as_ref()
            .map_or(Decimal::ZERO, |coupon| coupon.discount.amount_off(self.subtotal()))
    }

    /// Amount the customer pays.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() - self.discount()
    }

    /// [`Self::total`] as a [`Price`] in `currency`.
    #[must_use]
    pub fn amount_due(&self, currency: CurrencyCode) -> Price {
        Price::new(self.total(), currency)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal::Decimal;

    use boutique_core::{ItemCategory, ItemId, Slug};

    use crate::models::Item;

    /// Catalog item with the given slug and price in cents.
    #[allow(clippy::unwrap_used)]
    pub fn item(id: i64, slug: &str, cents: i64) -> Item {
        Item {
            id: ItemId::new(id),
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
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use boutique_core::{CouponId, Discount};

    use super::fixtures::item;
    use super::*;

    fn line(id: i64, item: Item, quantity: i32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(id),
            user_id: UserId::new(1),
            item,
            quantity,
            ordered: false,
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            ordered: false,
            ordered_date: Utc::now(),
            items,
            shipping_address: None,
            billing_address: None,
            coupon: None,
            payment: None,
            ref_code: None,
            refund_requested: false,
        }
    }

    #[test]
    fn test_total_is_sum_of_price_times_quantity() {
        let order = order(vec![
            line(1, item(1, "widget", 1000), 3),
            line(2, item(2, "gadget", 500), 1),
        ]);

        assert_eq!(order.total(), Decimal::new(3500, 2));
        assert_eq!(
            order.amount_due(CurrencyCode::EUR).to_minor_units(),
            Ok(3500)
        );
        assert_eq!(order.item_count(), 4);
    }

    #[test]
    fn test_sale_price_used_for_line_total() {
        let mut shirt = item(1, "shirt", 2000);
        shirt.discount_price = Some(Decimal::new(1500, 2));
        let line = line(1, shirt, 2);

        assert_eq!(line.line_total(), Decimal::new(3000, 2));
        assert_eq!(line.savings(), Decimal::new(1000, 2));
    }

    #[test]
    fn test_coupon_reduces_total() {
        let mut order = order(vec![line(1, item(1, "widget", 1000), 3)]);
        order.coupon = Some(Coupon {
            id: CouponId::new(1),
            code: "TENOFF".to_owned(),
            discount: Discount::Percentage(Decimal::new(10, 0)),
        });

        assert_eq!(order.discount(), Decimal::new(300, 2));
        assert_eq!(order.total(), Decimal::new(2700, 2));
    }

    #[test]
    fn test_status_follows_billing_and_ordered_flags() {
        let mut order = order(Vec::new());
        assert_eq!(order.status(), OrderStatus::Cart);

        order.ordered = true;
        assert_eq!(order.status(), OrderStatus::Finalized);
    }

    #[test]
    fn test_line_for_matches_slug() {
        let order = order(vec![line(1, item(1, "widget", 1000), 1)]);
        assert!(order.line_for("widget").is_some());
        assert!(order.line_for("gadget").is_none());
    }
}
