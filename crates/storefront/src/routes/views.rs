//! Display data for templates.
//!
//! Templates only see pre-formatted strings; all money formatting happens
//! here.

use rust_decimal::Decimal;

use boutique_core::{CurrencyCode, Price};

use crate::models::{Address, Item, Order, OrderItem};

fn money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

/// Catalog item card and detail page.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub name: String,
    pub slug: String,
    pub category: &'static str,
    /// Badge style, when the item carries a label.
    pub label: Option<&'static str>,
    /// List price.
    pub price: String,
    /// Sale price, when on sale.
    pub discount_price: Option<String>,
    pub description: String,
    pub image: Option<String>,
}

impl ItemView {
    #[must_use]
    pub fn new(item: &Item, currency: CurrencyCode) -> Self {
        Self {
            name: item.name.clone(),
            slug: item.slug.as_str().to_owned(),
            category: item.category.label(),
            label: item.label.map(|label| label.as_str()),
            price: money(item.price, currency),
            discount_price: item.discount_price.map(|p| money(p, currency)),
            description: item.description.clone(),
            image: item.image.clone(),
        }
    }
}

/// One cart line.
#[derive(Debug, Clone)]
pub struct LineView {
    pub name: String,
    pub slug: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    /// What the sale price saved, when it saved anything.
    pub savings: Option<String>,
}

impl LineView {
    fn new(line: &OrderItem, currency: CurrencyCode) -> Self {
        let savings = line.savings();
        Self {
            name: line.item.name.clone(),
            slug: line.item.slug.as_str().to_owned(),
            quantity: line.quantity,
            unit_price: money(line.item.unit_price(), currency),
            line_total: money(line.line_total(), currency),
            savings: (savings > Decimal::ZERO).then(|| money(savings, currency)),
        }
    }
}

/// Cart or finalized order summary.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub lines: Vec<LineView>,
    pub item_count: i64,
    pub subtotal: String,
    pub coupon_code: Option<String>,
    pub discount: String,
    pub total: String,
    pub ref_code: Option<String>,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        Self {
            lines: order
                .items
                .iter()
                .map(|line| LineView::new(line, currency))
                .collect(),
            item_count: order.item_count(),
            subtotal: money(order.subtotal(), currency),
            coupon_code: order.coupon.as_ref().map(|c| c.code.clone()),
            discount: money(order.discount(), currency),
            total: money(order.total(), currency),
            ref_code: order.ref_code.as_ref().map(|code| code.as_str().to_owned()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Stored address shown as a "use default" option.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub name: String,
    /// Street, apartment, zip and country on one line.
    pub summary: String,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        let fields = &address.fields;
        let mut parts = vec![fields.street_address.clone()];
        parts.extend(fields.apartment_address.clone());
        parts.push(format!("{} {}", fields.zip, fields.country));
        Self {
            name: fields.name.clone(),
            summary: parts.join(", "),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use boutique_core::{OrderId, OrderItemId, UserId};

    use super::*;
    use crate::models::order::fixtures::item;

    #[test]
    fn test_order_view_formats_money_and_savings() {
        let mut shirt = item(1, "shirt", 2000);
        shirt.discount_price = Some(Decimal::new(1500, 2));
        let order = Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            ordered: false,
            ordered_date: Utc::now(),
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                user_id: UserId::new(1),
                item: shirt,
                quantity: 2,
                ordered: false,
            }],
            shipping_address: None,
            billing_address: None,
            coupon: None,
            payment: None,
            ref_code: None,
            refund_requested: false,
        };

        let view = OrderView::new(&order, CurrencyCode::EUR);

        assert_eq!(view.total, "€30.00");
        assert_eq!(view.lines[0].unit_price, "€15.00");
        assert_eq!(view.lines[0].savings.as_deref(), Some("€10.00"));
        assert_eq!(view.discount, "€0.00");
    }

    #[test]
    fn test_item_view_without_sale() {
        let view = ItemView::new(&item(1, "cap", 999), CurrencyCode::EUR);
        assert_eq!(view.price, "€9.99");
        assert!(view.discount_price.is_none());
        assert!(view.label.is_none());
    }
}
