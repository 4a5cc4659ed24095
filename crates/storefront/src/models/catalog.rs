//! Catalog item domain type.

use rust_decimal::Decimal;

use boutique_core::{ItemCategory, ItemId, ItemLabel, Slug};

/// A purchasable catalog item.
///
/// Items are read-only from the storefront; they are created by the seed
/// command or by back-office tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub slug: Slug,
    /// List price in the shop currency.
    pub price: Decimal,
    /// Reduced price, when the item is on sale.
    pub discount_price: Option<Decimal>,
    pub category: ItemCategory,
    pub label: Option<ItemLabel>,
    pub description: String,
    /// Path or URL of the product image.
    pub image: Option<String>,
}

impl Item {
    /// Price charged per unit: the sale price if there is one.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }

    /// Whether the item is currently on sale.
    #[must_use]
    pub const fn on_sale(&self) -> bool {
        self.discount_price.is_some()
    }
}

/// Input for inserting or updating a catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub slug: Slug,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category: ItemCategory,
    pub label: Option<ItemLabel>,
    pub description: String,
    pub image: Option<String>,
}
