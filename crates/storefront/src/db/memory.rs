//! In-memory [`ShopStore`] for tests and local development.
//!
//! Mirrors the constraints the `PostgreSQL` schema enforces: one cart per
//! user, one open line per (user, item), one default address per
//! (user, type), and finalize only applying to carts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use boutique_core::{
    AddressId, AddressType, CouponId, Discount, ItemId, OrderId, OrderItemId, PaymentId,
    ReferenceCode, RefundId, UserId,
};

use super::{RepositoryError, ShopStore};
use crate::models::{
    Address, Coupon, Item, NewAddress, NewItem, NewPayment, NewRefund, Order, OrderItem, Payment,
    Refund,
};

#[derive(Debug, Clone)]
struct OrderRecord {
    id: OrderId,
    user_id: UserId,
    ordered: bool,
    ordered_date: DateTime<Utc>,
    shipping_address: Option<AddressId>,
    billing_address: Option<AddressId>,
    payment: Option<PaymentId>,
    coupon: Option<CouponId>,
    ref_code: Option<ReferenceCode>,
    refund_requested: bool,
}

#[derive(Debug, Clone)]
struct LineRecord {
    id: OrderItemId,
    user_id: UserId,
    item_id: ItemId,
    order_id: Option<OrderId>,
    quantity: i32,
    ordered: bool,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    items: BTreeMap<ItemId, Item>,
    coupons: BTreeMap<CouponId, Coupon>,
    addresses: BTreeMap<AddressId, Address>,
    payments: BTreeMap<PaymentId, Payment>,
    orders: BTreeMap<OrderId, OrderRecord>,
    lines: BTreeMap<OrderItemId, LineRecord>,
    refunds: Vec<Refund>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn line(&self, record: &LineRecord) -> Result<OrderItem, RepositoryError> {
        let item = self.items.get(&record.item_id).cloned().ok_or_else(|| {
            RepositoryError::DataCorruption(format!("line {} has no item", record.id))
        })?;
        Ok(OrderItem {
            id: record.id,
            user_id: record.user_id,
            item,
            quantity: record.quantity,
            ordered: record.ordered,
        })
    }

    fn order(&self, record: &OrderRecord) -> Result<Order, RepositoryError> {
        let items = self
            .lines
            .values()
            .filter(|line| line.order_id == Some(record.id))
            .map(|line| self.line(line))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order {
            id: record.id,
            user_id: record.user_id,
            ordered: record.ordered,
            ordered_date: record.ordered_date,
            items,
            shipping_address: record
                .shipping_address
                .and_then(|id| self.addresses.get(&id).cloned()),
            billing_address: record
                .billing_address
                .and_then(|id| self.addresses.get(&id).cloned()),
            coupon: record.coupon.and_then(|id| self.coupons.get(&id).cloned()),
            payment: record.payment.and_then(|id| self.payments.get(&id).cloned()),
            ref_code: record.ref_code.clone(),
            refund_requested: record.refund_requested,
        })
    }
}

/// A [`ShopStore`] that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog item.
    pub async fn add_item(&self, item: NewItem) -> Item {
        let mut tables = self.tables.write().await;
        let id = ItemId::new(tables.next_id());
        let item = Item {
            id,
            name: item.name,
            slug: item.slug,
            price: item.price,
            discount_price: item.discount_price,
            category: item.category,
            label: item.label,
            description: item.description,
            image: item.image,
        };
        tables.items.insert(id, item.clone());
        item
    }

    /// Add a coupon.
    pub async fn add_coupon(&self, code: &str, discount: Discount) -> Coupon {
        let mut tables = self.tables.write().await;
        let id = CouponId::new(tables.next_id());
        let coupon = Coupon {
            id,
            code: code.to_owned(),
            discount,
        };
        tables.coupons.insert(id, coupon.clone());
        coupon
    }

    /// Every order the user has, carts and finalized, oldest first.
    pub async fn orders_for(&self, user_id: UserId) -> Vec<Order> {
        let tables = self.tables.read().await;
        tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .filter_map(|o| tables.order(o).ok())
            .collect()
    }

    /// Every address the user has, oldest first.
    pub async fn addresses_for(&self, user_id: UserId) -> Vec<Address> {
        let tables = self.tables.read().await;
        tables
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Every line the user has, attached or not.
    pub async fn order_items_for(&self, user_id: UserId) -> Vec<OrderItem> {
        let tables = self.tables.read().await;
        tables
            .lines
            .values()
            .filter(|l| l.user_id == user_id)
            .filter_map(|l| tables.line(l).ok())
            .collect()
    }

    /// Refund requests recorded against an order.
    pub async fn refunds_for(&self, order_id: OrderId) -> Vec<Refund> {
        let tables = self.tables.read().await;
        tables
            .refunds
            .iter()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Number of recorded payments.
    pub async fn payment_count(&self) -> usize {
        self.tables.read().await.payments.len()
    }
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_items(&self, limit: i64, offset: i64) -> Result<Vec<Item>, RepositoryError> {
        let tables = self.tables.read().await;
        let skip = usize::try_from(offset).unwrap_or(0);
        let take = usize::try_from(limit).unwrap_or(0);
        Ok(tables.items.values().skip(skip).take(take).cloned().collect())
    }

    async fn count_items(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        i64::try_from(tables.items.len())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn find_item_by_slug(&self, slug: &str) -> Result<Option<Item>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|i| i.slug.as_str() == slug)
            .cloned())
    }

    async fn find_active_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .orders
            .values()
            .find(|o| o.user_id == user_id && !o.ordered)
            .map(|o| tables.order(o))
            .transpose()
    }

    async fn create_order(
        &self,
        user_id: UserId,
        ordered_date: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .orders
            .values()
            .any(|o| o.user_id == user_id && !o.ordered)
        {
            return Err(RepositoryError::Conflict(
                "active order already exists".to_owned(),
            ));
        }

        let record = OrderRecord {
            id: OrderId::new(tables.next_id()),
            user_id,
            ordered: false,
            ordered_date,
            shipping_address: None,
            billing_address: None,
            payment: None,
            coupon: None,
            ref_code: None,
            refund_requested: false,
        };
        tables.orders.insert(record.id, record.clone());
        tables.order(&record)
    }

    async fn get_or_create_order_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<OrderItem, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.items.contains_key(&item_id) {
            return Err(RepositoryError::NotFound);
        }

        let existing = tables
            .lines
            .values()
            .find(|l| l.user_id == user_id && l.item_id == item_id && !l.ordered)
            .cloned();
        let record = match existing {
            Some(record) => record,
            None => {
                let record = LineRecord {
                    id: OrderItemId::new(tables.next_id()),
                    user_id,
                    item_id,
                    order_id: None,
                    quantity: 1,
                    ordered: false,
                };
                tables.lines.insert(record.id, record.clone());
                record
            }
        };
        tables.line(&record)
    }

    async fn attach_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let line = tables
            .lines
            .get_mut(&order_item_id)
            .filter(|l| !l.ordered)
            .ok_or(RepositoryError::NotFound)?;
        line.order_id = Some(order_id);
        Ok(())
    }

    async fn detach_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(line) = tables.lines.get_mut(&order_item_id)
            && line.order_id == Some(order_id)
        {
            line.order_id = None;
        }
        Ok(())
    }

    async fn delete_order_item(&self, order_item_id: OrderItemId) -> Result<(), RepositoryError> {
        self.tables.write().await.lines.remove(&order_item_id);
        Ok(())
    }

    async fn set_order_item_quantity(
        &self,
        order_item_id: OrderItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        if quantity < 1 {
            return Err(RepositoryError::Conflict(format!(
                "quantity must be at least 1 (got {quantity})"
            )));
        }
        let mut tables = self.tables.write().await;
        let line = tables
            .lines
            .get_mut(&order_item_id)
            .ok_or(RepositoryError::NotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    async fn create_address(&self, address: &NewAddress) -> Result<Address, RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = Address {
            id: AddressId::new(tables.next_id()),
            user_id: address.user_id,
            fields: address.fields.clone(),
            address_type: address.address_type,
            default: false,
        };
        tables.addresses.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_default_address(
        &self,
        user_id: UserId,
        address_type: AddressType,
    ) -> Result<Option<Address>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .addresses
            .values()
            .find(|a| a.user_id == user_id && a.address_type == address_type && a.default)
            .cloned())
    }

    async fn set_default_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tables = self.tables.write().await;
        let address_type = tables
            .addresses
            .get(&address_id)
            .filter(|a| a.user_id == user_id)
            .map(|a| a.address_type)
            .ok_or(RepositoryError::NotFound)?;

        for address in tables.addresses.values_mut() {
            if address.user_id == user_id && address.address_type == address_type {
                address.default = address.id == address_id;
            }
        }

        tables
            .addresses
            .get(&address_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn set_order_address(
        &self,
        order_id: OrderId,
        address_type: AddressType,
        address_id: AddressId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        match address_type {
            AddressType::Shipping => order.shipping_address = Some(address_id),
            AddressType::Billing => order.billing_address = Some(address_id),
        }
        Ok(())
    }

    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.coupons.values().find(|c| c.code == code).cloned())
    }

    async fn set_order_coupon(
        &self,
        order_id: OrderId,
        coupon_id: CouponId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.coupon = Some(coupon_id);
        Ok(())
    }

    async fn finalize_order(
        &self,
        order_id: OrderId,
        payment: &NewPayment,
        ref_code: &ReferenceCode,
    ) -> Result<Payment, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables
            .orders
            .get(&order_id)
            .is_some_and(|o| !o.ordered)
        {
            return Err(RepositoryError::NotFound);
        }
        if tables
            .payments
            .values()
            .any(|p| p.charge_id == payment.charge_id)
        {
            return Err(RepositoryError::DuplicateCharge(payment.charge_id.clone()));
        }
        if tables
            .orders
            .values()
            .any(|o| o.ref_code.as_ref() == Some(ref_code))
        {
            return Err(RepositoryError::Conflict(
                "reference code already exists".to_owned(),
            ));
        }

        let stored = Payment {
            id: PaymentId::new(tables.next_id()),
            charge_id: payment.charge_id.clone(),
            user_id: payment.user_id,
            amount: payment.amount,
            created_at: Utc::now(),
        };
        tables.payments.insert(stored.id, stored.clone());

        for line in tables.lines.values_mut() {
            if line.order_id == Some(order_id) {
                line.ordered = true;
            }
        }
        if let Some(order) = tables.orders.get_mut(&order_id) {
            order.ordered = true;
            order.payment = Some(stored.id);
            order.ref_code = Some(ref_code.clone());
        }

        Ok(stored)
    }

    async fn find_order_by_ref_code(
        &self,
        ref_code: &ReferenceCode,
    ) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .orders
            .values()
            .find(|o| o.ref_code.as_ref() == Some(ref_code))
            .map(|o| tables.order(o))
            .transpose()
    }

    async fn create_refund(
        &self,
        order_id: OrderId,
        refund: &NewRefund,
    ) -> Result<Refund, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = RefundId::new(tables.next_id());
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.refund_requested = true;

        let stored = Refund {
            id,
            order_id,
            reason: refund.reason.clone(),
            email: refund.email.clone(),
            accepted: false,
            created_at: Utc::now(),
        };
        tables.refunds.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::AddressFields;

    fn fields(name: &str) -> AddressFields {
        AddressFields {
            name: name.to_owned(),
            street_address: "1 Main St".to_owned(),
            apartment_address: None,
            country: "BE".to_owned(),
            zip: "1000".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_second_active_order_conflicts() {
        let store = MemoryStore::new();
        let user = UserId::new(1);

        store.create_order(user, Utc::now()).await.unwrap();
        let err = store.create_order(user, Utc::now()).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_set_default_clears_previous_default() {
        let store = MemoryStore::new();
        let user = UserId::new(1);
        let first = store
            .create_address(&NewAddress {
                user_id: user,
                fields: fields("first"),
                address_type: AddressType::Shipping,
            })
            .await
            .unwrap();
        let second = store
            .create_address(&NewAddress {
                user_id: user,
                fields: fields("second"),
                address_type: AddressType::Shipping,
            })
            .await
            .unwrap();

        store.set_default_address(user, first.id).await.unwrap();
        store.set_default_address(user, second.id).await.unwrap();

        let defaults: Vec<_> = store
            .addresses_for(user)
            .await
            .into_iter()
            .filter(|a| a.default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, second.id);
    }

    #[tokio::test]
    async fn test_set_default_rejects_other_users_address() {
        let store = MemoryStore::new();
        let address = store
            .create_address(&NewAddress {
                user_id: UserId::new(1),
                fields: fields("ada"),
                address_type: AddressType::Billing,
            })
            .await
            .unwrap();

        let err = store
            .set_default_address(UserId::new(2), address.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_finalize_only_applies_once() {
        let store = MemoryStore::new();
        let user = UserId::new(1);
        let order = store.create_order(user, Utc::now()).await.unwrap();
        let payment = NewPayment {
            charge_id: "ch_1".to_owned(),
            user_id: user,
            amount: rust_decimal::Decimal::ONE,
        };
        let code = ReferenceCode::parse("abcdefghij0123456789").unwrap();

        store.finalize_order(order.id, &payment, &code).await.unwrap();
        let err = store
            .finalize_order(order.id, &payment, &code)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(store.payment_count().await, 1);
        assert!(store.find_active_order(user).await.unwrap().is_none());
    }
}
