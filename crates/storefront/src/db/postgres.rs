//! `PostgreSQL`-backed [`ShopStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use boutique_core::{
    AddressId, AddressType, CouponId, Discount, ItemId, OrderId, OrderItemId, ReferenceCode,
    UserId,
};

use super::{
    AddressRepository, CouponRepository, ItemRepository, OrderRepository, RefundRepository,
    RepositoryError, ShopStore,
};
use crate::models::{
    Address, Coupon, Item, NewAddress, NewItem, NewPayment, NewRefund, Order, OrderItem, Payment,
    Refund,
};

/// Production store: a thin adapter from [`ShopStore`] onto the repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert or update a catalog item by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_item(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        ItemRepository::new(&self.pool).upsert(item).await
    }

    /// Insert or update a coupon by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_coupon(
        &self,
        code: &str,
        discount: Discount,
    ) -> Result<Coupon, RepositoryError> {
        CouponRepository::new(&self.pool).upsert(code, discount).await
    }
}

#[async_trait]
impl ShopStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_items(&self, limit: i64, offset: i64) -> Result<Vec<Item>, RepositoryError> {
        ItemRepository::new(&self.pool).list(limit, offset).await
    }

    async fn count_items(&self) -> Result<i64, RepositoryError> {
        ItemRepository::new(&self.pool).count().await
    }

    async fn find_item_by_slug(&self, slug: &str) -> Result<Option<Item>, RepositoryError> {
        ItemRepository::new(&self.pool).get_by_slug(slug).await
    }

    async fn find_active_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_active(user_id).await
    }

    async fn create_order(
        &self,
        user_id: UserId,
        ordered_date: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool)
            .create(user_id, ordered_date)
            .await
    }

    async fn get_or_create_order_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<OrderItem, RepositoryError> {
        OrderRepository::new(&self.pool)
            .get_or_create_line(user_id, item_id)
            .await
    }

    async fn attach_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
    ) -> Result<(), RepositoryError> {
        OrderRepository::new(&self.pool)
            .attach_line(order_id, order_item_id)
            .await
    }

    async fn detach_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
    ) -> Result<(), RepositoryError> {
        OrderRepository::new(&self.pool)
            .detach_line(order_id, order_item_id)
            .await
    }

    async fn delete_order_item(&self, order_item_id: OrderItemId) -> Result<(), RepositoryError> {
        OrderRepository::new(&self.pool)
            .delete_line(order_item_id)
            .await
    }

    async fn set_order_item_quantity(
        &self,
        order_item_id: OrderItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        OrderRepository::new(&self.pool)
            .set_line_quantity(order_item_id, quantity)
            .await
    }

    async fn create_address(&self, address: &NewAddress) -> Result<Address, RepositoryError> {
        AddressRepository::new(&self.pool).create(address).await
    }

    async fn find_default_address(
        &self,
        user_id: UserId,
        address_type: AddressType,
    ) -> Result<Option<Address>, RepositoryError> {
        AddressRepository::new(&self.pool)
            .get_default(user_id, address_type)
            .await
    }

    async fn set_default_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Address, RepositoryError> {
        AddressRepository::new(&self.pool)
            .set_default(user_id, address_id)
            .await
    }

    async fn set_order_address(
        &self,
        order_id: OrderId,
        address_type: AddressType,
        address_id: AddressId,
    ) -> Result<(), RepositoryError> {
        OrderRepository::new(&self.pool)
            .set_address(order_id, address_type, address_id)
            .await
    }

    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        CouponRepository::new(&self.pool).get_by_code(code).await
    }

    async fn set_order_coupon(
        &self,
        order_id: OrderId,
        coupon_id: CouponId,
    ) -> Result<(), RepositoryError> {
        OrderRepository::new(&self.pool)
            .set_coupon(order_id, coupon_id)
            .await
    }

    async fn finalize_order(
        &self,
        order_id: OrderId,
        payment: &NewPayment,
        ref_code: &ReferenceCode,
    ) -> Result<Payment, RepositoryError> {
        OrderRepository::new(&self.pool)
            .finalize(order_id, payment, ref_code)
            .await
    }

    async fn find_order_by_ref_code(
        &self,
        ref_code: &ReferenceCode,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .get_by_ref_code(ref_code)
            .await
    }

    async fn create_refund(
        &self,
        order_id: OrderId,
        refund: &NewRefund,
    ) -> Result<Refund, RepositoryError> {
        RefundRepository::new(&self.pool).create(order_id, refund).await
    }
}
