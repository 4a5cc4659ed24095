//! Cart and order queries.
//!
//! An order is stored as one `shop_order` row plus the `order_item` rows that
//! point at it. Reads return a fully hydrated [`Order`] with its lines,
//! addresses, coupon and payment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use boutique_core::{
    AddressId, AddressType, CouponId, ItemId, OrderId, OrderItemId, PaymentId, ReferenceCode,
    UserId,
};

use super::addresses::fetch_by_id as fetch_address;
use super::items::{ITEM_COLUMNS, ItemRow};
use super::{CouponRepository, RepositoryError};
use crate::models::{Item, NewPayment, Order, OrderItem, Payment};

const ORDER_COLUMNS: &str = "id, user_id, ref_code, ordered, ordered_date, shipping_address_id, \
     billing_address_id, payment_id, coupon_id, refund_requested";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `shop_order` queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    ref_code: Option<String>,
    ordered: bool,
    ordered_date: DateTime<Utc>,
    shipping_address_id: Option<i64>,
    billing_address_id: Option<i64>,
    payment_id: Option<i64>,
    coupon_id: Option<i64>,
    refund_requested: bool,
}

/// Internal row type for an order line joined with its item.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    line_id: i64,
    line_user_id: i64,
    quantity: i32,
    line_ordered: bool,
    #[sqlx(flatten)]
    item: ItemRow,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.line_id),
            user_id: UserId::new(row.line_user_id),
            item: Item::try_from(row.item)?,
            quantity: row.quantity,
            ordered: row.line_ordered,
        })
    }
}

/// Internal row type for payment queries.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    charge_id: String,
    user_id: i64,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: PaymentId::new(row.id),
            charge_id: row.charge_id,
            user_id: UserId::new(row.user_id),
            amount: row.amount,
            created_at: row.created_at,
        }
    }
}

fn line_query(filter: &str) -> String {
    format!(
        "SELECT oi.id AS line_id, oi.user_id AS line_user_id, oi.quantity, \
         oi.ordered AS line_ordered, {ITEM_COLUMNS} \
         FROM storefront.order_item oi \
         JOIN storefront.item i ON i.id = oi.item_id \
         WHERE {filter} ORDER BY oi.id"
    )
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart and order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Get the user's cart (the order with `ordered = false`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn get_active(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.shop_order WHERE user_id = $1 AND NOT ordered"
        ))
        .bind(user_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Get an order by its reference code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn get_by_ref_code(
        &self,
        ref_code: &ReferenceCode,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.shop_order WHERE ref_code = $1"
        ))
        .bind(ref_code.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Start a new empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a cart.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        ordered_date: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO storefront.shop_order (user_id, ordered_date) VALUES ($1, $2) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id.as_i64())
        .bind(ordered_date)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "active order"))?;

        self.hydrate(row).await
    }

    /// Point the order's shipping or billing address at an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_address(
        &self,
        order_id: OrderId,
        address_type: AddressType,
        address_id: AddressId,
    ) -> Result<(), RepositoryError> {
        let sql = match address_type {
            AddressType::Shipping => {
                "UPDATE storefront.shop_order SET shipping_address_id = $2 WHERE id = $1"
            }
            AddressType::Billing => {
                "UPDATE storefront.shop_order SET billing_address_id = $2 WHERE id = $1"
            }
        };
        let result = sqlx::query(sql)
            .bind(order_id.as_i64())
            .bind(address_id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Attach a coupon to an order, replacing any previous coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_coupon(
        &self,
        order_id: OrderId,
        coupon_id: CouponId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE storefront.shop_order SET coupon_id = $2 WHERE id = $1")
            .bind(order_id.as_i64())
            .bind(coupon_id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a payment and finalize the order in one transaction.
    ///
    /// Marks the order and its lines as ordered and stores the reference
    /// code. Only a cart can be finalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is missing or already
    /// finalized.
    /// Returns `RepositoryError::DuplicateCharge` if the charge is already
    /// recorded.
    /// Returns `RepositoryError::Conflict` if the reference code is taken.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn finalize(
        &self,
        order_id: OrderId,
        payment: &NewPayment,
        ref_code: &ReferenceCode,
    ) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let payment_row = sqlx::query_as::<_, PaymentRow>(
            r"
            INSERT INTO storefront.payment (charge_id, user_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, charge_id, user_id, amount, created_at
            ",
        )
        .bind(&payment.charge_id)
        .bind(payment.user_id.as_i64())
        .bind(payment.amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match RepositoryError::from_insert(e, "charge") {
            RepositoryError::Conflict(_) => {
                RepositoryError::DuplicateCharge(payment.charge_id.clone())
            }
            other => other,
        })?;

        let updated = sqlx::query(
            r"
            UPDATE storefront.shop_order
            SET ordered = TRUE, payment_id = $2, ref_code = $3
            WHERE id = $1 AND NOT ordered
            ",
        )
        .bind(order_id.as_i64())
        .bind(payment_row.id)
        .bind(ref_code.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "reference code"))?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("UPDATE storefront.order_item SET ordered = TRUE WHERE order_id = $1")
            .bind(order_id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(payment_row.into())
    }

    // =========================================================================
    // Order lines
    // =========================================================================

    /// Get the user's open line for an item, creating it with quantity 1 if
    /// there is none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn get_or_create_line(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<OrderItem, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let line_id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO storefront.order_item (user_id, item_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, item_id) WHERE NOT ordered
            DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            ",
        )
        .bind(user_id.as_i64())
        .bind(item_id.as_i64())
        .fetch_one(self.pool)
        .await?;

        fetch_line(self.pool, OrderItemId::new(line_id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Attach an open line to an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or is
    /// already ordered.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn attach_line(
        &self,
        order_id: OrderId,
        line_id: OrderItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.order_item SET order_id = $1 WHERE id = $2 AND NOT ordered",
        )
        .bind(order_id.as_i64())
        .bind(line_id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Detach a line from an order without deleting it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn detach_line(
        &self,
        order_id: OrderId,
        line_id: OrderItemId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE storefront.order_item SET order_id = NULL WHERE id = $2 AND order_id = $1",
        )
        .bind(order_id.as_i64())
        .bind(line_id.as_i64())
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Delete a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_line(&self, line_id: OrderItemId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.order_item WHERE id = $1")
            .bind(line_id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Overwrite a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist.
    /// Returns `RepositoryError::Database` if the query fails (including a
    /// quantity below 1).
    pub async fn set_line_quantity(
        &self,
        line_id: OrderItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE storefront.order_item SET quantity = $2 WHERE id = $1")
            .bind(line_id.as_i64())
            .bind(quantity)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    async fn hydrate(&self, row: OrderRow) -> Result<Order, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderItemRow>(&line_query("oi.order_id = $1"))
            .bind(row.id)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let shipping_address = match row.shipping_address_id {
            Some(id) => fetch_address(self.pool, AddressId::new(id)).await?,
            None => None,
        };
        let billing_address = match row.billing_address_id {
            Some(id) => fetch_address(self.pool, AddressId::new(id)).await?,
            None => None,
        };
        let coupon = match row.coupon_id {
            Some(id) => {
                CouponRepository::new(self.pool)
                    .get_by_id(CouponId::new(id))
                    .await?
            }
            None => None,
        };
        let payment = match row.payment_id {
            Some(id) => sqlx::query_as::<_, PaymentRow>(
                "SELECT id, charge_id, user_id, amount, created_at \
                 FROM storefront.payment WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Payment::from),
            None => None,
        };
        let ref_code = row
            .ref_code
            .as_deref()
            .map(ReferenceCode::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;

        Ok(Order {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            ordered: row.ordered,
            ordered_date: row.ordered_date,
            items: lines,
            shipping_address,
            billing_address,
            coupon,
            payment,
            ref_code,
            refund_requested: row.refund_requested,
        })
    }
}

async fn fetch_line<'e, E>(
    executor: E,
    line_id: OrderItemId,
) -> Result<Option<OrderItem>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, OrderItemRow>(&line_query("oi.id = $1"))
        .bind(line_id.as_i64())
        .fetch_optional(executor)
        .await?;

    row.map(OrderItem::try_from).transpose()
}
