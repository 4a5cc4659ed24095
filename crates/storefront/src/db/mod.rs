//! Persistence for the storefront.
//!
//! # Database: `boutique`, schema `storefront`
//!
//! ## Tables
//!
//! - `item` - Catalog (read-only from the storefront)
//! - `order_item` - One row per (user, item) line; `order_id` set while in a cart
//! - `shop_order` - Carts (`ordered = false`) and finalized orders
//! - `address` - Shipping/billing addresses, at most one default per type
//! - `coupon` - Discount codes
//! - `payment` - Successful charges
//! - `refund` - Refund requests against finalized orders
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p boutique-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Services talk to the [`ShopStore`] trait. [`PgStore`] is the production
//! implementation built on the per-table repositories in this module;
//! [`MemoryStore`] keeps everything in process for tests and local runs.

pub mod addresses;
pub mod coupons;
pub mod items;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod refunds;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use boutique_core::{
    AddressId, AddressType, CouponId, ItemId, OrderId, OrderItemId, ReferenceCode, UserId,
};

use crate::models::{
    Address, Coupon, Item, NewAddress, NewPayment, NewRefund, Order, OrderItem, Payment, Refund,
};

pub use addresses::AddressRepository;
pub use coupons::CouponRepository;
pub use items::ItemRepository;
pub use memory::MemoryStore;
pub use orders::OrderRepository;
pub use postgres::PgStore;
pub use refunds::RefundRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a second active order for a user).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The processor charge already paid for another order.
    #[error("charge {0} is already recorded")]
    DuplicateCharge(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into `Conflict`.
    pub(crate) fn from_insert(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Storage operations needed by the storefront services.
///
/// Each method is a single logical write or read. Methods that touch more
/// than one row (`set_default_address`, `finalize_order`, `create_refund`)
/// are atomic.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// A page of catalog items ordered by ID.
    async fn list_items(&self, limit: i64, offset: i64) -> Result<Vec<Item>, RepositoryError>;

    /// Number of catalog items.
    async fn count_items(&self) -> Result<i64, RepositoryError>;

    /// Look up an item by slug.
    async fn find_item_by_slug(&self, slug: &str) -> Result<Option<Item>, RepositoryError>;

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// The user's order with `ordered = false`, with all attached lines.
    async fn find_active_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError>;

    /// Start a new, empty cart.
    ///
    /// Returns `RepositoryError::Conflict` if the user already has one.
    async fn create_order(
        &self,
        user_id: UserId,
        ordered_date: DateTime<Utc>,
    ) -> Result<Order, RepositoryError>;

    /// The user's unordered line for `item_id`, created with quantity 1 if
    /// missing. The line may or may not be attached to an order.
    async fn get_or_create_order_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<OrderItem, RepositoryError>;

    /// Attach a line to an order.
    async fn attach_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
    ) -> Result<(), RepositoryError>;

    /// Detach a line from an order, keeping the line row.
    async fn detach_order_item(
        &self,
        order_id: OrderId,
        order_item_id: OrderItemId,
    ) -> Result<(), RepositoryError>;

    /// Delete a line row.
    async fn delete_order_item(&self, order_item_id: OrderItemId) -> Result<(), RepositoryError>;

    /// Overwrite a line's quantity (must be at least 1).
    async fn set_order_item_quantity(
        &self,
        order_item_id: OrderItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Addresses
    // -------------------------------------------------------------------------

    /// Insert a non-default address.
    async fn create_address(&self, address: &NewAddress) -> Result<Address, RepositoryError>;

    /// The user's default address of the given type.
    async fn find_default_address(
        &self,
        user_id: UserId,
        address_type: AddressType,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Make an address the user's default for its type, clearing any
    /// previous default of that type in the same step.
    async fn set_default_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Address, RepositoryError>;

    /// Point an order's shipping or billing address at `address_id`.
    async fn set_order_address(
        &self,
        order_id: OrderId,
        address_type: AddressType,
        address_id: AddressId,
    ) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Coupons
    // -------------------------------------------------------------------------

    /// Look up a coupon by its exact code.
    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError>;

    /// Attach a coupon to an order, replacing any previous one.
    async fn set_order_coupon(
        &self,
        order_id: OrderId,
        coupon_id: CouponId,
    ) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // Payment
    // -------------------------------------------------------------------------

    /// Record the payment, mark the order and its lines ordered and assign
    /// the reference code, all at once.
    ///
    /// Returns `RepositoryError::NotFound` if the order is missing or was
    /// already finalized, `RepositoryError::DuplicateCharge` if the charge
    /// is already recorded, and `RepositoryError::Conflict` if the reference
    /// code is taken.
    async fn finalize_order(
        &self,
        order_id: OrderId,
        payment: &NewPayment,
        ref_code: &ReferenceCode,
    ) -> Result<Payment, RepositoryError>;

    // -------------------------------------------------------------------------
    // Refunds
    // -------------------------------------------------------------------------

    /// Look up a finalized order by reference code.
    async fn find_order_by_ref_code(
        &self,
        ref_code: &ReferenceCode,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Record a refund request and set the order's `refund_requested` flag.
    async fn create_refund(
        &self,
        order_id: OrderId,
        refund: &NewRefund,
    ) -> Result<Refund, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
