//! Cart operations.
//!
//! The cart is the user's order with `ordered = false`. It is created lazily
//! by the first add. Lines are keyed by item: one open line per (user, item).

use chrono::Utc;
use tracing::instrument;

use super::{RequestContext, ShopError};
use crate::db::{RepositoryError, ShopStore};
use crate::models::{Item, Order};

/// What a cart operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOutcome {
    /// The item was already in the cart; its quantity went up by one.
    QuantityIncreased,
    /// The item was added as a new line.
    Added,
    /// The line was removed from the cart.
    Removed,
    /// The line's quantity went down by one, or the line was detached.
    Decremented,
    /// The cart exists but does not contain the item.
    NotInCart,
    /// The user has no cart.
    NoActiveOrder,
}

impl CartOutcome {
    /// Text to flash to the customer.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::QuantityIncreased => "Item quantity updated",
            Self::Added => "This item was added to your cart",
            Self::Removed => "This item was removed from your cart",
            Self::Decremented => "This items quantity was updated",
            Self::NotInCart => "This item was not in your cart",
            Self::NoActiveOrder => "There is nothing in your cart",
        }
    }

    /// Whether the cart was modified.
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(self, Self::NotInCart | Self::NoActiveOrder)
    }
}

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn ShopStore,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn ShopStore) -> Self {
        Self { store }
    }

    /// The user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NoActiveOrder` if the user has no cart.
    pub async fn summary(&self, ctx: RequestContext) -> Result<Order, ShopError> {
        self.store
            .find_active_order(ctx.user)
            .await?
            .ok_or(ShopError::NoActiveOrder)
    }

    /// Add one unit of an item to the cart, creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ItemNotFound` if no item has this slug.
    #[instrument(skip(self))]
    pub async fn add(&self, ctx: RequestContext, slug: &str) -> Result<CartOutcome, ShopError> {
        let item = self.item(slug).await?;
        let line = self
            .store
            .get_or_create_order_item(ctx.user, item.id)
            .await?;

        let order = match self.store.find_active_order(ctx.user).await? {
            Some(order) => order,
            None => self.start_order(ctx).await?,
        };

        if let Some(existing) = order.line_for(slug) {
            self.store
                .set_order_item_quantity(existing.id, existing.quantity.saturating_add(1))
                .await?;
            tracing::debug!(order_id = %order.id, "Incremented cart line");
            return Ok(CartOutcome::QuantityIncreased);
        }

        self.store.attach_order_item(order.id, line.id).await?;
        tracing::debug!(order_id = %order.id, line_id = %line.id, "Added cart line");
        Ok(CartOutcome::Added)
    }

    /// Remove an item's line from the cart entirely.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ItemNotFound` if no item has this slug.
    #[instrument(skip(self))]
    pub async fn remove(&self, ctx: RequestContext, slug: &str) -> Result<CartOutcome, ShopError> {
        self.item(slug).await?;
        let Some(order) = self.store.find_active_order(ctx.user).await? else {
            return Ok(CartOutcome::NoActiveOrder);
        };
        let Some(line) = order.line_for(slug) else {
            return Ok(CartOutcome::NotInCart);
        };

        self.store.detach_order_item(order.id, line.id).await?;
        self.store.delete_order_item(line.id).await?;
        Ok(CartOutcome::Removed)
    }

    /// Take one unit of an item out of the cart.
    ///
    /// A line at quantity 1 is detached from the cart rather than dropped to
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ItemNotFound` if no item has this slug.
    #[instrument(skip(self))]
    pub async fn decrement(
        &self,
        ctx: RequestContext,
        slug: &str,
    ) -> Result<CartOutcome, ShopError> {
        self.item(slug).await?;
        let Some(order) = self.store.find_active_order(ctx.user).await? else {
            return Ok(CartOutcome::NoActiveOrder);
        };
        let Some(line) = order.line_for(slug) else {
            return Ok(CartOutcome::NotInCart);
        };

        if line.quantity > 1 {
            self.store
                .set_order_item_quantity(line.id, line.quantity - 1)
                .await?;
        } else {
            self.store.detach_order_item(order.id, line.id).await?;
        }
        Ok(CartOutcome::Decremented)
    }

    async fn item(&self, slug: &str) -> Result<Item, ShopError> {
        self.store
            .find_item_by_slug(slug)
            .await?
            .ok_or_else(|| ShopError::ItemNotFound(slug.to_owned()))
    }

    /// Create the cart, or pick up the one a concurrent request just created.
    async fn start_order(&self, ctx: RequestContext) -> Result<Order, ShopError> {
        match self.store.create_order(ctx.user, Utc::now()).await {
            Ok(order) => Ok(order),
            Err(RepositoryError::Conflict(_)) => self
                .store
                .find_active_order(ctx.user)
                .await?
                .ok_or(ShopError::NoActiveOrder),
            Err(e) => Err(e.into()),
        }
    }
}
