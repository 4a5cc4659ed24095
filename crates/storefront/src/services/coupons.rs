//! Coupon application.

use tracing::instrument;

use super::{RequestContext, ShopError};
use crate::db::ShopStore;
use crate::models::Coupon;

/// Coupon applier.
pub struct CouponService<'a> {
    store: &'a dyn ShopStore,
}

impl<'a> CouponService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn ShopStore) -> Self {
        Self { store }
    }

    /// Attach the coupon with this code to the user's cart, replacing any
    /// coupon already there.
    ///
    /// # Errors
    ///
    /// - `ShopError::Validation` if the code is blank
    /// - `ShopError::NoActiveOrder` if the user has no cart
    /// - `ShopError::CouponNotFound` if no coupon has this code
    #[instrument(skip(self))]
    pub async fn apply(&self, ctx: RequestContext, code: &str) -> Result<Coupon, ShopError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ShopError::Validation("Please enter a coupon code".to_owned()));
        }

        let order = self
            .store
            .find_active_order(ctx.user)
            .await?
            .ok_or(ShopError::NoActiveOrder)?;
        let coupon = self
            .store
            .find_coupon_by_code(code)
            .await?
            .ok_or(ShopError::CouponNotFound)?;

        self.store.set_order_coupon(order.id, coupon.id).await?;
        tracing::info!(order_id = %order.id, coupon_id = %coupon.id, "Applied coupon");
        Ok(coupon)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use boutique_core::{Discount, UserId};

    use super::*;
    use crate::services::CartService;
    use crate::services::testing::store_with_items;

    const CTX: RequestContext = RequestContext::new(UserId::new(5));

    #[tokio::test]
    async fn test_apply_replaces_previous_coupon() {
        let (store, _, _) = store_with_items().await;
        store
            .add_coupon("FIVE", Discount::Fixed(Decimal::new(500, 2)))
            .await;
        store
            .add_coupon("HALF", Discount::Percentage(Decimal::new(50, 0)))
            .await;
        CartService::new(&store).add(CTX, "widget").await.unwrap();
        let coupons = CouponService::new(&store);

        coupons.apply(CTX, "FIVE").await.unwrap();
        coupons.apply(CTX, " HALF ").await.unwrap();

        let order = store.find_active_order(CTX.user).await.unwrap().unwrap();
        assert_eq!(order.coupon.as_ref().unwrap().code, "HALF");
        assert_eq!(order.total(), Decimal::new(500, 2));
    }

    #[tokio::test]
    async fn test_unknown_code_leaves_order_unchanged() {
        let (store, _, _) = store_with_items().await;
        CartService::new(&store).add(CTX, "widget").await.unwrap();

        let err = CouponService::new(&store)
            .apply(CTX, "NOPE")
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::CouponNotFound));
        let order = store.find_active_order(CTX.user).await.unwrap().unwrap();
        assert!(order.coupon.is_none());
    }

    #[tokio::test]
    async fn test_blank_code_and_missing_cart() {
        let (store, _, _) = store_with_items().await;
        let coupons = CouponService::new(&store);

        assert!(matches!(
            coupons.apply(CTX, "   ").await.unwrap_err(),
            ShopError::Validation(_)
        ));
        assert!(matches!(
            coupons.apply(CTX, "FIVE").await.unwrap_err(),
            ShopError::NoActiveOrder
        ));
    }
}
