//! Refund requests.
//!
//! A request only records intent: the order is flagged and a refund row is
//! stored for manual processing. No money moves.

use serde::Deserialize;
use tracing::instrument;

use boutique_core::{Email, ReferenceCode};

use super::ShopError;
use crate::db::{RepositoryError, ShopStore};
use crate::models::{NewRefund, Refund};

/// Submitted refund form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefundForm {
    pub ref_code: String,
    /// Reason for the refund.
    pub message: String,
    pub email: String,
}

/// Refund requester.
pub struct RefundService<'a> {
    store: &'a dyn ShopStore,
}

impl<'a> RefundService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn ShopStore) -> Self {
        Self { store }
    }

    /// Record a refund request against the finalized order with this
    /// reference code.
    ///
    /// # Errors
    ///
    /// - `ShopError::Validation` if a field is blank or the email is invalid
    /// - `ShopError::OrderNotFound` if no finalized order has this reference
    ///   code; nothing is written
    #[instrument(skip(self, form), fields(ref_code = %form.ref_code.trim()))]
    pub async fn request(&self, form: &RefundForm) -> Result<Refund, ShopError> {
        let ref_code = form.ref_code.trim();
        let reason = form.message.trim();
        if ref_code.is_empty() {
            return Err(ShopError::Validation(
                "Please enter your order reference code".to_owned(),
            ));
        }
        if reason.is_empty() {
            return Err(ShopError::Validation(
                "Please tell us why you want a refund".to_owned(),
            ));
        }
        let email = Email::parse(&form.email)
            .map_err(|e| ShopError::Validation(format!("Invalid email: {e}")))?;

        // A malformed code cannot match any order.
        let ref_code = ReferenceCode::parse(ref_code).map_err(|_| ShopError::OrderNotFound)?;
        let order = self
            .store
            .find_order_by_ref_code(&ref_code)
            .await?
            .ok_or(ShopError::OrderNotFound)?;

        let refund = self
            .store
            .create_refund(
                order.id,
                &NewRefund {
                    reason: reason.to_owned(),
                    email,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ShopError::OrderNotFound,
                other => other.into(),
            })?;

        tracing::info!(order_id = %order.id, refund_id = %refund.id, "Refund requested");
        Ok(refund)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use boutique_core::UserId;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewPayment;
    use crate::services::testing::store_with_items;
    use crate::services::{CartService, RequestContext};

    const CTX: RequestContext = RequestContext::new(UserId::new(3));
    const REF: &str = "abcdefghij0123456789";

    async fn store_with_finalized_order() -> MemoryStore {
        let (store, _, _) = store_with_items().await;
        CartService::new(&store).add(CTX, "widget").await.unwrap();
        let order = store.find_active_order(CTX.user).await.unwrap().unwrap();
        store
            .finalize_order(
                order.id,
                &NewPayment {
                    charge_id: "ch_1".to_owned(),
                    user_id: CTX.user,
                    amount: Decimal::new(1000, 2),
                },
                &ReferenceCode::parse(REF).unwrap(),
            )
            .await
            .unwrap();
        store
    }

    fn form(ref_code: &str) -> RefundForm {
        RefundForm {
            ref_code: ref_code.to_owned(),
            message: "Wrong size".to_owned(),
            email: "ada@example.com".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_request_flags_order_and_records_refund() {
        let store = store_with_finalized_order().await;

        let refund = RefundService::new(&store)
            .request(&form(&format!(" {REF} ")))
            .await
            .unwrap();

        assert_eq!(refund.reason, "Wrong size");
        assert!(!refund.accepted);
        assert!(refund.created_at <= Utc::now());
        let order = store
            .find_order_by_ref_code(&ReferenceCode::parse(REF).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(order.refund_requested);
        assert_eq!(store.refunds_for(order.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_reference_creates_nothing() {
        let store = store_with_finalized_order().await;
        let service = RefundService::new(&store);

        for code in ["zzzzzzzzzzzzzzzzzzzz", "short"] {
            let err = service.request(&form(code)).await.unwrap_err();
            assert!(matches!(err, ShopError::OrderNotFound));
        }

        let order = store
            .find_order_by_ref_code(&ReferenceCode::parse(REF).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(!order.refund_requested);
        assert!(store.refunds_for(order.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_fields_are_validation_errors() {
        let store = store_with_finalized_order().await;
        let service = RefundService::new(&store);

        let blank_reason = RefundForm {
            message: "  ".to_owned(),
            ..form(REF)
        };
        let bad_email = RefundForm {
            email: "not-an-email".to_owned(),
            ..form(REF)
        };

        for bad in [form(""), blank_reason, bad_email] {
            assert!(matches!(
                service.request(&bad).await.unwrap_err(),
                ShopError::Validation(_)
            ));
        }
    }
}
