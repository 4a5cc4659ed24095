//! Payment orchestrator.
//!
//! Moves the cart through `cart -> awaiting_payment -> finalized`.
//! [`PaymentOrchestrator::begin`] requires a billing address and opens a
//! payment intent for the order total. [`PaymentOrchestrator::charge`]
//! confirms the intent with the processor and, only on success, records the
//! payment and finalizes the order with a fresh reference code.
//!
//! There is no de-duplication token: a second `charge` for the same cart
//! finds no active order and fails with [`ShopError::NoActiveOrder`]. A
//! charge can pay for one order only; replaying it against a later cart is
//! refused and leaves that cart unpaid.

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::instrument;

use boutique_core::{CurrencyCode, Price, ReferenceCode, ReferenceCodeError};

use super::{RequestContext, ShopError};
use crate::db::{RepositoryError, ShopStore};
use crate::models::{NewPayment, Order};
use crate::payments::{PaymentError, PaymentErrorKind, PaymentGateway, PaymentIntent};

/// Attempts at finding an unused reference code before giving up.
const MAX_REF_CODE_ATTEMPTS: usize = 5;

/// Shown when a payment that already paid for another order is posted again.
pub const CHARGE_ALREADY_USED_MESSAGE: &str =
    "This payment has already been used for another order.";

/// Data for rendering the card payment page.
#[derive(Debug, Clone)]
pub struct PaymentPage {
    pub order: Order,
    pub intent: PaymentIntent,
    pub amount: Price,
}

/// Draw a random reference code.
///
/// # Errors
///
/// Never fails in practice; the result is validated like any other code.
pub fn generate_ref_code<R: Rng + ?Sized>(rng: &mut R) -> Result<ReferenceCode, ReferenceCodeError> {
    let code: String = (0..ReferenceCode::LENGTH)
        .filter_map(|_| {
            ReferenceCode::ALPHABET
                .choose(&mut *rng)
                .copied()
                .map(char::from)
        })
        .collect();
    ReferenceCode::parse(&code)
}

/// Payment orchestrator, constructed with an explicit gateway and currency.
pub struct PaymentOrchestrator<'a> {
    store: &'a dyn ShopStore,
    gateway: &'a dyn PaymentGateway,
    currency: CurrencyCode,
}

impl<'a> PaymentOrchestrator<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn ShopStore,
        gateway: &'a dyn PaymentGateway,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            store,
            gateway,
            currency,
        }
    }

    /// Enter `awaiting_payment`: open a payment intent for the cart total.
    ///
    /// # Errors
    ///
    /// - `ShopError::NoActiveOrder` if the user has no cart
    /// - `ShopError::MissingBillingAddress` if checkout has not set one; the
    ///   processor is not contacted
    /// - `ShopError::Payment` if the processor refuses the intent
    #[instrument(skip(self))]
    pub async fn begin(&self, ctx: RequestContext) -> Result<PaymentPage, ShopError> {
        let order = self.payable_order(ctx).await?;
        let amount = order.amount_due(self.currency);
        let amount_minor = minor_units(&order, amount)?;

        let intent = self
            .gateway
            .create_payment_intent(amount_minor, self.currency)
            .await
            .inspect_err(|e| report(e, &order))?;

        Ok(PaymentPage {
            order,
            intent,
            amount,
        })
    }

    /// Confirm the payment and finalize the cart.
    ///
    /// On any processor failure nothing is written and the cart stays in
    /// `awaiting_payment`.
    ///
    /// # Errors
    ///
    /// - `ShopError::NoActiveOrder` if the user has no cart (including when
    ///   it was already finalized)
    /// - `ShopError::MissingBillingAddress` if checkout has not set one; the
    ///   processor is not contacted
    /// - `ShopError::Payment` if the processor did not capture the amount
    #[instrument(skip(self))]
    pub async fn charge(&self, ctx: RequestContext, intent_id: &str) -> Result<Order, ShopError> {
        let mut order = self.payable_order(ctx).await?;
        let amount = order.amount_due(self.currency);
        let amount_minor = minor_units(&order, amount)?;

        let confirmation = self
            .gateway
            .confirm_payment(intent_id, amount_minor, self.currency)
            .await
            .inspect_err(|e| report(e, &order))?;

        let new_payment = NewPayment {
            charge_id: confirmation.charge_id,
            user_id: ctx.user,
            amount: amount.amount,
        };

        let mut attempts = 0;
        let (payment, ref_code) = loop {
            let ref_code = generate_ref_code(&mut rand::rng())
                .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
            match self
                .store
                .finalize_order(order.id, &new_payment, &ref_code)
                .await
            {
                Ok(payment) => break (payment, ref_code),
                Err(RepositoryError::Conflict(_)) if attempts + 1 < MAX_REF_CODE_ATTEMPTS => {
                    attempts += 1;
                }
                Err(RepositoryError::NotFound) => return Err(ShopError::NoActiveOrder),
                Err(RepositoryError::DuplicateCharge(charge_id)) => {
                    tracing::error!(order_id = %order.id, %charge_id, "Charge replayed for another order");
                    return Err(PaymentError::new(
                        PaymentErrorKind::InvalidRequest,
                        CHARGE_ALREADY_USED_MESSAGE,
                    )
                    .into());
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            order_id = %order.id,
            payment_id = %payment.id,
            %ref_code,
            amount = %amount.display(),
            "Order finalized"
        );

        order.ordered = true;
        for line in &mut order.items {
            line.ordered = true;
        }
        order.payment = Some(payment);
        order.ref_code = Some(ref_code);
        Ok(order)
    }

    async fn payable_order(&self, ctx: RequestContext) -> Result<Order, ShopError> {
        let order = self
            .store
            .find_active_order(ctx.user)
            .await?
            .ok_or(ShopError::NoActiveOrder)?;
        if order.billing_address.is_none() {
            return Err(ShopError::MissingBillingAddress);
        }
        if order.items.is_empty() {
            return Err(ShopError::Validation("Your cart is empty".to_owned()));
        }
        Ok(order)
    }
}

fn minor_units(order: &Order, amount: Price) -> Result<i64, ShopError> {
    amount.to_minor_units().map_err(|e| {
        tracing::warn!(order_id = %order.id, error = %e, "Order total cannot be charged");
        ShopError::Validation("Your order total cannot be charged".to_owned())
    })
}

fn report(error: &PaymentError, order: &Order) {
    if error.needs_attention() {
        tracing::error!(order_id = %order.id, kind = %error.kind, error = %error.message, "Payment processor failure");
    } else {
        tracing::warn!(order_id = %order.id, kind = %error.kind, error = %error.message, "Payment refused");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use boutique_core::UserId;

    use super::*;
    use crate::db::MemoryStore;
    use crate::payments::{ChargeConfirmation, MockPaymentGateway};
    use crate::services::testing::store_with_items;
    use crate::services::{CartService, CheckoutForm, CheckoutService};

    const CTX: RequestContext = RequestContext::new(UserId::new(11));

    async fn cart_with_widgets(with_billing: bool) -> MemoryStore {
        let (store, _, _) = store_with_items().await;
        fill_cart(&store, with_billing).await;
        store
    }

    async fn fill_cart(store: &MemoryStore, with_billing: bool) {
        let cart = CartService::new(store);
        for slug in ["widget", "widget", "widget", "gadget"] {
            cart.add(CTX, slug).await.unwrap();
        }
        if with_billing {
            let form = CheckoutForm {
                shipping_first_name: "Ada".to_owned(),
                shipping_address: "1 Main St".to_owned(),
                shipping_country: "BE".to_owned(),
                shipping_zip: "1000".to_owned(),
                same_billing_address: true,
                payment_option: "stripe".to_owned(),
                ..CheckoutForm::default()
            };
            CheckoutService::new(store).submit(CTX, &form).await.unwrap();
        }
    }

    #[test]
    fn test_generated_codes_are_valid_and_distinct() {
        let mut rng = StdRng::seed_from_u64(42);
        let a = generate_ref_code(&mut rng).unwrap();
        let b = generate_ref_code(&mut rng).unwrap();

        assert_eq!(a.as_str().len(), ReferenceCode::LENGTH);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_begin_without_billing_does_not_contact_processor() {
        let store = cart_with_widgets(false).await;
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_payment_intent().times(0);

        let err = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR)
            .begin(CTX)
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::MissingBillingAddress));
    }

    #[tokio::test]
    async fn test_charge_without_billing_does_not_contact_processor() {
        let store = cart_with_widgets(false).await;
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_confirm_payment().times(0);

        let err = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR)
            .charge(CTX, "pi_1")
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::MissingBillingAddress));
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn test_begin_requests_order_total_in_cents() {
        let store = cart_with_widgets(true).await;
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_payment_intent()
            .withf(|amount, currency| *amount == 3500 && *currency == CurrencyCode::EUR)
            .times(1)
            .returning(|_, _| {
                Ok(PaymentIntent {
                    id: "pi_1".to_owned(),
                    client_secret: "pi_1_secret".to_owned(),
                })
            });

        let page = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR)
            .begin(CTX)
            .await
            .unwrap();

        assert_eq!(page.intent.client_secret, "pi_1_secret");
        assert_eq!(page.amount.display(), "€35.00");
    }

    #[tokio::test]
    async fn test_successful_charge_finalizes_order() {
        let store = cart_with_widgets(true).await;
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_confirm_payment()
            .withf(|_, amount, _| *amount == 3500)
            .times(1)
            .returning(|_, _, _| {
                Ok(ChargeConfirmation {
                    charge_id: "ch_1".to_owned(),
                })
            });

        let order = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR)
            .charge(CTX, "pi_1")
            .await
            .unwrap();

        assert!(order.ordered);
        assert!(order.items.iter().all(|line| line.ordered));
        assert_eq!(order.payment.as_ref().unwrap().charge_id, "ch_1");
        assert_eq!(order.payment.as_ref().unwrap().amount, rust_decimal::Decimal::new(3500, 2));

        let stored = store
            .find_order_by_ref_code(order.ref_code.as_ref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, order.id);
        assert!(stored.ordered);
        assert!(store.find_active_order(CTX.user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_declined_charge_changes_nothing() {
        let store = cart_with_widgets(true).await;
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_confirm_payment()
            .times(1)
            .returning(|_, _, _| {
                Err(PaymentError::new(
                    PaymentErrorKind::Declined,
                    "Your card was declined.",
                ))
            });

        let err = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR)
            .charge(CTX, "pi_1")
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Your card was declined.");
        let order = store.find_active_order(CTX.user).await.unwrap().unwrap();
        assert!(!order.ordered);
        assert!(order.ref_code.is_none());
        assert!(order.payment.is_none());
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn test_second_charge_finds_no_active_order() {
        let store = cart_with_widgets(true).await;
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_confirm_payment()
            .times(1)
            .returning(|_, _, _| {
                Ok(ChargeConfirmation {
                    charge_id: "ch_1".to_owned(),
                })
            });
        let orchestrator = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR);

        orchestrator.charge(CTX, "pi_1").await.unwrap();
        let err = orchestrator.charge(CTX, "pi_1").await.unwrap_err();

        assert!(matches!(err, ShopError::NoActiveOrder));
        assert_eq!(store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn test_replayed_charge_does_not_pay_for_a_new_cart() {
        let store = cart_with_widgets(true).await;
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_confirm_payment()
            .times(2)
            .returning(|_, _, _| {
                Ok(ChargeConfirmation {
                    charge_id: "ch_paid_once".to_owned(),
                })
            });
        let orchestrator = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR);
        orchestrator.charge(CTX, "pi_1").await.unwrap();

        fill_cart(&store, true).await;
        let err = orchestrator.charge(CTX, "pi_1").await.unwrap_err();

        assert_eq!(err.kind(), crate::services::ErrorKind::Payment);
        assert_eq!(err.user_message(), CHARGE_ALREADY_USED_MESSAGE);
        let cart = store.find_active_order(CTX.user).await.unwrap().unwrap();
        assert!(!cart.ordered);
        assert!(cart.payment.is_none());
        assert!(cart.ref_code.is_none());
        assert_eq!(store.payment_count().await, 1);
    }
}
