//! Failed charges leave the cart intact and record nothing.

#![allow(clippy::unwrap_used)]

use boutique_core::{CurrencyCode, OrderStatus};
use boutique_integration_tests::{ScriptedGateway, same_billing_form, shop, user};
use boutique_storefront::db::{MemoryStore, ShopStore};
use boutique_storefront::payments::{PaymentError, PaymentErrorKind, UNKNOWN_FAILURE_MESSAGE};
use boutique_storefront::services::{
    CartService, CheckoutService, ErrorKind, PaymentOrchestrator, RequestContext, ShopError,
};

async fn ready_to_pay(store: &MemoryStore, ctx: RequestContext) {
    CartService::new(store).add(ctx, "widget").await.unwrap();
    CheckoutService::new(store)
        .submit(ctx, &same_billing_form())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_every_failure_kind_leaves_cart_unpaid() {
    let kinds = [
        PaymentErrorKind::Declined,
        PaymentErrorKind::RateLimited,
        PaymentErrorKind::InvalidRequest,
        PaymentErrorKind::AuthenticationFailure,
        PaymentErrorKind::ConnectionFailure,
        PaymentErrorKind::ProcessorError,
        PaymentErrorKind::Unknown,
    ];

    for kind in kinds {
        let store = shop().await;
        let gateway = ScriptedGateway::new();
        let ctx = user(1);
        ready_to_pay(&store, ctx).await;
        gateway.fail_next(PaymentError::new(kind, "processor said no"));

        let err = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR)
            .charge(ctx, "pi_1")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Payment, "{kind}");
        let cart = store.find_active_order(ctx.user).await.unwrap().unwrap();
        assert_eq!(cart.status(), OrderStatus::AwaitingPayment, "{kind}");
        assert!(cart.payment.is_none());
        assert!(cart.ref_code.is_none());
        assert!(cart.items.iter().all(|line| !line.ordered));
        assert_eq!(store.payment_count().await, 0, "{kind}");
    }
}

#[tokio::test]
async fn test_processor_message_is_shown_unless_unknown() {
    let store = shop().await;
    let gateway = ScriptedGateway::new();
    let ctx = user(2);
    ready_to_pay(&store, ctx).await;
    let payments = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR);

    gateway.fail_next(PaymentError::new(
        PaymentErrorKind::Declined,
        "Your card has insufficient funds.",
    ));
    let err = payments.charge(ctx, "pi_1").await.unwrap_err();
    assert_eq!(err.user_message(), "Your card has insufficient funds.");

    gateway.fail_next(PaymentError::new(PaymentErrorKind::Unknown, "stack trace"));
    let err = payments.charge(ctx, "pi_1").await.unwrap_err();
    assert_eq!(err.user_message(), UNKNOWN_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_retry_after_decline_succeeds() {
    let store = shop().await;
    let gateway = ScriptedGateway::new();
    let ctx = user(3);
    ready_to_pay(&store, ctx).await;
    let payments = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR);

    gateway.fail_next(PaymentError::new(PaymentErrorKind::Declined, ""));
    payments.charge(ctx, "pi_1").await.unwrap_err();
    let order = payments.charge(ctx, "pi_1").await.unwrap();

    assert!(order.ordered);
    assert_eq!(store.payment_count().await, 1);
    assert_eq!(gateway.confirm_count(), 2);
}

#[tokio::test]
async fn test_no_gateway_call_without_billing_address() {
    let store = shop().await;
    let gateway = ScriptedGateway::new();
    let ctx = user(4);
    CartService::new(&store).add(ctx, "widget").await.unwrap();
    let payments = PaymentOrchestrator::new(&store, &gateway, CurrencyCode::EUR);

    assert!(matches!(
        payments.begin(ctx).await.unwrap_err(),
        ShopError::MissingBillingAddress
    ));
    assert!(matches!(
        payments.charge(ctx, "pi_1").await.unwrap_err(),
        ShopError::MissingBillingAddress
    ));
    assert!(gateway.calls().is_empty());
}
