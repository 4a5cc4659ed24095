//! Address resolution at checkout.

#![allow(clippy::unwrap_used)]

use boutique_core::AddressType;
use boutique_integration_tests::{same_billing_form, shop, user};
use boutique_storefront::db::ShopStore;
use boutique_storefront::services::{CartService, CheckoutForm, CheckoutService, ShopError};

fn separate_billing_form() -> CheckoutForm {
    CheckoutForm {
        same_billing_address: false,
        billing_first_name: "Charles".to_owned(),
        billing_last_name: "Babbage".to_owned(),
        billing_address: "1 Dorset St".to_owned(),
        billing_country: "GB".to_owned(),
        billing_zip: "W1U 4EG".to_owned(),
        ..same_billing_form()
    }
}

#[tokio::test]
async fn test_same_billing_copies_shipping_into_distinct_record() {
    let store = shop().await;
    let ctx = user(1);
    CartService::new(&store).add(ctx, "widget").await.unwrap();

    CheckoutService::new(&store)
        .submit(ctx, &same_billing_form())
        .await
        .unwrap();

    let order = store.find_active_order(ctx.user).await.unwrap().unwrap();
    let shipping = order.shipping_address.unwrap();
    let billing = order.billing_address.unwrap();
    assert_ne!(shipping.id, billing.id);
    assert_eq!(shipping.fields, billing.fields);
    assert_eq!(shipping.address_type, AddressType::Shipping);
    assert_eq!(billing.address_type, AddressType::Billing);
    assert_eq!(shipping.fields.name, "Ada Lovelace");
    assert_eq!(shipping.fields.country, "GB");
    assert!(shipping.fields.apartment_address.is_none());
}

#[tokio::test]
async fn test_saving_a_new_default_replaces_the_old_one() {
    let store = shop().await;
    let ctx = user(2);
    let checkout = CheckoutService::new(&store);
    CartService::new(&store).add(ctx, "widget").await.unwrap();

    let mut form = separate_billing_form();
    form.set_default_shipping = true;
    checkout.submit(ctx, &form).await.unwrap();

    form.shipping_address = "99 Difference Engine Way".to_owned();
    checkout.submit(ctx, &form).await.unwrap();

    let defaults: Vec<_> = store
        .addresses_for(ctx.user)
        .await
        .into_iter()
        .filter(|a| a.address_type == AddressType::Shipping && a.default)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].fields.street_address, "99 Difference Engine Way");
}

#[tokio::test]
async fn test_use_default_reuses_stored_address() {
    let store = shop().await;
    let ctx = user(3);
    let checkout = CheckoutService::new(&store);
    CartService::new(&store).add(ctx, "widget").await.unwrap();

    let mut form = separate_billing_form();
    form.set_default_shipping = true;
    form.set_default_billing = true;
    checkout.submit(ctx, &form).await.unwrap();
    let before = store.addresses_for(ctx.user).await.len();

    let reuse = CheckoutForm {
        use_default_shipping: true,
        use_default_billing: true,
        payment_option: "stripe".to_owned(),
        ..CheckoutForm::default()
    };
    checkout.submit(ctx, &reuse).await.unwrap();

    assert_eq!(store.addresses_for(ctx.user).await.len(), before);
    let order = store.find_active_order(ctx.user).await.unwrap().unwrap();
    assert_eq!(
        order.billing_address.unwrap().fields.name,
        "Charles Babbage"
    );
}

#[tokio::test]
async fn test_use_default_without_one_fails() {
    let store = shop().await;
    let ctx = user(4);
    CartService::new(&store).add(ctx, "widget").await.unwrap();

    let form = CheckoutForm {
        use_default_shipping: true,
        payment_option: "stripe".to_owned(),
        ..CheckoutForm::default()
    };
    let err = CheckoutService::new(&store)
        .submit(ctx, &form)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ShopError::DefaultAddressMissing(AddressType::Shipping)
    ));
    assert_eq!(err.user_message(), "No default shipping address available");
}

#[tokio::test]
async fn test_incomplete_address_is_rejected_and_not_stored() {
    let store = shop().await;
    let ctx = user(5);
    CartService::new(&store).add(ctx, "widget").await.unwrap();

    let form = CheckoutForm {
        shipping_zip: String::new(),
        ..same_billing_form()
    };
    let err = CheckoutService::new(&store)
        .submit(ctx, &form)
        .await
        .unwrap_err();

    match err {
        ShopError::MissingAddressFields {
            address_type,
            fields,
        } => {
            assert_eq!(address_type, AddressType::Shipping);
            assert_eq!(fields, vec!["zip"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.addresses_for(ctx.user).await.is_empty());
}

#[tokio::test]
async fn test_checkout_without_cart_or_with_paypal() {
    let store = shop().await;
    let ctx = user(6);
    let checkout = CheckoutService::new(&store);

    assert!(matches!(
        checkout.submit(ctx, &same_billing_form()).await.unwrap_err(),
        ShopError::NoActiveOrder
    ));

    CartService::new(&store).add(ctx, "widget").await.unwrap();
    let paypal = CheckoutForm {
        payment_option: "paypal".to_owned(),
        ..same_billing_form()
    };
    let err = checkout.submit(ctx, &paypal).await.unwrap_err();
    assert!(matches!(err, ShopError::Validation(_)));
    assert!(store.addresses_for(ctx.user).await.is_empty());
}

#[tokio::test]
async fn test_billing_failure_writes_no_shipping_address() {
    let store = shop().await;
    let ctx = user(7);
    CartService::new(&store).add(ctx, "widget").await.unwrap();

    let form = CheckoutForm {
        same_billing_address: false,
        ..same_billing_form()
    };
    let err = CheckoutService::new(&store)
        .submit(ctx, &form)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ShopError::MissingAddressFields {
            address_type: AddressType::Billing,
            ..
        }
    ));
    let order = store.find_active_order(ctx.user).await.unwrap().unwrap();
    assert!(order.shipping_address.is_none());
    assert!(order.billing_address.is_none());
    assert!(store.addresses_for(ctx.user).await.is_empty());
}
