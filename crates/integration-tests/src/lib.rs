//! Shared fixtures for the Boutique integration tests.
//!
//! Tests run the storefront services and router against the in-memory
//! store and [`ScriptedGateway`], so no database or payment processor is
//! needed:
//!
//! ```bash
//! cargo test -p boutique-integration-tests
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use url::Url;

use boutique_core::{CurrencyCode, Discount, ItemCategory, Slug, UserId};
use boutique_storefront::config::{SentryConfig, StorefrontConfig, StripeConfig};
use boutique_storefront::db::MemoryStore;
use boutique_storefront::models::NewItem;
use boutique_storefront::payments::{
    ChargeConfirmation, PaymentError, PaymentGateway, PaymentIntent,
};
use boutique_storefront::services::{CheckoutForm, RequestContext};

/// A call the storefront made to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CreateIntent {
        amount_minor: i64,
        currency: CurrencyCode,
    },
    Confirm {
        intent_id: String,
        amount_minor: i64,
        currency: CurrencyCode,
    },
}

/// Payment gateway that records calls and replays queued confirmation
/// results. With nothing queued, every confirmation succeeds.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    calls: Mutex<Vec<GatewayCall>>,
    confirmations: Mutex<VecDeque<Result<ChargeConfirmation, PaymentError>>>,
}

impl ScriptedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next confirmation fail with `error`.
    pub fn fail_next(&self, error: PaymentError) {
        self.confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
    }

    /// Make the next confirmation succeed with `charge_id`.
    pub fn confirm_next_as(&self, charge_id: &str) {
        self.confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(ChargeConfirmation {
                charge_id: charge_id.to_owned(),
            }));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn confirm_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, GatewayCall::Confirm { .. }))
            .count()
    }

    fn record(&self, call: GatewayCall) -> usize {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.push(call);
        calls.len()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: CurrencyCode,
    ) -> Result<PaymentIntent, PaymentError> {
        let n = self.record(GatewayCall::CreateIntent {
            amount_minor,
            currency,
        });
        Ok(PaymentIntent {
            id: format!("pi_{n}"),
            client_secret: format!("pi_{n}_secret"),
        })
    }

    async fn confirm_payment(
        &self,
        intent_id: &str,
        amount_minor: i64,
        currency: CurrencyCode,
    ) -> Result<ChargeConfirmation, PaymentError> {
        let n = self.record(GatewayCall::Confirm {
            intent_id: intent_id.to_owned(),
            amount_minor,
            currency,
        });
        self.confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ChargeConfirmation {
                    charge_id: format!("ch_{n}"),
                })
            })
    }
}

/// Request context for user `id`.
#[must_use]
pub const fn user(id: i64) -> RequestContext {
    RequestContext::new(UserId::new(id))
}

/// Catalog item input priced in cents.
///
/// # Panics
///
/// Panics if `slug` is not a valid slug.
#[must_use]
pub fn item(slug: &str, cents: i64) -> NewItem {
    NewItem {
        name: slug.to_uppercase(),
        slug: Slug::parse(slug).expect("fixture slug is valid"),
        price: Decimal::new(cents, 2),
        discount_price: None,
        category: ItemCategory::Shirt,
        label: None,
        description: format!("The {slug}"),
        image: None,
    }
}

/// A shop holding:
///
/// - `widget` at 10.00
/// - `gadget` at 5.00
/// - `scarf` at 20.00, on sale for 15.00
/// - coupons `FIVE` (5.00 off) and `HALF` (50% off)
pub async fn shop() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_item(item("widget", 1000)).await;
    store.add_item(item("gadget", 500)).await;
    store
        .add_item(NewItem {
            discount_price: Some(Decimal::new(1500, 2)),
            ..item("scarf", 2000)
        })
        .await;
    store
        .add_coupon("FIVE", Discount::Fixed(Decimal::new(500, 2)))
        .await;
    store
        .add_coupon("HALF", Discount::Percentage(Decimal::new(50, 0)))
        .await;
    store
}

/// Checkout form with a complete shipping address, billing copied from it.
#[must_use]
pub fn same_billing_form() -> CheckoutForm {
    CheckoutForm {
        shipping_first_name: "Ada".to_owned(),
        shipping_last_name: "Lovelace".to_owned(),
        shipping_address: "12 Analytical Row".to_owned(),
        shipping_country: "gb".to_owned(),
        shipping_zip: "N1 9GU".to_owned(),
        same_billing_address: true,
        payment_option: "stripe".to_owned(),
        ..CheckoutForm::default()
    }
}

/// Configuration suitable for building an `AppState` in tests.
///
/// # Panics
///
/// Never in practice; the Stripe URL is a constant.
#[must_use]
pub fn config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/boutique_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from("k".repeat(64)),
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            public_key: "pk_test_TYooMQauvdEDq54NiTphI7jx".to_owned(),
            api_base: Url::parse("https://api.stripe.com").expect("constant URL parses"),
            currency: CurrencyCode::EUR,
        },
        sentry: SentryConfig::default(),
    }
}
