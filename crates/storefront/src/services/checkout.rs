//! Checkout: address resolution and payment option selection.
//!
//! Shipping and billing are resolved independently. For each one the form
//! either asks for the stored default, or supplies fresh fields which become
//! a new address (optionally made the default). Billing can instead copy the
//! resolved shipping address into an independent billing record.

use serde::{Deserialize, Deserializer};
use tracing::instrument;

use boutique_core::{AddressType, OrderId, PaymentOption};

use super::{RequestContext, ShopError};
use crate::db::ShopStore;
use crate::models::{Address, AddressFields, NewAddress, Order};

/// Submitted checkout form.
///
/// Checkbox fields are true when present with any of the usual "checked"
/// values (`on`, `true`, `1`, `yes`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub shipping_first_name: String,
    pub shipping_last_name: String,
    pub shipping_address: String,
    pub shipping_address2: String,
    pub shipping_country: String,
    pub shipping_zip: String,

    pub billing_first_name: String,
    pub billing_last_name: String,
    pub billing_address: String,
    pub billing_address2: String,
    pub billing_country: String,
    pub billing_zip: String,

    #[serde(deserialize_with = "checkbox")]
    pub same_billing_address: bool,
    #[serde(deserialize_with = "checkbox")]
    pub set_default_shipping: bool,
    #[serde(deserialize_with = "checkbox")]
    pub use_default_shipping: bool,
    #[serde(deserialize_with = "checkbox")]
    pub set_default_billing: bool,
    #[serde(deserialize_with = "checkbox")]
    pub use_default_billing: bool,

    pub payment_option: String,
}

impl CheckoutForm {
    #[must_use]
    pub fn shipping_fields(&self) -> AddressFields {
        address_fields(
            &self.shipping_first_name,
            &self.shipping_last_name,
            &self.shipping_address,
            &self.shipping_address2,
            &self.shipping_country,
            &self.shipping_zip,
        )
    }

    #[must_use]
    pub fn billing_fields(&self) -> AddressFields {
        address_fields(
            &self.billing_first_name,
            &self.billing_last_name,
            &self.billing_address,
            &self.billing_address2,
            &self.billing_country,
            &self.billing_zip,
        )
    }

    /// The chosen payment option, if it is one we can take.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` for unknown or unavailable options.
    pub fn payment_option(&self) -> Result<PaymentOption, ShopError> {
        let raw = self.payment_option.trim();
        let option = match raw {
            "S" => PaymentOption::Stripe,
            "P" => PaymentOption::PayPal,
            other => other
                .to_ascii_lowercase()
                .parse()
                .map_err(|_| ShopError::Validation("Invalid payment option selected".to_owned()))?,
        };
        match option {
            PaymentOption::Stripe => Ok(option),
            PaymentOption::PayPal => Err(ShopError::Validation(
                "This payment option is not available".to_owned(),
            )),
        }
    }
}

fn address_fields(
    first_name: &str,
    last_name: &str,
    street: &str,
    apartment: &str,
    country: &str,
    zip: &str,
) -> AddressFields {
    let name = [first_name.trim(), last_name.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    AddressFields {
        name,
        street_address: street.to_owned(),
        apartment_address: Some(apartment.to_owned()),
        country: country.to_owned(),
        zip: zip.to_owned(),
    }
    .trimmed()
}

fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(matches!(
        value.as_deref().map(str::trim),
        Some("on" | "true" | "1" | "yes")
    ))
}

/// Data for rendering the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutPage {
    pub order: Order,
    pub default_shipping: Option<Address>,
    pub default_billing: Option<Address>,
}

/// Checkout service (address resolver).
pub struct CheckoutService<'a> {
    store: &'a dyn ShopStore,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn ShopStore) -> Self {
        Self { store }
    }

    /// Load the cart and the user's default addresses.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NoActiveOrder` if the user has no cart.
    pub async fn prepare(&self, ctx: RequestContext) -> Result<CheckoutPage, ShopError> {
        let order = self
            .store
            .find_active_order(ctx.user)
            .await?
            .ok_or(ShopError::NoActiveOrder)?;
        let default_shipping = self
            .store
            .find_default_address(ctx.user, AddressType::Shipping)
            .await?;
        let default_billing = self
            .store
            .find_default_address(ctx.user, AddressType::Billing)
            .await?;

        Ok(CheckoutPage {
            order,
            default_shipping,
            default_billing,
        })
    }

    /// Resolve and attach the shipping and billing addresses, then return
    /// the payment option to continue with.
    ///
    /// Both sides are checked before anything is written, so a failure on
    /// either leaves the cart and the address book untouched.
    ///
    /// # Errors
    ///
    /// - `ShopError::Validation` for an unknown or unavailable payment option
    /// - `ShopError::NoActiveOrder` if the user has no cart
    /// - `ShopError::DefaultAddressMissing` if a default was requested but
    ///   none is stored
    /// - `ShopError::MissingAddressFields` if a new address is incomplete
    #[instrument(skip(self, form))]
    pub async fn submit(
        &self,
        ctx: RequestContext,
        form: &CheckoutForm,
    ) -> Result<PaymentOption, ShopError> {
        let payment_option = form.payment_option()?;
        let order = self
            .store
            .find_active_order(ctx.user)
            .await?
            .ok_or(ShopError::NoActiveOrder)?;

        let shipping = self
            .plan(
                ctx,
                AddressType::Shipping,
                form.use_default_shipping,
                form.set_default_shipping,
                form.shipping_fields(),
            )
            .await?;
        let billing = if form.same_billing_address {
            None
        } else {
            Some(
                self.plan(
                    ctx,
                    AddressType::Billing,
                    form.use_default_billing,
                    form.set_default_billing,
                    form.billing_fields(),
                )
                .await?,
            )
        };

        let shipping = self.apply(ctx, order.id, shipping).await?;
        match billing {
            Some(billing) => {
                self.apply(ctx, order.id, billing).await?;
            }
            None => {
                let copy = NewAddress::copy_as(&shipping, AddressType::Billing);
                let billing = self.store.create_address(&copy).await?;
                self.store
                    .set_order_address(order.id, AddressType::Billing, billing.id)
                    .await?;
                if form.set_default_billing {
                    self.store.set_default_address(ctx.user, billing.id).await?;
                }
            }
        }

        tracing::info!(order_id = %order.id, %payment_option, "Checkout addresses resolved");
        Ok(payment_option)
    }

    /// Decide where one side's address comes from without writing anything.
    async fn plan(
        &self,
        ctx: RequestContext,
        address_type: AddressType,
        use_default: bool,
        set_default: bool,
        fields: AddressFields,
    ) -> Result<PlannedAddress, ShopError> {
        if use_default {
            return self
                .store
                .find_default_address(ctx.user, address_type)
                .await?
                .map(PlannedAddress::Stored)
                .ok_or(ShopError::DefaultAddressMissing(address_type));
        }

        let missing = fields.missing_fields();
        if !missing.is_empty() {
            return Err(ShopError::MissingAddressFields {
                address_type,
                fields: missing,
            });
        }
        Ok(PlannedAddress::New {
            address: NewAddress {
                user_id: ctx.user,
                fields,
                address_type,
            },
            set_default,
        })
    }

    /// Store a planned address if it is new and attach it to the order.
    async fn apply(
        &self,
        ctx: RequestContext,
        order_id: OrderId,
        planned: PlannedAddress,
    ) -> Result<Address, ShopError> {
        let address = match planned {
            PlannedAddress::Stored(address) => address,
            PlannedAddress::New {
                address,
                set_default,
            } => {
                let created = self.store.create_address(&address).await?;
                if set_default {
                    self.store.set_default_address(ctx.user, created.id).await?
                } else {
                    created
                }
            }
        };

        self.store
            .set_order_address(order_id, address.address_type, address.id)
            .await?;
        Ok(address)
    }
}

/// A validated address choice that has not been written yet.
#[derive(Debug)]
enum PlannedAddress {
    Stored(Address),
    New {
        address: NewAddress,
        set_default: bool,
    },
}
