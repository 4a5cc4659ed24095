//! Stripe REST client.
//!
//! Only the two payment-intent calls the checkout needs are implemented.
//! Stripe errors are mapped onto [`PaymentErrorKind`] by [`classify`].

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use boutique_core::CurrencyCode;

use super::{ChargeConfirmation, PaymentError, PaymentErrorKind, PaymentGateway, PaymentIntent};
use crate::config::StripeConfig;

/// Stripe intent status meaning the money was captured.
const STATUS_SUCCEEDED: &str = "succeeded";

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: Url,
}

/// Subset of Stripe's `PaymentIntent` object we read.
#[derive(Debug, Deserialize)]
struct IntentBody {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    status: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    latest_charge: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `PaymentErrorKind::AuthenticationFailure` if the key cannot be
    /// used as a header, or `Unknown` if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value).map_err(|e| {
            PaymentError::new(
                PaymentErrorKind::AuthenticationFailure,
                format!("invalid API key format: {e}"),
            )
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PaymentError::new(PaymentErrorKind::Unknown, e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PaymentError> {
        self.api_base
            .join(path)
            .map_err(|e| PaymentError::new(PaymentErrorKind::InvalidRequest, e.to_string()))
    }

    async fn read_intent(response: reqwest::Response) -> Result<IntentBody, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }
        response
            .json::<IntentBody>()
            .await
            .map_err(|e| PaymentError::new(PaymentErrorKind::Unknown, e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self))]
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: CurrencyCode,
    ) -> Result<PaymentIntent, PaymentError> {
        let url = self.endpoint("v1/payment_intents")?;
        let amount = amount_minor.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency.as_lowercase()),
            ("metadata[integration_check]", "accept_a_payment"),
        ];

        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;
        let intent = Self::read_intent(response).await?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::new(PaymentErrorKind::Unknown, "intent has no client secret")
        })?;
        tracing::info!(intent_id = %intent.id, "Created payment intent");

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
        })
    }

    #[instrument(skip(self))]
    async fn confirm_payment(
        &self,
        intent_id: &str,
        amount_minor: i64,
        currency: CurrencyCode,
    ) -> Result<ChargeConfirmation, PaymentError> {
        if intent_id.is_empty()
            || !intent_id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            return Err(PaymentError::new(
                PaymentErrorKind::InvalidRequest,
                "Invalid payment reference.",
            ));
        }

        let url = self.endpoint(&format!("v1/payment_intents/{intent_id}"))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        let intent = Self::read_intent(response).await?;

        check_intent(intent, amount_minor, currency)
    }
}

/// Verify a retrieved intent paid exactly what the order owes.
fn check_intent(
    intent: IntentBody,
    amount_minor: i64,
    currency: CurrencyCode,
) -> Result<ChargeConfirmation, PaymentError> {
    if intent.status != STATUS_SUCCEEDED {
        return Err(PaymentError::new(
            PaymentErrorKind::Declined,
            "Your payment has not been completed.",
        ));
    }
    if intent.amount != amount_minor || intent.currency != currency.as_lowercase() {
        tracing::warn!(
            intent_id = %intent.id,
            intent_amount = intent.amount,
            intent_currency = %intent.currency,
            amount_minor,
            "Payment intent does not match order total"
        );
        return Err(PaymentError::new(
            PaymentErrorKind::InvalidRequest,
            "The payment does not match your order total.",
        ));
    }

    Ok(ChargeConfirmation {
        charge_id: intent.latest_charge.unwrap_or(intent.id),
    })
}

/// Map a failed Stripe response onto a payment error kind.
fn classify(status: StatusCode, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_default();

    let kind = match status {
        StatusCode::TOO_MANY_REQUESTS => PaymentErrorKind::RateLimited,
        StatusCode::UNAUTHORIZED => PaymentErrorKind::AuthenticationFailure,
        _ => match parsed.as_ref().and_then(|e| e.error.kind.as_deref()) {
            Some("card_error") => PaymentErrorKind::Declined,
            Some("invalid_request_error") => PaymentErrorKind::InvalidRequest,
            Some(_) => PaymentErrorKind::ProcessorError,
            None => PaymentErrorKind::Unknown,
        },
    };

    PaymentError::new(kind, message)
}

fn transport_error(e: reqwest::Error) -> PaymentError {
    let kind = if e.is_connect() || e.is_timeout() || e.is_request() {
        PaymentErrorKind::ConnectionFailure
    } else {
        PaymentErrorKind::Unknown
    };
    PaymentError::new(kind, e.to_string())
}
