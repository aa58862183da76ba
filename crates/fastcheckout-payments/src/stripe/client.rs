use fastcheckout_core::pricing::to_minor_units;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

use crate::error::{PaymentError, Provider};

pub const TENANT_METADATA_KEY: &str = "tenantId";

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePaymentIntent {
    /// Major units, e.g. `47.70`.
    pub amount: Decimal,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Minor units.
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentIntent {
    pub fn session_id(&self) -> &str {
        self.metadata
            .get("sessionId")
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

/// Stripe client bound to one secret key.
#[derive(Clone, Debug)]
pub struct StripeClient {
    http: Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(http: Client, base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    /// Form fields for `POST /v1/payment_intents`.
    fn form(params: &CreatePaymentIntent) -> Result<Vec<(String, String)>, PaymentError> {
        let amount = to_minor_units(params.amount)
            .filter(|minor| *minor > 0)
            .ok_or(PaymentError::InvalidAmount(params.amount))?;

        let mut form = vec![
            ("amount".to_string(), amount.to_string()),
            ("currency".to_string(), params.currency.to_lowercase()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        form.extend(
            params
                .metadata
                .iter()
                .map(|(key, value)| (format!("metadata[{}]", key), value.clone())),
        );
        Ok(form)
    }

    pub async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, PaymentError> {
        let form = Self::form(params)?;

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(PaymentError::http(Provider::Stripe))?;

        let status = response.status();
        if !status.is_success() {
            let body: JsonValue = response.json().await.unwrap_or(JsonValue::Null);
            let message = body
                .pointer("/error/message")
                .and_then(JsonValue::as_str)
                .unwrap_or("Stripe request failed")
                .to_string();
            tracing::warn!(status = status.as_u16(), error = %message, "Stripe rejected payment intent");
            return Err(PaymentError::Api {
                provider: Provider::Stripe,
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| PaymentError::InvalidResponse {
                provider: Provider::Stripe,
                message: e.to_string(),
            })
    }
}

/// Flattens caller metadata into Stripe's string-only metadata map.
pub fn metadata_to_strings(metadata: &HashMap<String, JsonValue>) -> BTreeMap<String, String> {
    metadata
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let value = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
