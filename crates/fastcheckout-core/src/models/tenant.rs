use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

use super::checkout::PaymentMethod;

/// Tenant configuration as served by the Core API.
///
/// Fetched fresh for every payment request; nothing here is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_color: Option<String>,
    #[serde(default)]
    pub enabled_payment_methods: Vec<PaymentMethod>,
    pub currency: String,
    pub tax_rate: Decimal,
    #[serde(default)]
    pub shipping_config: ShippingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_config: Option<StripeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paypal_config: Option<PayPalConfig>,
}

impl Tenant {
    /// Stripe credentials, only when Stripe is switched on for this tenant.
    pub fn stripe(&self) -> Option<&StripeConfig> {
        self.stripe_config.as_ref().filter(|c| c.enabled)
    }

    /// PayPal credentials, only when PayPal is switched on for this tenant.
    pub fn paypal(&self) -> Option<&PayPalConfig> {
        self.paypal_config.as_ref().filter(|c| c.enabled)
    }

    pub fn shipping_method(&self, id: &str) -> Option<&ShippingMethod> {
        self.shipping_config.methods.iter().find(|m| m.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingConfig {
    #[serde(default)]
    pub methods: Vec<ShippingMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_shipping_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub estimated_days: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeConfig {
    pub public_key: String,
    pub secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayPalMode {
    Sandbox,
    Live,
}

impl Display for PayPalMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PayPalMode::Sandbox => write!(f, "sandbox"),
            PayPalMode::Live => write!(f, "live"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub mode: PayPalMode,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tenant_json() -> serde_json::Value {
        json!({
            "id": "0b6f1c9e-3a52-4c1e-9a43-2f1d5e7c8b90",
            "name": "Tenant Shop",
            "enabledPaymentMethods": ["stripe", "paypal"],
            "currency": "EUR",
            "taxRate": 0.22,
            "shippingConfig": {
                "methods": [{ "id": "std", "name": "Standard", "price": 5.0, "estimatedDays": "3-5" }],
                "freeShippingThreshold": 50
            },
            "stripeConfig": { "publicKey": "pk", "secretKey": "sk", "enabled": false },
            "paypalConfig": { "clientId": "cid", "clientSecret": "cs", "mode": "sandbox", "enabled": true }
        })
    }

    #[test]
    fn test_deserialize_core_api_tenant() {
        let tenant: Tenant = serde_json::from_value(tenant_json()).unwrap();
        assert_eq!(tenant.name, "Tenant Shop");
        assert_eq!(tenant.tax_rate, Decimal::new(22, 2));
        assert_eq!(tenant.enabled_payment_methods.len(), 2);
        assert_eq!(tenant.shipping_method("std").unwrap().estimated_days, "3-5");
        assert!(tenant.shipping_method("express").is_none());
    }

    #[test]
    fn test_disabled_processor_is_hidden() {
        let tenant: Tenant = serde_json::from_value(tenant_json()).unwrap();
        assert!(tenant.stripe().is_none());
        assert_eq!(tenant.paypal().unwrap().mode, PayPalMode::Sandbox);
    }
}
