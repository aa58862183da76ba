use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::cart::Cart;
use crate::validation::PHONE_REGEX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Stripe,
    Paypal,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PaymentMethod::Stripe => write!(f, "stripe"),
            PaymentMethod::Paypal => write!(f, "paypal"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(PaymentMethod::Stripe),
            "paypal" => Ok(PaymentMethod::Paypal),
            _ => Err(anyhow::anyhow!("Invalid payment method: {}", s)),
        }
    }
}

/// Where a checkout stands. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    #[default]
    Pending,
    Processing,
    PaymentRequired,
    Completed,
    Failed,
    Abandoned,
}

impl Display for CheckoutStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            CheckoutStatus::Pending => "pending",
            CheckoutStatus::Processing => "processing",
            CheckoutStatus::PaymentRequired => "payment_required",
            CheckoutStatus::Completed => "completed",
            CheckoutStatus::Failed => "failed",
            CheckoutStatus::Abandoned => "abandoned",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 50, message = "Last name must be 2-50 characters"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub phone: String,
    #[validate(length(min = 5, max = 100, message = "Address must be 5-100 characters"))]
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Address line 2 must be at most 100 characters"))]
    pub address_line2: Option<String>,
    #[validate(length(min = 2, max = 50, message = "City must be 2-50 characters"))]
    pub city: String,
    #[validate(length(min = 2, max = 50, message = "State must be 2-50 characters"))]
    pub state: String,
    #[validate(length(min = 3, max = 10, message = "Postal code must be 3-10 characters"))]
    pub postal_code: String,
    #[validate(length(equal = 2, message = "Country must be a 2-letter code"))]
    pub country: String,
}

/// One shopper's in-progress checkout, owned by the client that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub id: String,
    pub tenant_id: Uuid,
    pub cart: Cart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_shipping_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_payment_method: Option<PaymentMethod>,
    pub status: CheckoutStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, JsonValue>>,
}

/// A partial view of a checkout session, as threaded through plugin hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart: Option<Cart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_shipping_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CheckoutStatus>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, JsonValue>,
}

impl CheckoutData {
    /// Cart total if a cart is present.
    pub fn total(&self) -> Option<rust_decimal::Decimal> {
        self.cart.as_ref().map(|c| c.total)
    }

    pub fn email(&self) -> Option<&str> {
        self.shipping_address.as_ref().map(|a| a.email.as_str())
    }
}

impl From<&CheckoutSession> for CheckoutData {
    fn from(session: &CheckoutSession) -> Self {
        Self {
            cart: Some(session.cart.clone()),
            shipping_address: session.shipping_address.clone(),
            selected_shipping_method: session.selected_shipping_method.clone(),
            selected_payment_method: session.selected_payment_method,
            status: Some(session.status),
            metadata: session.metadata.clone().unwrap_or_default(),
        }
    }
}
