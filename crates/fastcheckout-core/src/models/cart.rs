use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use validator::Validate;

use crate::pricing::calculate_cart_totals;
use crate::validation::validate_positive_amount;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive_amount", message = "Price must be positive"))]
    pub price: Decimal,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, JsonValue>>,
}

/// Ordered line items plus the totals computed from them, in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[validate(length(min = 1, message = "Cart must contain at least one item"), nested)]
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
}

impl Cart {
    pub fn empty(currency: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            shipping: Decimal::ZERO,
            total: Decimal::ZERO,
            currency: currency.into(),
        }
    }

    /// Builds a cart and fills in subtotal, tax, shipping and total.
    /// `None` if the totals overflow.
    pub fn with_items(
        items: Vec<CartItem>,
        currency: impl Into<String>,
        tax_rate: Decimal,
        shipping: Decimal,
    ) -> Option<Self> {
        let totals = calculate_cart_totals(&items, tax_rate, shipping)?;
        Some(Self {
            items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total: totals.total,
            currency: currency.into(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
