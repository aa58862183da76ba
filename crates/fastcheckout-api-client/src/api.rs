//! Core API endpoints.
//!
//! Request and response bodies use the shared models from
//! `fastcheckout_core::models`; the few shapes only this client needs are
//! defined here.

use crate::CoreApiClient;
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use fastcheckout_core::models::{
    CheckoutAnalytics, CheckoutMetricsEvent, NewOrder, Order, OrderStatus, Tenant, WebhookEvent,
};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRef {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedCartItem {
    pub product_id: String,
    pub current_price: Decimal,
    pub available: bool,
}

/// Answer of the cart validation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub updated_items: Vec<UpdatedCartItem>,
}

fn iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl CoreApiClient {
    pub async fn get_tenant(&self, tenant_id: &Uuid) -> Result<Tenant> {
        self.get(&format!("/tenants/{}", tenant_id), &[]).await
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Order> {
        tracing::info!(
            tenant_id = %order.tenant_id,
            order_number = %order.order_number,
            "Creating order in LinkBay"
        );
        self.send_json(Method::POST, "/orders", order).await
    }

    pub async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        self.send_json(
            Method::PATCH,
            &format!("/orders/{}/status", order_id),
            &json!({ "status": status }),
        )
        .await
    }

    pub async fn send_webhook_event(&self, event: &WebhookEvent) -> Result<()> {
        tracing::debug!(
            tenant_id = %event.tenant_id,
            event_type = %event.event_type,
            "Sending webhook event to LinkBay"
        );
        let _: JsonValue = self
            .send_json(Method::POST, "/webhooks/events", event)
            .await?;
        Ok(())
    }

    pub async fn get_product(&self, tenant_id: &Uuid, product_id: &str) -> Result<Product> {
        self.get(
            &format!("/tenants/{}/products/{}", tenant_id, product_id),
            &[],
        )
        .await
    }

    pub async fn validate_cart(
        &self,
        tenant_id: &Uuid,
        items: &[CartItemRef],
    ) -> Result<CartValidationResult> {
        self.send_json(
            Method::POST,
            &format!("/tenants/{}/cart/validate", tenant_id),
            &json!({ "items": items }),
        )
        .await
    }

    pub async fn record_metrics(&self, tenant_id: &Uuid, event: &CheckoutMetricsEvent) -> Result<()> {
        let _: JsonValue = self
            .send_json(Method::POST, &format!("/tenants/{}/metrics", tenant_id), event)
            .await?;
        Ok(())
    }

    pub async fn get_checkout_analytics(
        &self,
        tenant_id: &Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<CheckoutAnalytics> {
        self.get(
            &format!("/tenants/{}/analytics/checkout", tenant_id),
            &[
                ("startDate", iso8601(&start_date)),
                ("endDate", iso8601(&end_date)),
            ],
        )
        .await
    }
}
