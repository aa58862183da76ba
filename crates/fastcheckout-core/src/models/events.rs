use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Webhook event types forwarded to the Core API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "checkout.completed")]
    CheckoutCompleted,
    #[serde(rename = "payment.succeeded")]
    PaymentSucceeded,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.updated")]
    OrderUpdated,
}

impl Display for WebhookEventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WebhookEventType::CheckoutCompleted => write!(f, "checkout.completed"),
            WebhookEventType::PaymentSucceeded => write!(f, "payment.succeeded"),
            WebhookEventType::PaymentFailed => write!(f, "payment.failed"),
            WebhookEventType::OrderCreated => write!(f, "order.created"),
            WebhookEventType::OrderUpdated => write!(f, "order.updated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: WebhookEventType,
    pub tenant_id: Uuid,
    pub data: JsonValue,
    pub timestamp: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn new(event_type: WebhookEventType, tenant_id: Uuid, data: JsonValue) -> Self {
        Self {
            event_type,
            tenant_id,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Funnel events recorded through the Core API metrics endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsEventKind {
    Started,
    Completed,
    Abandoned,
    PaymentFailed,
}

impl Display for MetricsEventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MetricsEventKind::Started => write!(f, "started"),
            MetricsEventKind::Completed => write!(f, "completed"),
            MetricsEventKind::Abandoned => write!(f, "abandoned"),
            MetricsEventKind::PaymentFailed => write!(f, "payment_failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetricsEvent {
    pub session_id: String,
    pub event: MetricsEventKind,
    /// Milliseconds spent in checkout so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, JsonValue>>,
}

impl CheckoutMetricsEvent {
    pub fn new(session_id: impl Into<String>, event: MetricsEventKind) -> Self {
        Self {
            session_id: session_id.into(),
            event,
            duration: None,
            step: None,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, JsonValue>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Aggregated funnel metrics returned by the Core API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutAnalytics {
    pub total_sessions: u64,
    pub completed_checkouts: u64,
    pub conversion_rate: f64,
    /// Milliseconds
    pub average_completion_time: f64,
    pub abandonment_rate: f64,
    pub revenue_by_payment_method: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_event_wire_shape() {
        let tenant = Uuid::new_v4();
        let event = WebhookEvent::new(
            WebhookEventType::PaymentSucceeded,
            tenant,
            json!({ "paymentIntentId": "pi_1" }),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "payment.succeeded");
        assert_eq!(value["tenantId"], tenant.to_string());
        assert_eq!(value["data"]["paymentIntentId"], "pi_1");
    }

    #[test]
    fn test_metrics_event_omits_empty_fields() {
        let value =
            serde_json::to_value(CheckoutMetricsEvent::new("s-1", MetricsEventKind::PaymentFailed))
                .unwrap();
        assert_eq!(value, json!({ "sessionId": "s-1", "event": "payment_failed" }));
    }

    #[test]
    fn test_cart_validation_defaults_missing_errors() {
        let parsed: CartValidation = serde_json::from_value(json!({ "valid": true })).unwrap();
        assert!(parsed.valid);
        assert!(parsed.errors.is_empty());
    }
}
