//! Stripe webhook verification and event parsing.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>[,v1=<hex>]`.
//! A signature is the hex HMAC-SHA256 of `"{t}.{raw body}"` keyed with the
//! endpoint secret; any `v1` entry may match.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::Duration;
use subtle::ConstantTimeEq;

use super::client::{PaymentIntent, TENANT_METADATA_KEY};
use crate::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Splits a signature header into its timestamp and `v1` signatures.
pub fn parse_signature_header(header: &str) -> Result<(i64, Vec<String>), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) if !value.is_empty() => signatures.push(value.to_string()),
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok((timestamp, signatures)),
        _ => Err(PaymentError::Signature(
            "Invalid signature header format".to_string(),
        )),
    }
}

pub fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::Signature("Invalid webhook secret".to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance: Duration,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance,
        }
    }

    /// Verifies the signature against the current clock and parses the event.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<StripeEvent, PaymentError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<StripeEvent, PaymentError> {
        let (timestamp, signatures) = parse_signature_header(header)?;

        if now.abs_diff(timestamp) > self.tolerance.as_secs() {
            return Err(PaymentError::Signature(
                "Timestamp outside the tolerance zone".to_string(),
            ));
        }

        let expected = compute_signature(&self.secret, timestamp, payload)?;
        let matched = signatures
            .iter()
            .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));
        if !matched {
            return Err(PaymentError::Signature(
                "No signatures found matching the expected signature for payload".to_string(),
            ));
        }

        serde_json::from_slice(payload).map_err(|e| PaymentError::Payload(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripeEventKind {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    ChargeRefunded,
    Other(String),
}

impl StripeEventKind {
    fn from_type(event_type: &str) -> Self {
        match event_type {
            "payment_intent.succeeded" => StripeEventKind::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => StripeEventKind::PaymentIntentFailed,
            "charge.refunded" => StripeEventKind::ChargeRefunded,
            other => StripeEventKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: JsonValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub amount_refunded: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeEvent {
    pub fn kind(&self) -> StripeEventKind {
        StripeEventKind::from_type(&self.event_type)
    }

    /// Tenant tag attached to the object when it was created.
    pub fn tenant_id(&self) -> Option<&str> {
        self.data
            .object
            .get("metadata")
            .and_then(|metadata| metadata.get(TENANT_METADATA_KEY))
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn payment_intent(&self) -> Result<PaymentIntent, PaymentError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| PaymentError::Payload(e.to_string()))
    }

    pub fn charge(&self) -> Result<Charge, PaymentError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| PaymentError::Payload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_700_000_000;

    fn payload() -> Vec<u8> {
        json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_1",
                "amount": 4770,
                "currency": "eur",
                "metadata": { "tenantId": "0b6f1c9e-3a52-4c1e-9a43-2f1d5e7c8b90", "sessionId": "s1" }
            }}
        })
        .to_string()
        .into_bytes()
    }

    fn header_for(payload: &[u8], timestamp: i64) -> String {
        format!(
            "t={},v1={}",
            timestamp,
            compute_signature(SECRET, timestamp, payload).unwrap()
        )
    }

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SECRET, Duration::from_secs(300))
    }

    #[test]
    fn test_parse_signature_header() {
        let (timestamp, signatures) = parse_signature_header("t=1609459200,v1=abc,v0=old,v1=def").unwrap();
        assert_eq!(timestamp, 1_609_459_200);
        assert_eq!(signatures, vec!["abc", "def"]);
    }

    #[test]
    fn test_parse_signature_header_invalid() {
        assert!(parse_signature_header("invalid").is_err());
        assert!(parse_signature_header("t=123").is_err());
        assert!(parse_signature_header("v1=abc").is_err());
    }

    #[test]
    fn test_valid_signature_yields_event() {
        let body = payload();
        let event = verifier().verify_at(&body, &header_for(&body, NOW), NOW + 10).unwrap();
        assert_eq!(event.kind(), StripeEventKind::PaymentIntentSucceeded);
        assert_eq!(event.tenant_id(), Some("0b6f1c9e-3a52-4c1e-9a43-2f1d5e7c8b90"));
        let intent = event.payment_intent().unwrap();
        assert_eq!(intent.amount, 4770);
        assert_eq!(intent.session_id(), "s1");
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let body = payload();
        let header = header_for(&body, NOW);
        let mut tampered = body.clone();
        tampered.extend_from_slice(b" ");
        assert!(matches!(
            verifier().verify_at(&tampered, &header, NOW),
            Err(PaymentError::Signature(_))
        ));
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let body = payload();
        let header = header_for(&body, NOW);
        assert!(verifier().verify_at(&body, &header, NOW + 301).is_err());
        assert!(verifier().verify_at(&body, &header, NOW - 301).is_err());
    }

    #[test]
    fn test_any_v1_signature_may_match() {
        let body = payload();
        let header = format!(
            "t={},v1=deadbeef,v1={}",
            NOW,
            compute_signature(SECRET, NOW, &body).unwrap()
        );
        assert!(verifier().verify_at(&body, &header, NOW).is_ok());
    }

    #[test]
    fn test_missing_tenant_tag() {
        let body = json!({
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_1", "amount_refunded": 500, "metadata": {} } }
        })
        .to_string();
        let event = verifier()
            .verify_at(body.as_bytes(), &header_for(body.as_bytes(), NOW), NOW)
            .unwrap();
        assert_eq!(event.kind(), StripeEventKind::ChargeRefunded);
        assert!(event.tenant_id().is_none());
        assert_eq!(event.charge().unwrap().amount_refunded, 500);
    }

    #[test]
    fn test_unknown_event_kind() {
        assert_eq!(
            StripeEventKind::from_type("customer.created"),
            StripeEventKind::Other("customer.created".to_string())
        );
    }
}
