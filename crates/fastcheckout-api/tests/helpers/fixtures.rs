//! JSON fixtures shaped like the Core API and processor payloads.

use super::TENANT_ID;
use serde_json::{json, Value};

pub fn tenant(stripe_enabled: bool, paypal_enabled: bool) -> Value {
    json!({
        "id": TENANT_ID,
        "name": "Acme Outdoor",
        "enabledPaymentMethods": ["stripe", "paypal"],
        "currency": "EUR",
        "taxRate": 0.22,
        "shippingConfig": { "methods": [] },
        "stripeConfig": {
            "publicKey": "pk_test_acme",
            "secretKey": "sk_test_acme",
            "enabled": stripe_enabled
        },
        "paypalConfig": {
            "clientId": "acme-client",
            "clientSecret": "acme-secret",
            "mode": "sandbox",
            "enabled": paypal_enabled
        }
    })
}

pub fn payment_intent_event(event_type: &str, metadata: Value) -> Value {
    json!({
        "id": "evt_test_1",
        "type": event_type,
        "data": { "object": {
            "id": "pi_test_1",
            "amount": 4770,
            "currency": "eur",
            "metadata": metadata,
            "last_payment_error": { "code": "card_declined", "message": "Your card was declined." }
        }}
    })
}

pub fn charge_refunded_event() -> Value {
    json!({
        "id": "evt_test_2",
        "type": "charge.refunded",
        "data": { "object": {
            "id": "ch_test_1",
            "amount_refunded": 1250,
            "currency": "eur",
            "metadata": { "tenantId": TENANT_ID }
        }}
    })
}

pub fn paypal_capture() -> Value {
    json!({
        "id": "ORDER-1",
        "status": "COMPLETED",
        "purchase_units": [{
            "payments": { "captures": [{
                "id": "CAPTURE-1",
                "amount": { "value": "47.70", "currency_code": "EUR" }
            }]}
        }]
    })
}
