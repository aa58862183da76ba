//! Stripe handlers: payment intent creation and webhook receipt.

use super::{
    payment_context, payment_metadata, record_metric_best_effort, run_post_payment_plugins,
    run_pre_payment_plugins, send_webhook_best_effort,
};
use crate::constants::UNKNOWN_SESSION_ID;
use crate::error::{HttpAppError, JsonBody};
use crate::middleware::TenantId;
use crate::state::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use fastcheckout_core::models::{
    MetricsEventKind, PaymentMethod, WebhookEvent, WebhookEventType,
};
use fastcheckout_core::pricing::from_minor_units;
use fastcheckout_core::validation::{parse_tenant_id, validate_currency_code, validate_positive_amount};
use fastcheckout_core::{ApiResponse, AppError};
use fastcheckout_payments::stripe::{
    metadata_to_strings, CreatePaymentIntent, PaymentIntent, StripeClient, StripeEvent,
    StripeEventKind, WebhookVerifier, TENANT_METADATA_KEY,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(custom(function = "validate_currency_code"))]
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl CreatePaymentIntentRequest {
    fn session_id(&self) -> &str {
        self.metadata
            .get("sessionId")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_SESSION_ID)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentCreated {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookReceived {
    pub received: bool,
}

/// POST /api/stripe/payment-intent
#[tracing::instrument(skip(state, request), fields(operation = "create_payment_intent"))]
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    JsonBody(request): JsonBody<CreatePaymentIntentRequest>,
) -> Result<Json<ApiResponse<PaymentIntentCreated>>, HttpAppError> {
    let tenant = state
        .core_api
        .get_tenant(&tenant_id)
        .await
        .map_err(|e| AppError::PaymentIntentFailed(e.to_string()))?;

    let stripe_config = tenant.stripe().ok_or(AppError::StripeNotEnabled)?;

    request.validate()?;
    let session_id = request.session_id().to_string();

    let context = payment_context(
        tenant_id,
        &session_id,
        PaymentMethod::Stripe,
        request.metadata.clone(),
    );
    let context = run_pre_payment_plugins(&state.plugins, context).await?;

    let mut metadata = metadata_to_strings(&context.checkout_data.metadata);
    metadata.insert(TENANT_METADATA_KEY.to_string(), tenant_id.to_string());

    let client = StripeClient::new(
        state.http.clone(),
        state.config.stripe_api_base.clone(),
        stripe_config.secret_key.clone(),
    );
    let intent = client
        .create_payment_intent(&CreatePaymentIntent {
            amount: request.amount,
            currency: request.currency.clone(),
            metadata,
        })
        .await
        .map_err(|e| AppError::Stripe(e.to_string()))?;

    tracing::info!(
        tenant_id = %tenant_id,
        session_id = %session_id,
        payment_intent_id = %intent.id,
        "Payment intent created"
    );

    record_metric_best_effort(
        &state.core_api,
        tenant_id,
        &session_id,
        MetricsEventKind::Started,
        payment_metadata(PaymentMethod::Stripe, []),
    )
    .await;

    Ok(Json(ApiResponse::ok(PaymentIntentCreated {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
    })))
}

/// POST /api/stripe/webhook
///
/// Not tenant-scoped: the tenant comes from the metadata attached when the
/// intent was created.
#[tracing::instrument(skip_all, fields(operation = "stripe_webhook"))]
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<WebhookReceived>>, HttpAppError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingSignature)?;

    let secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or(AppError::WebhookNotConfigured)?;

    let verifier = WebhookVerifier::new(
        secret,
        Duration::from_secs(state.config.stripe_webhook_tolerance_secs),
    );
    let event = verifier
        .verify(&body, signature)
        .map_err(|e| AppError::Webhook(e.to_string()))?;

    let tenant_id = event
        .tenant_id()
        .ok_or(AppError::WebhookMissingTenantId)?;
    let tenant_id = parse_tenant_id(tenant_id).ok_or_else(|| {
        AppError::Webhook(format!("Invalid tenantId in event metadata: {}", tenant_id))
    })?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        tenant_id = %tenant_id,
        "Stripe webhook received"
    );

    handle_event(&state, tenant_id, &event).await?;

    Ok(Json(ApiResponse::ok(WebhookReceived { received: true })))
}

async fn handle_event(
    state: &AppState,
    tenant_id: Uuid,
    event: &StripeEvent,
) -> Result<(), HttpAppError> {
    let webhook_error = |e: fastcheckout_payments::PaymentError| AppError::Webhook(e.to_string());

    match event.kind() {
        StripeEventKind::PaymentIntentSucceeded => {
            let intent = event.payment_intent().map_err(webhook_error)?;
            let amount = from_minor_units(intent.amount);

            send_webhook_best_effort(
                &state.core_api,
                WebhookEvent::new(
                    WebhookEventType::PaymentSucceeded,
                    tenant_id,
                    json!({
                        "paymentIntentId": intent.id,
                        "amount": amount,
                        "currency": intent.currency,
                        "metadata": intent.metadata,
                    }),
                ),
            )
            .await;

            record_metric_best_effort(
                &state.core_api,
                tenant_id,
                intent.session_id(),
                MetricsEventKind::Completed,
                payment_metadata(PaymentMethod::Stripe, [("amount", json!(amount))]),
            )
            .await;

            run_post_payment_plugins(&state.plugins, &intent_context(tenant_id, &intent), true)
                .await;
        }
        StripeEventKind::PaymentIntentFailed => {
            let intent = event.payment_intent().map_err(webhook_error)?;
            let last_error = intent.last_payment_error.as_ref();

            send_webhook_best_effort(
                &state.core_api,
                WebhookEvent::new(
                    WebhookEventType::PaymentFailed,
                    tenant_id,
                    json!({
                        "paymentIntentId": intent.id,
                        "error": last_error.and_then(|e| e.message.as_deref()),
                        "metadata": intent.metadata,
                    }),
                ),
            )
            .await;

            record_metric_best_effort(
                &state.core_api,
                tenant_id,
                intent.session_id(),
                MetricsEventKind::PaymentFailed,
                payment_metadata(
                    PaymentMethod::Stripe,
                    [("error", json!(last_error.and_then(|e| e.code.as_deref())))],
                ),
            )
            .await;

            run_post_payment_plugins(&state.plugins, &intent_context(tenant_id, &intent), false)
                .await;
        }
        StripeEventKind::ChargeRefunded => {
            let charge = event.charge().map_err(webhook_error)?;

            send_webhook_best_effort(
                &state.core_api,
                WebhookEvent::new(
                    WebhookEventType::OrderUpdated,
                    tenant_id,
                    json!({
                        "chargeId": charge.id,
                        "status": "refunded",
                        "amount": from_minor_units(charge.amount_refunded),
                    }),
                ),
            )
            .await;
        }
        StripeEventKind::Other(event_type) => {
            tracing::info!(event_type = %event_type, "Unhandled Stripe event type");
        }
    }

    Ok(())
}

fn intent_context(tenant_id: Uuid, intent: &PaymentIntent) -> fastcheckout_plugins::PluginContext {
    let metadata = intent
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), JsonValue::String(value.clone())))
        .collect();
    payment_context(tenant_id, intent.session_id(), PaymentMethod::Stripe, metadata)
}
