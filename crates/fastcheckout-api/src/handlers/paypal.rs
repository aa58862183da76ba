use super::{
    payment_context, payment_metadata, record_metric_best_effort, run_post_payment_plugins,
    run_pre_payment_plugins, send_webhook_best_effort,
};
use crate::constants::UNKNOWN_SESSION_ID;
use crate::error::{HttpAppError, JsonBody};
use crate::middleware::TenantId;
use crate::state::AppState;
use axum::{extract::State, Json};
use fastcheckout_core::models::{MetricsEventKind, PaymentMethod, WebhookEvent, WebhookEventType};
use fastcheckout_core::validation::{validate_currency_code, validate_positive_amount};
use fastcheckout_core::{ApiResponse, AppError};
use fastcheckout_payments::{CreatePayPalOrder, PayPalClient};
use fastcheckout_plugins::PluginContext;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayPalOrderRequest {
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(custom(function = "validate_currency_code"))]
    pub currency: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CapturePayPalOrderRequest {
    #[validate(length(min = 1, message = "orderId is required"))]
    pub order_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPalOrderCreated {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPalOrderCaptured {
    pub capture_id: Option<String>,
    pub status: String,
}

/// Metadata key a `before_payment` hook sets to describe the PayPal purchase.
pub const DESCRIPTION_METADATA_KEY: &str = "description";

fn order_description(context: &PluginContext) -> Option<String> {
    context
        .checkout_data
        .metadata
        .get(DESCRIPTION_METADATA_KEY)
        .and_then(JsonValue::as_str)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn session_or_unknown(session_id: Option<&str>) -> &str {
    session_id
        .filter(|id| !id.is_empty())
        .unwrap_or(UNKNOWN_SESSION_ID)
}

async fn paypal_client(
    state: &AppState,
    tenant_id: &uuid::Uuid,
) -> Result<(PayPalClient, String), HttpAppError> {
    let tenant = state
        .core_api
        .get_tenant(tenant_id)
        .await
        .map_err(|e| AppError::PayPal(e.to_string()))?;

    let paypal_config = tenant.paypal().ok_or(AppError::PayPalNotEnabled)?;
    let client = PayPalClient::new(
        state.http.clone(),
        paypal_config,
        state.config.paypal_api_base.as_deref(),
    );
    Ok((client, tenant.name.clone()))
}

/// POST /api/paypal/create-order
#[tracing::instrument(skip(state, request), fields(operation = "create_paypal_order"))]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    JsonBody(request): JsonBody<CreatePayPalOrderRequest>,
) -> Result<Json<ApiResponse<PayPalOrderCreated>>, HttpAppError> {
    let (client, brand_name) = paypal_client(&state, &tenant_id).await?;

    request.validate()?;
    let session_id = session_or_unknown(request.session_id.as_deref());

    let context = payment_context(
        tenant_id,
        session_id,
        PaymentMethod::Paypal,
        request.metadata.clone(),
    );
    let context = run_pre_payment_plugins(&state.plugins, context).await?;

    let order = client
        .create_order(&CreatePayPalOrder {
            amount: request.amount,
            currency: request.currency.clone(),
            custom_id: format!("{}:{}", tenant_id, session_id),
            brand_name,
            description: order_description(&context),
        })
        .await
        .map_err(|e| AppError::PayPal(e.to_string()))?;

    tracing::info!(
        tenant_id = %tenant_id,
        session_id = %session_id,
        order_id = %order.id,
        "PayPal order created"
    );

    record_metric_best_effort(
        &state.core_api,
        tenant_id,
        session_id,
        MetricsEventKind::Started,
        payment_metadata(PaymentMethod::Paypal, []),
    )
    .await;

    Ok(Json(ApiResponse::ok(PayPalOrderCreated { order_id: order.id })))
}

/// POST /api/paypal/capture-order
#[tracing::instrument(skip(state, request), fields(operation = "capture_paypal_order"))]
pub async fn capture_order(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    JsonBody(request): JsonBody<CapturePayPalOrderRequest>,
) -> Result<Json<ApiResponse<PayPalOrderCaptured>>, HttpAppError> {
    let (client, _) = paypal_client(&state, &tenant_id).await?;

    request.validate()?;
    let session_id = session_or_unknown(request.session_id.as_deref());
    let mut metadata = request.metadata.clone();
    metadata.insert("orderId".to_string(), json!(request.order_id));
    let mut context = payment_context(tenant_id, session_id, PaymentMethod::Paypal, metadata);

    let capture = match client.capture_order(&request.order_id).await {
        Ok(capture) => capture,
        Err(e) => {
            record_metric_best_effort(
                &state.core_api,
                tenant_id,
                session_id,
                MetricsEventKind::PaymentFailed,
                payment_metadata(PaymentMethod::Paypal, [("error", json!(e.to_string()))]),
            )
            .await;
            run_post_payment_plugins(&state.plugins, &context, false).await;
            return Err(AppError::PayPal(e.to_string()).into());
        }
    };

    let amount = capture.amount.unwrap_or(Decimal::ZERO);
    let outcome = &mut context.checkout_data.metadata;
    outcome.insert("captureId".to_string(), json!(capture.capture_id));
    outcome.insert("amount".to_string(), json!(amount));
    outcome.insert("currency".to_string(), json!(capture.currency));

    send_webhook_best_effort(
        &state.core_api,
        WebhookEvent::new(
            WebhookEventType::PaymentSucceeded,
            tenant_id,
            json!({
                "paymentId": capture.order_id,
                "captureId": capture.capture_id,
                "amount": amount,
                "currency": capture.currency,
                "sessionId": session_id,
            }),
        ),
    )
    .await;

    record_metric_best_effort(
        &state.core_api,
        tenant_id,
        session_id,
        MetricsEventKind::Completed,
        payment_metadata(PaymentMethod::Paypal, [("amount", json!(amount))]),
    )
    .await;

    run_post_payment_plugins(&state.plugins, &context, true).await;

    tracing::info!(
        tenant_id = %tenant_id,
        order_id = %capture.order_id,
        status = %capture.status,
        "PayPal order captured"
    );

    Ok(Json(ApiResponse::ok(PayPalOrderCaptured {
        capture_id: capture.capture_id,
        status: capture.status,
    })))
}
