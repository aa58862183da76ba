pub mod analytics;
pub mod csrf;
pub mod fallback;
pub mod health;
pub mod paypal;
pub mod plugins;
pub mod stripe;

use crate::error::HttpAppError;
use fastcheckout_api_client::CoreApiClient;
use fastcheckout_core::models::{
    CheckoutData, CheckoutMetricsEvent, MetricsEventKind, PaymentMethod, WebhookEvent,
};
use fastcheckout_core::AppError;
use fastcheckout_plugins::{PluginContext, PluginManager};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use uuid::Uuid;

/// Context handed to plugins around a payment.
pub(crate) fn payment_context(
    tenant_id: Uuid,
    session_id: &str,
    method: PaymentMethod,
    metadata: HashMap<String, JsonValue>,
) -> PluginContext {
    PluginContext::new(tenant_id, session_id).with_checkout_data(CheckoutData {
        selected_payment_method: Some(method),
        metadata,
        ..CheckoutData::default()
    })
}

/// Runs `on_validation` then `before_payment`. A failed validation stops the
/// payment with the collected errors; otherwise the context returned by the
/// last `before_payment` hook is what the processor call should use.
pub(crate) async fn run_pre_payment_plugins(
    plugins: &PluginManager,
    context: PluginContext,
) -> Result<PluginContext, HttpAppError> {
    let validation = plugins.execute_on_validation(&context).await?;
    if !validation.valid {
        tracing::info!(
            tenant_id = %context.tenant_id,
            session_id = %context.session_id,
            errors = validation.errors.len(),
            "Checkout rejected by plugin validation"
        );
        return Err(AppError::CheckoutValidationFailed(validation.errors).into());
    }
    Ok(plugins.execute_before_payment(context).await?)
}

/// Runs the post-payment observers. The payment already happened, so an
/// aborted stage is logged rather than returned.
pub(crate) async fn run_post_payment_plugins(
    plugins: &PluginManager,
    context: &PluginContext,
    succeeded: bool,
) {
    let outcome = if succeeded {
        plugins.execute_after_payment_success(context).await
    } else {
        plugins.execute_after_payment_failure(context).await
    };
    if let Err(e) = outcome {
        tracing::error!(
            error = %e,
            plugin = e.plugin(),
            hook = %e.hook(),
            "Post-payment plugin stage aborted"
        );
    }
}

/// Forwards an event to the Core API. Failures are logged and swallowed:
/// a payment outcome is reported to the shopper even if LinkBay is down.
pub(crate) async fn send_webhook_best_effort(core_api: &CoreApiClient, event: WebhookEvent) {
    if let Err(e) = core_api.send_webhook_event(&event).await {
        tracing::error!(
            error = %e,
            tenant_id = %event.tenant_id,
            event_type = %event.event_type,
            "Failed to forward webhook event to LinkBay"
        );
    }
}

/// Records a checkout funnel metric. Best-effort, like webhook forwarding.
pub(crate) async fn record_metric_best_effort(
    core_api: &CoreApiClient,
    tenant_id: Uuid,
    session_id: &str,
    event: MetricsEventKind,
    metadata: HashMap<String, JsonValue>,
) {
    let metric = CheckoutMetricsEvent::new(session_id, event).with_metadata(metadata);
    if let Err(e) = core_api.record_metrics(&tenant_id, &metric).await {
        tracing::warn!(
            error = %e,
            tenant_id = %tenant_id,
            event = %event,
            "Failed to record checkout metric"
        );
    }
}

/// `{"paymentMethod": ..}` plus any extra fields, for metric metadata.
pub(crate) fn payment_metadata<const N: usize>(
    method: PaymentMethod,
    extra: [(&str, JsonValue); N],
) -> HashMap<String, JsonValue> {
    let mut metadata = HashMap::with_capacity(N + 1);
    metadata.insert("paymentMethod".to_string(), json!(method));
    for (key, value) in extra {
        metadata.insert(key.to_string(), value);
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_metadata() {
        let metadata = payment_metadata(PaymentMethod::Paypal, [("amount", json!(12.5))]);
        assert_eq!(metadata["paymentMethod"], "paypal");
        assert_eq!(metadata["amount"], 12.5);
        assert_eq!(payment_metadata(PaymentMethod::Stripe, []).len(), 1);
    }
}
