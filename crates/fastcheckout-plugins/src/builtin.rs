//! Plugins shipped with the service.
//!
//! They only log for now; each one marks where a real integration (analytics
//! service, fraud API, mailer, loyalty program) would be called.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::manager::PluginManager;
use crate::plugin::{Hook, HookSet, Plugin, PluginContext, ValidationResult};

const BUILTIN_VERSION: &str = "1.0.0";

/// Totals above this are flagged in the logs as high value.
const HIGH_VALUE_THRESHOLD: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// One loyalty point per 10 units of currency.
const LOYALTY_POINT_UNIT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

#[derive(Debug, Default)]
pub struct AnalyticsTrackerPlugin;

#[async_trait]
impl Plugin for AnalyticsTrackerPlugin {
    fn name(&self) -> &str {
        "analytics-tracker"
    }

    fn version(&self) -> &str {
        BUILTIN_VERSION
    }

    fn hooks(&self) -> HookSet {
        HookSet::empty()
            .with(Hook::BeforeCheckoutInit)
            .with(Hook::BeforePayment)
            .with(Hook::AfterPaymentSuccess)
            .with(Hook::AfterPaymentFailure)
    }

    async fn before_checkout_init(&self, context: PluginContext) -> Result<PluginContext> {
        tracing::info!(
            tenant_id = %context.tenant_id,
            session_id = %context.session_id,
            "Checkout initialized"
        );
        Ok(context)
    }

    async fn before_payment(&self, context: PluginContext) -> Result<PluginContext> {
        tracing::info!(
            tenant_id = %context.tenant_id,
            session_id = %context.session_id,
            amount = ?context.checkout_data.total(),
            "Payment initiated"
        );
        Ok(context)
    }

    async fn after_payment_success(&self, context: &PluginContext) -> Result<()> {
        let currency = context.checkout_data.cart.as_ref().map(|c| c.currency.as_str());
        tracing::info!(
            tenant_id = %context.tenant_id,
            session_id = %context.session_id,
            value = ?context.checkout_data.total(),
            currency = ?currency,
            "Payment successful"
        );
        Ok(())
    }

    async fn after_payment_failure(&self, context: &PluginContext) -> Result<()> {
        tracing::info!(
            tenant_id = %context.tenant_id,
            session_id = %context.session_id,
            "Payment failed"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FraudDetectorPlugin;

impl FraudDetectorPlugin {
    fn is_suspicious_email(email: &str) -> bool {
        email.contains("test") || email.contains("fake")
    }
}

#[async_trait]
impl Plugin for FraudDetectorPlugin {
    fn name(&self) -> &str {
        "fraud-detector"
    }

    fn version(&self) -> &str {
        BUILTIN_VERSION
    }

    fn hooks(&self) -> HookSet {
        HookSet::empty().with(Hook::OnValidation)
    }

    async fn on_validation(&self, context: &PluginContext) -> Result<ValidationResult> {
        let mut errors = Vec::new();

        if let Some(total) = context.checkout_data.total() {
            if total > HIGH_VALUE_THRESHOLD {
                tracing::warn!(
                    tenant_id = %context.tenant_id,
                    session_id = %context.session_id,
                    total = %total,
                    "High value transaction detected"
                );
            }
        }

        if let Some(email) = context.checkout_data.email() {
            if Self::is_suspicious_email(email) {
                errors.push("Suspicious email address detected".to_string());
            }
        }

        if errors.is_empty() {
            Ok(ValidationResult::ok())
        } else {
            Ok(ValidationResult::invalid(errors))
        }
    }
}

#[derive(Debug, Default)]
pub struct EmailNotifierPlugin;

#[async_trait]
impl Plugin for EmailNotifierPlugin {
    fn name(&self) -> &str {
        "email-notifier"
    }

    fn version(&self) -> &str {
        BUILTIN_VERSION
    }

    fn hooks(&self) -> HookSet {
        HookSet::empty()
            .with(Hook::AfterPaymentSuccess)
            .with(Hook::AfterPaymentFailure)
    }

    async fn after_payment_success(&self, context: &PluginContext) -> Result<()> {
        tracing::info!(
            session_id = %context.session_id,
            email = ?context.checkout_data.email(),
            "Sending order confirmation email"
        );
        Ok(())
    }

    async fn after_payment_failure(&self, context: &PluginContext) -> Result<()> {
        tracing::info!(
            session_id = %context.session_id,
            "Sending payment failure notification"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LoyaltyPointsPlugin;

impl LoyaltyPointsPlugin {
    pub fn points_for(total: Decimal) -> u64 {
        (total / LOYALTY_POINT_UNIT).floor().to_u64().unwrap_or(0)
    }
}

#[async_trait]
impl Plugin for LoyaltyPointsPlugin {
    fn name(&self) -> &str {
        "loyalty-points"
    }

    fn version(&self) -> &str {
        BUILTIN_VERSION
    }

    fn hooks(&self) -> HookSet {
        HookSet::empty().with(Hook::AfterPaymentSuccess)
    }

    async fn after_payment_success(&self, context: &PluginContext) -> Result<()> {
        let total = context.checkout_data.total().unwrap_or_default();
        tracing::info!(
            points = Self::points_for(total),
            customer = ?context.checkout_data.email(),
            "Awarding loyalty points"
        );
        Ok(())
    }
}

/// Looks up a built-in plugin by name.
pub fn builtin_plugin(name: &str) -> Option<Arc<dyn Plugin>> {
    match name {
        "analytics-tracker" => Some(Arc::new(AnalyticsTrackerPlugin)),
        "fraud-detector" => Some(Arc::new(FraudDetectorPlugin)),
        "email-notifier" => Some(Arc::new(EmailNotifierPlugin)),
        "loyalty-points" => Some(Arc::new(LoyaltyPointsPlugin)),
        _ => None,
    }
}

/// Registers the named built-ins in the given order, skipping unknown names.
pub async fn register_builtin_plugins<S: AsRef<str>>(manager: &PluginManager, names: &[S]) {
    for name in names {
        match builtin_plugin(name.as_ref()) {
            Some(plugin) => manager.register(plugin).await,
            None => tracing::warn!(plugin = name.as_ref(), "Unknown built-in plugin, skipping"),
        }
    }
    tracing::info!(count = manager.len().await, "Plugins initialized");
}
