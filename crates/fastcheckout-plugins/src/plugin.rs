//! Plugin abstraction
//!
//! A plugin is a named, versioned unit that implements some of the five
//! lifecycle hooks. Which ones it implements is declared up front through
//! [`Plugin::hooks`]; the manager never calls a hook outside that set.

use anyhow::Result;
use async_trait::async_trait;
use fastcheckout_core::models::{CheckoutData, CheckoutSession};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use uuid::Uuid;

/// Lifecycle moments a plugin can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Hook {
    BeforeCheckoutInit,
    BeforePayment,
    AfterPaymentSuccess,
    AfterPaymentFailure,
    OnValidation,
}

impl Hook {
    pub const ALL: [Hook; 5] = [
        Hook::BeforeCheckoutInit,
        Hook::BeforePayment,
        Hook::AfterPaymentSuccess,
        Hook::AfterPaymentFailure,
        Hook::OnValidation,
    ];

    fn bit(self) -> u8 {
        match self {
            Hook::BeforeCheckoutInit => 1 << 0,
            Hook::BeforePayment => 1 << 1,
            Hook::AfterPaymentSuccess => 1 << 2,
            Hook::AfterPaymentFailure => 1 << 3,
            Hook::OnValidation => 1 << 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::BeforeCheckoutInit => "beforeCheckoutInit",
            Hook::BeforePayment => "beforePayment",
            Hook::AfterPaymentSuccess => "afterPaymentSuccess",
            Hook::AfterPaymentFailure => "afterPaymentFailure",
            Hook::OnValidation => "onValidation",
        }
    }
}

impl Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of hooks a plugin implements.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct HookSet(u8);

impl HookSet {
    pub const fn empty() -> Self {
        HookSet(0)
    }

    pub fn all() -> Self {
        Hook::ALL.into_iter().collect()
    }

    pub fn with(self, hook: Hook) -> Self {
        HookSet(self.0 | hook.bit())
    }

    pub fn contains(&self, hook: Hook) -> bool {
        self.0 & hook.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Hooks in lifecycle order.
    pub fn iter(&self) -> impl Iterator<Item = Hook> + '_ {
        Hook::ALL.into_iter().filter(|hook| self.contains(*hook))
    }
}

impl FromIterator<Hook> for HookSet {
    fn from_iter<I: IntoIterator<Item = Hook>>(iter: I) -> Self {
        iter.into_iter().fold(HookSet::empty(), HookSet::with)
    }
}

impl Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Value threaded through one lifecycle stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginContext {
    pub tenant_id: Uuid,
    pub session_id: String,
    pub checkout_data: CheckoutData,
}

impl PluginContext {
    pub fn new(tenant_id: Uuid, session_id: impl Into<String>) -> Self {
        Self {
            tenant_id,
            session_id: session_id.into(),
            checkout_data: CheckoutData::default(),
        }
    }

    pub fn with_checkout_data(mut self, checkout_data: CheckoutData) -> Self {
        self.checkout_data = checkout_data;
        self
    }

    pub fn from_session(session: &CheckoutSession) -> Self {
        Self {
            tenant_id: session.tenant_id,
            session_id: session.id.clone(),
            checkout_data: CheckoutData::from(session),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Checkout lifecycle extension.
///
/// Every hook has a no-op default, so an implementation only overrides the
/// hooks it lists in [`hooks`](Plugin::hooks).
///
/// Mutation hooks (`before_checkout_init`, `before_payment`) take the context
/// by value and return the one handed to the next plugin. Observer hooks only
/// borrow it.
#[async_trait]
pub trait Plugin: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn hooks(&self) -> HookSet;

    async fn before_checkout_init(&self, context: PluginContext) -> Result<PluginContext> {
        Ok(context)
    }

    async fn before_payment(&self, context: PluginContext) -> Result<PluginContext> {
        Ok(context)
    }

    async fn after_payment_success(&self, _context: &PluginContext) -> Result<()> {
        Ok(())
    }

    async fn after_payment_failure(&self, _context: &PluginContext) -> Result<()> {
        Ok(())
    }

    async fn on_validation(&self, _context: &PluginContext) -> Result<ValidationResult> {
        Ok(ValidationResult::ok())
    }
}

/// Public description of a registered plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub hooks: Vec<Hook>,
}

impl PluginInfo {
    pub fn of(plugin: &dyn Plugin) -> Self {
        Self {
            name: plugin.name().to_string(),
            version: plugin.version().to_string(),
            hooks: plugin.hooks().iter().collect(),
        }
    }
}
