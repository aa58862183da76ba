//! Plugin manager
//!
//! Holds plugins in registration order and runs lifecycle stages over them.
//! Each stage works on a snapshot of the collection taken when it starts, so a
//! slow hook never blocks registration and the lock is never held across a hook.

use fastcheckout_core::HookFailurePolicy;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::PluginError;
use crate::plugin::{Hook, Plugin, PluginContext, PluginInfo, ValidationResult};

/// Stages whose hooks return the context for the next plugin.
#[derive(Debug, Clone, Copy)]
enum MutationStage {
    CheckoutInit,
    Payment,
}

impl MutationStage {
    fn hook(self) -> Hook {
        match self {
            MutationStage::CheckoutInit => Hook::BeforeCheckoutInit,
            MutationStage::Payment => Hook::BeforePayment,
        }
    }
}

/// Ordered plugin collection plus the policy for failing hooks.
///
/// Cloning is cheap and clones share the same collection.
#[derive(Clone)]
pub struct PluginManager {
    plugins: Arc<RwLock<Vec<Arc<dyn Plugin>>>>,
    failure_policy: HookFailurePolicy,
    hook_timeout: Option<Duration>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Arc::new(RwLock::new(Vec::new())),
            failure_policy: HookFailurePolicy::default(),
            hook_timeout: None,
        }
    }

    pub fn with_failure_policy(mut self, policy: HookFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_hook_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.hook_timeout = timeout;
        self
    }

    pub fn failure_policy(&self) -> HookFailurePolicy {
        self.failure_policy
    }

    /// Appends a plugin. Names are not deduplicated: registering the same name
    /// twice runs it twice.
    pub async fn register(&self, plugin: Arc<dyn Plugin>) {
        tracing::info!(
            plugin = plugin.name(),
            version = plugin.version(),
            hooks = ?plugin.hooks(),
            "Registering plugin"
        );
        self.plugins.write().await.push(plugin);
    }

    /// Removes every plugin with this name and returns how many were removed.
    pub async fn unregister(&self, name: &str) -> usize {
        let mut plugins = self.plugins.write().await;
        let before = plugins.len();
        plugins.retain(|plugin| plugin.name() != name);
        let removed = before - plugins.len();
        tracing::info!(plugin = name, removed, "Unregistered plugin");
        removed
    }

    /// Copy of the collection in registration order.
    pub async fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins.read().await.clone()
    }

    pub async fn list(&self) -> Vec<PluginInfo> {
        self.plugins
            .read()
            .await
            .iter()
            .map(|plugin| PluginInfo::of(plugin.as_ref()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.plugins.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.plugins.read().await.is_empty()
    }

    async fn snapshot(&self, hook: Hook) -> Vec<Arc<dyn Plugin>> {
        self.plugins
            .read()
            .await
            .iter()
            .filter(|plugin| plugin.hooks().contains(hook))
            .cloned()
            .collect()
    }

    /// Runs one hook call, converting errors, panics and timeouts into a
    /// [`PluginError`] attributed to the plugin.
    async fn guard<T, F>(&self, plugin: &dyn Plugin, hook: Hook, call: F) -> Result<T, PluginError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let call = AssertUnwindSafe(call).catch_unwind();
        let outcome = match self.hook_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(PluginError::HookTimedOut {
                        plugin: plugin.name().to_string(),
                        hook,
                        timeout,
                    })
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(Ok(value)) => {
                tracing::debug!(plugin = plugin.name(), hook = %hook, "Executed plugin hook");
                Ok(value)
            }
            Ok(Err(source)) => Err(PluginError::HookFailed {
                plugin: plugin.name().to_string(),
                hook,
                source,
            }),
            Err(_) => Err(PluginError::HookPanicked {
                plugin: plugin.name().to_string(),
                hook,
            }),
        }
    }

    /// Logs a failed hook and decides whether the stage goes on.
    fn handle_failure(&self, error: PluginError) -> Result<(), PluginError> {
        tracing::error!(
            plugin = error.plugin(),
            hook = %error.hook(),
            policy = %self.failure_policy,
            error = %error,
            "Plugin hook failed"
        );
        match self.failure_policy {
            HookFailurePolicy::ContinueOnError => Ok(()),
            HookFailurePolicy::AbortOnError => Err(error),
        }
    }

    async fn run_mutation(
        &self,
        stage: MutationStage,
        context: PluginContext,
    ) -> Result<PluginContext, PluginError> {
        let hook = stage.hook();
        let mut current = context;

        for plugin in self.snapshot(hook).await {
            let input = current.clone();
            let call = match stage {
                MutationStage::CheckoutInit => plugin.before_checkout_init(input),
                MutationStage::Payment => plugin.before_payment(input),
            };
            match self.guard(plugin.as_ref(), hook, call).await {
                Ok(next) => current = next,
                // The failed plugin's output is dropped; `current` still holds
                // what the previous plugin produced.
                Err(error) => self.handle_failure(error)?,
            }
        }

        Ok(current)
    }

    pub async fn execute_before_checkout_init(
        &self,
        context: PluginContext,
    ) -> Result<PluginContext, PluginError> {
        self.run_mutation(MutationStage::CheckoutInit, context).await
    }

    pub async fn execute_before_payment(
        &self,
        context: PluginContext,
    ) -> Result<PluginContext, PluginError> {
        self.run_mutation(MutationStage::Payment, context).await
    }

    pub async fn execute_after_payment_success(
        &self,
        context: &PluginContext,
    ) -> Result<(), PluginError> {
        let hook = Hook::AfterPaymentSuccess;
        for plugin in self.snapshot(hook).await {
            let call = plugin.after_payment_success(context);
            if let Err(error) = self.guard(plugin.as_ref(), hook, call).await {
                self.handle_failure(error)?;
            }
        }
        Ok(())
    }

    pub async fn execute_after_payment_failure(
        &self,
        context: &PluginContext,
    ) -> Result<(), PluginError> {
        let hook = Hook::AfterPaymentFailure;
        for plugin in self.snapshot(hook).await {
            let call = plugin.after_payment_failure(context);
            if let Err(error) = self.guard(plugin.as_ref(), hook, call).await {
                self.handle_failure(error)?;
            }
        }
        Ok(())
    }

    /// Collects validation errors from every plugin in order.
    ///
    /// A plugin whose hook fails contributes `"Plugin <name> validation failed"`.
    pub async fn execute_on_validation(
        &self,
        context: &PluginContext,
    ) -> Result<ValidationResult, PluginError> {
        let hook = Hook::OnValidation;
        let mut errors = Vec::new();

        for plugin in self.snapshot(hook).await {
            let call = plugin.on_validation(context);
            match self.guard(plugin.as_ref(), hook, call).await {
                Ok(result) => {
                    if !result.valid {
                        errors.extend(result.errors);
                    }
                }
                Err(error) => {
                    let name = error.plugin().to_string();
                    self.handle_failure(error)?;
                    errors.push(format!("Plugin {} validation failed", name));
                }
            }
        }

        Ok(ValidationResult {
            valid: errors.is_empty(),
            errors,
        })
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("failure_policy", &self.failure_policy)
            .field("hook_timeout", &self.hook_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::HookSet;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    type CallLog = Arc<Mutex<Vec<String>>>;

    /// Configurable plugin used to exercise the manager.
    #[derive(Debug, Default)]
    struct MockPlugin {
        name: String,
        hooks: HookSet,
        validation_errors: Vec<String>,
        fail: bool,
        panic: bool,
        delay: Option<Duration>,
        metadata_key: Option<String>,
        log: Option<CallLog>,
    }

    impl MockPlugin {
        fn new(name: &str, hooks: HookSet) -> Self {
            Self {
                name: name.to_string(),
                hooks,
                ..Default::default()
            }
        }

        fn record(&self, entry: &str) {
            if let Some(log) = &self.log {
                log.lock().unwrap().push(format!("{}:{}", self.name, entry));
            }
        }

        async fn behave(&self) -> Result<()> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.panic {
                panic!("plugin {} exploded", self.name);
            }
            if self.fail {
                return Err(anyhow!("plugin {} is broken", self.name));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Plugin for MockPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        fn hooks(&self) -> HookSet {
            self.hooks
        }

        async fn before_checkout_init(&self, mut context: PluginContext) -> Result<PluginContext> {
            self.record("init");
            if let Some(key) = &self.metadata_key {
                context
                    .checkout_data
                    .metadata
                    .insert(key.clone(), json!(true));
            }
            self.behave().await?;
            Ok(context)
        }

        async fn before_payment(&self, mut context: PluginContext) -> Result<PluginContext> {
            let mut seen: Vec<String> = context.checkout_data.metadata.keys().cloned().collect();
            seen.sort();
            self.record(&format!("payment saw {:?}", seen));
            if let Some(key) = &self.metadata_key {
                context
                    .checkout_data
                    .metadata
                    .insert(key.clone(), json!(self.name));
            }
            self.behave().await?;
            Ok(context)
        }

        async fn after_payment_success(&self, _context: &PluginContext) -> Result<()> {
            self.record("success");
            self.behave().await
        }

        async fn after_payment_failure(&self, _context: &PluginContext) -> Result<()> {
            self.record("failure");
            self.behave().await
        }

        async fn on_validation(&self, _context: &PluginContext) -> Result<ValidationResult> {
            self.record("validation");
            self.behave().await?;
            if self.validation_errors.is_empty() {
                Ok(ValidationResult::ok())
            } else {
                Ok(ValidationResult::invalid(self.validation_errors.clone()))
            }
        }
    }

    fn context() -> PluginContext {
        PluginContext::new(Uuid::new_v4(), "1700000000000-abc123def")
    }

    fn validator(name: &str) -> MockPlugin {
        MockPlugin::new(name, HookSet::empty().with(Hook::OnValidation))
    }

    #[tokio::test]
    async fn test_new_manager_is_empty() {
        let manager = PluginManager::new();
        assert!(manager.is_empty().await);
        assert!(manager.list().await.is_empty());
        assert_eq!(manager.failure_policy(), HookFailurePolicy::ContinueOnError);
    }

    #[tokio::test]
    async fn test_register_keeps_order_and_duplicates() {
        let manager = PluginManager::new();
        manager.register(Arc::new(validator("a"))).await;
        manager.register(Arc::new(validator("b"))).await;
        manager.register(Arc::new(validator("a"))).await;

        let names: Vec<String> = manager.list().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn test_unregister_removes_all_matches() {
        let manager = PluginManager::new();
        manager.register(Arc::new(validator("a"))).await;
        manager.register(Arc::new(validator("b"))).await;
        manager.register(Arc::new(validator("a"))).await;

        assert_eq!(manager.unregister("a").await, 2);
        assert_eq!(manager.len().await, 1);
        assert_eq!(manager.unregister("missing").await, 0);
    }

    #[tokio::test]
    async fn test_plugins_returns_a_copy() {
        let manager = PluginManager::new();
        manager.register(Arc::new(validator("a"))).await;

        let mut copy = manager.plugins().await;
        copy.clear();
        assert_eq!(manager.len().await, 1);
    }

    #[tokio::test]
    async fn test_validation_collects_errors_in_order() {
        let manager = PluginManager::new();
        let mut p1 = validator("p1");
        p1.validation_errors = vec!["Cart is too large".to_string()];
        manager.register(Arc::new(p1)).await;
        manager.register(Arc::new(validator("p2"))).await;

        let result = manager.execute_on_validation(&context()).await.unwrap();
        assert_eq!(
            result,
            ValidationResult {
                valid: false,
                errors: vec!["Cart is too large".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_failing_validator_is_attributed_and_next_still_runs() {
        let log: CallLog = Arc::default();
        let manager = PluginManager::new();
        let mut p1 = validator("p1");
        p1.fail = true;
        p1.log = Some(log.clone());
        let mut p2 = validator("p2");
        p2.validation_errors = vec!["Suspicious email address detected".to_string()];
        p2.log = Some(log.clone());
        manager.register(Arc::new(p1)).await;
        manager.register(Arc::new(p2)).await;

        let result = manager.execute_on_validation(&context()).await.unwrap();
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Plugin p1 validation failed".to_string(),
                "Suspicious email address detected".to_string(),
            ]
        );
        assert_eq!(
            *log.lock().unwrap(),
            vec!["p1:validation".to_string(), "p2:validation".to_string()]
        );
    }

    #[tokio::test]
    async fn test_no_validators_is_valid() {
        let manager = PluginManager::new();
        manager
            .register(Arc::new(MockPlugin::new(
                "observer",
                HookSet::empty().with(Hook::AfterPaymentSuccess),
            )))
            .await;
        let result = manager.execute_on_validation(&context()).await.unwrap();
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_before_payment_threads_context() {
        let log: CallLog = Arc::default();
        let manager = PluginManager::new();
        let hooks = HookSet::empty().with(Hook::BeforePayment);
        let mut a = MockPlugin::new("A", hooks);
        a.metadata_key = Some("a".to_string());
        a.log = Some(log.clone());
        let mut b = MockPlugin::new("B", hooks);
        b.metadata_key = Some("b".to_string());
        b.log = Some(log.clone());
        manager.register(Arc::new(a)).await;
        manager.register(Arc::new(b)).await;

        let result = manager.execute_before_payment(context()).await.unwrap();
        assert_eq!(result.checkout_data.metadata["a"], json!("A"));
        assert_eq!(result.checkout_data.metadata["b"], json!("B"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "A:payment saw []".to_string(),
                "B:payment saw [\"a\"]".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_mutation_is_discarded_and_stage_continues() {
        let manager = PluginManager::new();
        let hooks = HookSet::empty().with(Hook::BeforeCheckoutInit);
        let mut first = MockPlugin::new("first", hooks);
        first.metadata_key = Some("first".to_string());
        let mut broken = MockPlugin::new("broken", hooks);
        broken.metadata_key = Some("broken".to_string());
        broken.fail = true;
        let mut last = MockPlugin::new("last", hooks);
        last.metadata_key = Some("last".to_string());
        manager.register(Arc::new(first)).await;
        manager.register(Arc::new(broken)).await;
        manager.register(Arc::new(last)).await;

        let result = manager.execute_before_checkout_init(context()).await.unwrap();
        let metadata = &result.checkout_data.metadata;
        assert!(metadata.contains_key("first"));
        assert!(!metadata.contains_key("broken"));
        assert!(metadata.contains_key("last"));
    }

    #[tokio::test]
    async fn test_hooks_outside_capability_set_are_skipped() {
        let log: CallLog = Arc::default();
        let manager = PluginManager::new();
        let mut plugin = MockPlugin::new("observer", HookSet::empty().with(Hook::AfterPaymentFailure));
        plugin.log = Some(log.clone());
        manager.register(Arc::new(plugin)).await;

        manager.execute_after_payment_success(&context()).await.unwrap();
        manager.execute_after_payment_failure(&context()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["observer:failure".to_string()]);
    }

    #[tokio::test]
    async fn test_observer_failure_does_not_stop_iteration() {
        let log: CallLog = Arc::default();
        let manager = PluginManager::new();
        let hooks = HookSet::empty().with(Hook::AfterPaymentSuccess);
        let mut broken = MockPlugin::new("broken", hooks);
        broken.fail = true;
        broken.log = Some(log.clone());
        let mut healthy = MockPlugin::new("healthy", hooks);
        healthy.log = Some(log.clone());
        manager.register(Arc::new(broken)).await;
        manager.register(Arc::new(healthy)).await;

        assert!(manager.execute_after_payment_success(&context()).await.is_ok());
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_abort_policy_stops_at_first_failure() {
        let log: CallLog = Arc::default();
        let manager =
            PluginManager::new().with_failure_policy(HookFailurePolicy::AbortOnError);
        let hooks = HookSet::empty().with(Hook::BeforePayment);
        let mut broken = MockPlugin::new("broken", hooks);
        broken.fail = true;
        broken.log = Some(log.clone());
        let mut never = MockPlugin::new("never", hooks);
        never.log = Some(log.clone());
        manager.register(Arc::new(broken)).await;
        manager.register(Arc::new(never)).await;

        let error = manager.execute_before_payment(context()).await.unwrap_err();
        assert!(matches!(
            &error,
            PluginError::HookFailed { plugin, hook: Hook::BeforePayment, .. } if plugin == "broken"
        ));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_abort_policy_applies_to_validation() {
        let manager =
            PluginManager::new().with_failure_policy(HookFailurePolicy::AbortOnError);
        let mut broken = validator("broken");
        broken.fail = true;
        manager.register(Arc::new(broken)).await;

        let error = manager.execute_on_validation(&context()).await.unwrap_err();
        assert_eq!(error.plugin(), "broken");
        assert_eq!(error.hook(), Hook::OnValidation);
    }

    #[tokio::test]
    async fn test_panicking_hook_is_contained() {
        let manager = PluginManager::new();
        let mut bomb = validator("bomb");
        bomb.panic = true;
        manager.register(Arc::new(bomb)).await;
        manager.register(Arc::new(validator("calm"))).await;

        let result = manager.execute_on_validation(&context()).await.unwrap();
        assert_eq!(result.errors, vec!["Plugin bomb validation failed".to_string()]);
    }

    #[tokio::test]
    async fn test_panic_reported_under_abort_policy() {
        let manager =
            PluginManager::new().with_failure_policy(HookFailurePolicy::AbortOnError);
        let mut bomb = MockPlugin::new("bomb", HookSet::empty().with(Hook::AfterPaymentFailure));
        bomb.panic = true;
        manager.register(Arc::new(bomb)).await;

        let error = manager
            .execute_after_payment_failure(&context())
            .await
            .unwrap_err();
        assert!(matches!(error, PluginError::HookPanicked { .. }));
    }

    #[tokio::test]
    async fn test_hook_timeout_counts_as_failure() {
        let manager = PluginManager::new()
            .with_failure_policy(HookFailurePolicy::AbortOnError)
            .with_hook_timeout(Some(Duration::from_millis(20)));
        let mut slow = MockPlugin::new("slow", HookSet::empty().with(Hook::BeforeCheckoutInit));
        slow.delay = Some(Duration::from_secs(5));
        manager.register(Arc::new(slow)).await;

        let error = manager
            .execute_before_checkout_init(context())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            PluginError::HookTimedOut { timeout, .. } if timeout == Duration::from_millis(20)
        ));
    }

    #[tokio::test]
    async fn test_timed_out_mutation_keeps_previous_context() {
        let manager = PluginManager::new().with_hook_timeout(Some(Duration::from_millis(20)));
        let mut slow = MockPlugin::new("slow", HookSet::empty().with(Hook::BeforeCheckoutInit));
        slow.delay = Some(Duration::from_secs(5));
        slow.metadata_key = Some("slow".to_string());
        manager.register(Arc::new(slow)).await;

        let original = context();
        let result = manager
            .execute_before_checkout_init(original.clone())
            .await
            .unwrap();
        assert_eq!(result, original);
    }
}
