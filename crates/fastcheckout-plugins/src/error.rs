use crate::plugin::Hook;
use std::time::Duration;
use thiserror::Error;

/// A hook that did not complete. Only surfaced under the abort policy.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin {plugin} failed in {hook}: {source}")]
    HookFailed {
        plugin: String,
        hook: Hook,
        #[source]
        source: anyhow::Error,
    },

    #[error("Plugin {plugin} timed out in {hook} after {}ms", timeout.as_millis())]
    HookTimedOut {
        plugin: String,
        hook: Hook,
        timeout: Duration,
    },

    #[error("Plugin {plugin} panicked in {hook}")]
    HookPanicked { plugin: String, hook: Hook },
}

impl PluginError {
    pub fn plugin(&self) -> &str {
        match self {
            PluginError::HookFailed { plugin, .. }
            | PluginError::HookTimedOut { plugin, .. }
            | PluginError::HookPanicked { plugin, .. } => plugin,
        }
    }

    pub fn hook(&self) -> Hook {
        match self {
            PluginError::HookFailed { hook, .. }
            | PluginError::HookTimedOut { hook, .. }
            | PluginError::HookPanicked { hook, .. } => *hook,
        }
    }
}
