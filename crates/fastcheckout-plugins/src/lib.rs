//! FastCheckout plugin system
//!
//! Plugins hook into the checkout lifecycle. The [`PluginManager`] keeps them in
//! registration order and runs one stage at a time, isolating hook failures
//! according to its [`HookFailurePolicy`](fastcheckout_core::HookFailurePolicy).

#[cfg(feature = "plugin")]
pub mod error;
#[cfg(feature = "plugin")]
pub mod manager;
#[cfg(feature = "plugin")]
pub mod plugin;

#[cfg(feature = "builtin-plugins")]
pub mod builtin;

#[cfg(feature = "plugin")]
pub use error::PluginError;
#[cfg(feature = "plugin")]
pub use manager::PluginManager;
#[cfg(feature = "plugin")]
pub use plugin::{Hook, HookSet, Plugin, PluginContext, PluginInfo, ValidationResult};

#[cfg(feature = "builtin-plugins")]
pub use builtin::{
    builtin_plugin, register_builtin_plugins, AnalyticsTrackerPlugin, EmailNotifierPlugin,
    FraudDetectorPlugin, LoyaltyPointsPlugin,
};
