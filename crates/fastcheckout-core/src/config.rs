//! Configuration module
//!
//! Everything is environment-driven. `.env` files are honoured through `dotenvy`;
//! numeric values that fail to parse fall back to their defaults.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

const SERVER_PORT: u16 = 3000;
const LINKBAY_API_URL: &str = "https://api.linkbay.com";
const CORE_API_MAX_RETRIES: u32 = 3;
const CORE_API_RETRY_BASE_DELAY_MS: u64 = 1000;
const CORE_API_TIMEOUT_SECS: u64 = 30;
const STRIPE_API_BASE: &str = "https://api.stripe.com";
const STRIPE_WEBHOOK_TOLERANCE_SECS: u64 = 300;
const RATE_LIMIT_MAX_REQUESTS: u32 = 100;
const RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
const RATE_LIMIT_MAX_ENTRIES: usize = 10_000;

/// Names of the plugins shipped with the service, registered in this order.
pub const BUILTIN_PLUGIN_NAMES: [&str; 4] = [
    "analytics-tracker",
    "fraud-detector",
    "email-notifier",
    "loyalty-points",
];

/// What the plugin manager does when a hook fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookFailurePolicy {
    /// Log the failure, treat the plugin as a no-op and keep going.
    #[default]
    ContinueOnError,
    /// Stop the stage and report the failing plugin to the caller.
    AbortOnError,
}

impl FromStr for HookFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" | "continue-on-error" => Ok(Self::ContinueOnError),
            "abort" | "abort-on-error" => Ok(Self::AbortOnError),
            other => Err(anyhow::anyhow!(
                "Invalid PLUGIN_FAILURE_POLICY '{}': expected 'continue' or 'abort'",
                other
            )),
        }
    }
}

impl Display for HookFailurePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ContinueOnError => write!(f, "continue"),
            Self::AbortOnError => write!(f, "abort"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    // Core API (LinkBay)
    pub linkbay_api_url: String,
    pub linkbay_api_key: Option<String>,
    pub core_api_max_retries: u32,
    pub core_api_retry_base_delay: Duration,
    pub core_api_timeout: Duration,
    // Payment processors
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_base: String,
    pub stripe_webhook_tolerance_secs: u64,
    pub paypal_client_id: Option<String>,
    pub paypal_api_base: Option<String>,
    // Request pipeline
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub rate_limit_max_entries: usize,
    pub csrf_protection: bool,
    // Plugins
    pub plugin_failure_policy: HookFailurePolicy,
    pub plugin_hook_timeout: Option<Duration>,
    pub enabled_plugins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            linkbay_api_url: LINKBAY_API_URL.to_string(),
            linkbay_api_key: None,
            core_api_max_retries: CORE_API_MAX_RETRIES,
            core_api_retry_base_delay: Duration::from_millis(CORE_API_RETRY_BASE_DELAY_MS),
            core_api_timeout: Duration::from_secs(CORE_API_TIMEOUT_SECS),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: STRIPE_API_BASE.to_string(),
            stripe_webhook_tolerance_secs: STRIPE_WEBHOOK_TOLERANCE_SECS,
            paypal_client_id: None,
            paypal_api_base: None,
            rate_limit_max_requests: RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
            rate_limit_max_entries: RATE_LIMIT_MAX_ENTRIES,
            csrf_protection: false,
            plugin_failure_policy: HookFailurePolicy::default(),
            plugin_hook_timeout: None,
            enabled_plugins: BUILTIN_PLUGIN_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Reads an optional variable, treating empty strings as unset.
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    optional_var(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults.environment.clone());

        let plugin_failure_policy = match optional_var("PLUGIN_FAILURE_POLICY") {
            Some(value) => value.parse()?,
            None => defaults.plugin_failure_policy,
        };

        let config = Config {
            server_port: parse_var("SERVER_PORT", SERVER_PORT),
            environment,
            cors_origins: optional_var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or(defaults.cors_origins),
            linkbay_api_url: optional_var("LINKBAY_API_URL")
                .unwrap_or(defaults.linkbay_api_url)
                .trim_end_matches('/')
                .to_string(),
            linkbay_api_key: optional_var("LINKBAY_API_KEY"),
            core_api_max_retries: parse_var("CORE_API_MAX_RETRIES", CORE_API_MAX_RETRIES).max(1),
            core_api_retry_base_delay: Duration::from_millis(parse_var(
                "CORE_API_RETRY_BASE_DELAY_MS",
                CORE_API_RETRY_BASE_DELAY_MS,
            )),
            core_api_timeout: Duration::from_secs(
                parse_var("CORE_API_TIMEOUT_SECS", CORE_API_TIMEOUT_SECS).max(1),
            ),
            stripe_secret_key: optional_var("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: optional_var("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base: optional_var("STRIPE_API_BASE")
                .unwrap_or(defaults.stripe_api_base)
                .trim_end_matches('/')
                .to_string(),
            stripe_webhook_tolerance_secs: parse_var(
                "STRIPE_WEBHOOK_TOLERANCE_SECS",
                STRIPE_WEBHOOK_TOLERANCE_SECS,
            ),
            paypal_client_id: optional_var("PAYPAL_CLIENT_ID"),
            paypal_api_base: optional_var("PAYPAL_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string()),
            rate_limit_max_requests: parse_var("RATE_LIMIT_MAX_REQUESTS", RATE_LIMIT_MAX_REQUESTS)
                .max(1),
            rate_limit_window: Duration::from_secs(
                parse_var("RATE_LIMIT_WINDOW_SECS", RATE_LIMIT_WINDOW_SECS).max(1),
            ),
            rate_limit_max_entries: parse_var("RATE_LIMIT_MAX_ENTRIES", RATE_LIMIT_MAX_ENTRIES)
                .max(1),
            csrf_protection: parse_var("CSRF_PROTECTION", false),
            plugin_failure_policy,
            plugin_hook_timeout: optional_var("PLUGIN_HOOK_TIMEOUT_MS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            enabled_plugins: optional_var("ENABLED_PLUGINS")
                .map(|v| parse_list(&v))
                .unwrap_or(defaults.enabled_plugins),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.linkbay_api_url.starts_with("http://")
            && !self.linkbay_api_url.starts_with("https://")
        {
            anyhow::bail!(
                "LINKBAY_API_URL must be an http(s) URL, got '{}'",
                self.linkbay_api_url
            );
        }

        if let Some(unknown) = self
            .enabled_plugins
            .iter()
            .find(|name| !BUILTIN_PLUGIN_NAMES.contains(&name.as_str()))
        {
            anyhow::bail!(
                "ENABLED_PLUGINS contains unknown plugin '{}' (known: {})",
                unknown,
                BUILTIN_PLUGIN_NAMES.join(", ")
            );
        }

        if self.is_production() && self.linkbay_api_key.is_none() {
            tracing::warn!("LINKBAY_API_KEY is not set; Core API calls will be rejected");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }
}
