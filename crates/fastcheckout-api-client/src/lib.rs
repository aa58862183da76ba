//! HTTP client for the LinkBay Core API.
//!
//! Every call sends `X-API-Key`, is retried with exponential backoff on
//! transport errors and 5xx responses, and unwraps the `{success, data, error}`
//! envelope the Core API answers with. Domain methods live in [`api`].

pub mod api;

use anyhow::{Context, Result};
use fastcheckout_core::{ApiResponse, Config};
use fastcheckout_infra::{retry_with_backoff_if, RetryPolicy};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;

pub use api::{CartItemRef, CartValidationResult, Product, UpdatedCartItem};

/// Failure of a single HTTP exchange, before the envelope is looked at.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Request to LinkBay API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LinkBay API Error: {} - {message}", status.as_u16())]
    Status { status: StatusCode, message: String },
}

impl RequestError {
    /// Transport failures and 5xx answers are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            RequestError::Transport(_) => true,
            RequestError::Status { status, .. } => status.is_server_error(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CoreApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl CoreApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            retry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.linkbay_api_url.clone(),
            config.linkbay_api_key.clone(),
            config.core_api_timeout,
            RetryPolicy::new(config.core_api_max_retries, config.core_api_retry_base_delay),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&JsonValue>,
    ) -> std::result::Result<Response, RequestError> {
        let mut request = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json")
            .header("X-API-Key", self.api_key.as_deref().unwrap_or_default());

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        Err(RequestError::Status { status, message })
    }

    /// Sends a request with retry and returns the envelope's `data`.
    ///
    /// An envelope without `data` decodes as JSON `null`, which is what
    /// endpoints returning `()` rely on.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<JsonValue>,
    ) -> Result<T> {
        let url = self.build_url(path);

        let response = retry_with_backoff_if(self.retry, RequestError::is_retryable, |_| {
            self.send_once(method.clone(), &url, query, body.as_ref())
        })
        .await?;

        let envelope: ApiResponse<JsonValue> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse LinkBay response for {} {}", method, path))?;

        if !envelope.success {
            let (code, message) = envelope
                .error
                .map(|e| (e.code, e.message))
                .unwrap_or_else(|| ("UNKNOWN".to_string(), "Unknown error".to_string()));
            anyhow::bail!("LinkBay API Error: {} - {}", code, message);
        }

        serde_json::from_value(envelope.data.unwrap_or(JsonValue::Null))
            .with_context(|| format!("Unexpected LinkBay payload for {} {}", method, path))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.request(Method::GET, path, query, None).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body).context("Failed to serialize request body")?;
        self.request(method, path, &[], Some(body)).await
    }
}

/// Pulls `message` (or `error.message`) out of an error body.
async fn error_message(response: Response) -> Option<String> {
    let body: JsonValue = response.json().await.ok()?;
    body.get("message")
        .or_else(|| body.pointer("/error/message"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}
