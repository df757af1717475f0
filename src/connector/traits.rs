//! Connector contract: request types and the `Connector` trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::connector::arguments::ConnectorEndpointArguments;
use crate::connector::rate_limit::RateLimiter;
use crate::connector::response::ConnectorResponse;
use crate::connector::retry::RetryPolicy;
use crate::error::Result;

/// Chat message (role/content pair)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Fully assembled backend call: the required parameters plus any
/// caller-supplied extras.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub timeout: Duration,
    pub params: Map<String, Value>,
}

impl ChatRequest {
    /// Merge the extras with the required call parameters.
    ///
    /// Required parameters win on name collision.
    pub fn to_body(&self) -> Value {
        let mut body = self.params.clone();
        body.insert("model".to_string(), Value::String(self.model.clone()));
        body.insert(
            "messages".to_string(),
            serde_json::to_value(&self.messages).unwrap_or_default(),
        );
        Value::Object(body)
    }
}

/// Contract every backend connector satisfies.
///
/// Implementations provide the backend-specific [`respond`](Connector::respond);
/// the provided [`get_response`](Connector::get_response) adds prompt
/// templating, rate-limit admission, and retries around it.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Endpoint configuration this connector was built from.
    fn arguments(&self) -> &ConnectorEndpointArguments;

    /// Admission gate shared by all callers on this instance.
    fn rate_limiter(&self) -> &RateLimiter;

    /// Retry behavior for transient backend failures.
    fn retry_policy(&self) -> &RetryPolicy;

    /// Perform one backend call for an already-assembled request and
    /// normalize the answer.
    ///
    /// A backend's "safe rejection" shape must be converted into an `Ok`
    /// response here, before the retry boundary; every other error
    /// propagates unmodified so the retry policy can classify it.
    async fn respond(&self, request: &ChatRequest) -> Result<ConnectorResponse>;

    /// Send `prompt` to the backend and return the normalized answer.
    ///
    /// Admission is rate-limited once per invocation; retries re-run only
    /// the already-admitted backend call.
    async fn get_response(&self, prompt: &str) -> Result<ConnectorResponse> {
        let request = self.arguments().build_request(prompt);

        self.rate_limiter().acquire().await;

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Dispatching prompt to backend"
        );

        self.retry_policy().run(|| self.respond(&request)).await
    }
}
