//! h2oGPTe connector
//!
//! Drives the h2oGPTe REST chat API: one chat session per request, then a
//! completion query inside that session.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::connector::{
    resolve_setting, ChatRequest, Connector, ConnectorEndpointArguments, ConnectorResponse,
    RateLimiter, RetryPolicy,
};
use crate::error::{ConnectorError, Result};

const API_KEY_ENV: &str = "H2OGPTE_API_KEY";
const ENDPOINT_ENV: &str = "H2OGPTE_ENDPOINT";
const DEFAULT_ENDPOINT: &str = "https://h2ogpte.genai.h2o.ai";

#[derive(Debug, Deserialize)]
struct ChatSession {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChatAnswer {
    content: Value,
}

/// Connector for h2oGPTe chat sessions.
pub struct H2oGpteConnector {
    arguments: ConnectorEndpointArguments,
    rate_limiter: RateLimiter,
    retry_policy: RetryPolicy,
    client: Client,
    api_key: String,
    api_endpoint: String,
}

impl H2oGpteConnector {
    /// Create the connector and its HTTP client.
    ///
    /// The key falls back to `H2OGPTE_API_KEY`, the address to
    /// `H2OGPTE_ENDPOINT` and then the hosted default.
    pub fn new(arguments: ConnectorEndpointArguments) -> Result<Self> {
        let api_key = resolve_setting(arguments.token.as_deref().unwrap_or(""), API_KEY_ENV, "");
        let api_endpoint = resolve_setting(&arguments.endpoint, ENDPOINT_ENV, DEFAULT_ENDPOINT);

        let client = Client::builder()
            .timeout(Duration::from_secs(arguments.timeout_secs))
            .build()
            .map_err(ConnectorError::HttpClient)?;

        let rate_limiter = RateLimiter::new(arguments.max_calls_per_second);
        let retry_policy = RetryPolicy::new(arguments.num_of_retries);

        Ok(Self {
            arguments,
            rate_limiter,
            retry_policy,
            client,
            api_key,
            api_endpoint,
        })
    }

    fn base_url(&self) -> &str {
        self.api_endpoint.trim_end_matches('/')
    }

    async fn create_chat_session(&self) -> Result<ChatSession> {
        let response = self
            .client
            .post(format!("{}/api/v1/chat/sessions", self.base_url()))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Backend { status, message });
        }

        response.json::<ChatSession>().await.map_err(|e| {
            ConnectorError::InvalidResponse(format!("failed to parse chat session: {e}"))
        })
    }

    /// Stringify the answer payload.
    fn process_response(answer: ChatAnswer) -> String {
        match answer.content {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl Connector for H2oGpteConnector {
    fn arguments(&self) -> &ConnectorEndpointArguments {
        &self.arguments
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    async fn respond(&self, request: &ChatRequest) -> Result<ConnectorResponse> {
        // h2oGPTe takes the prompt and system prompt as separate fields
        // rather than a message list.
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let system_prompt = request
            .messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone());

        let session = self.create_chat_session().await?;
        debug!(session = %session.id, llm = %request.model, "Querying chat session");

        let mut body = request.params.clone();
        body.insert("message".to_string(), Value::String(prompt));
        body.insert("llm".to_string(), Value::String(request.model.clone()));
        body.insert(
            "timeout".to_string(),
            Value::from(request.timeout.as_secs()),
        );
        if let Some(system) = system_prompt {
            body.insert("system_prompt".to_string(), Value::String(system));
        }

        let response = self
            .client
            .post(format!(
                "{}/api/v1/chat/sessions/{}/completions",
                self.base_url(),
                session.id
            ))
            .bearer_auth(&self.api_key)
            .json(&Value::Object(body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Backend { status, message });
        }

        let answer = response.json::<ChatAnswer>().await.map_err(|e| {
            ConnectorError::InvalidResponse(format!("failed to parse chat answer: {e}"))
        })?;

        Ok(ConnectorResponse::new(Self::process_response(answer)))
    }
}
