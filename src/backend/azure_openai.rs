//! Azure OpenAI connector
//!
//! Speaks the Azure chat-completions REST API and converts content-filter
//! rejections into normal model responses.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::connector::{
    resolve_setting, ChatRequest, Connector, ConnectorEndpointArguments, ConnectorResponse,
    RateLimiter, RetryPolicy,
};
use crate::error::{ConnectorError, Result};

const API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
const ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
const API_VERSION_ENV: &str = "AZURE_OPENAI_VERSION";
const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Chat completion response (Azure/OpenAI wire shape)
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Connector for Azure OpenAI chat deployments.
pub struct AzureOpenAiConnector {
    arguments: ConnectorEndpointArguments,
    rate_limiter: RateLimiter,
    retry_policy: RetryPolicy,
    client: Client,
    api_key: String,
    api_endpoint: String,
    api_version: String,
}

impl AzureOpenAiConnector {
    /// Create the connector and its HTTP client.
    ///
    /// Key, endpoint, and API version resolve as explicit field, then
    /// environment variable, then default. Construction never fails on a
    /// missing credential; the first call does.
    pub fn new(arguments: ConnectorEndpointArguments) -> Result<Self> {
        let api_key = resolve_setting(arguments.token.as_deref().unwrap_or(""), API_KEY_ENV, "");

        let explicit_version = arguments
            .optional_params
            .get("api_version")
            .and_then(Value::as_str)
            .unwrap_or("");
        let api_version = resolve_setting(explicit_version, API_VERSION_ENV, DEFAULT_API_VERSION);

        let api_endpoint = resolve_setting(&arguments.endpoint, ENDPOINT_ENV, "");

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
            api_version,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.api_endpoint.trim_end_matches('/'),
            self.arguments.model
        )
    }

    /// Extract the first choice's message content.
    fn process_response(completion: ChatCompletionResponse) -> Result<String> {
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ConnectorError::InvalidResponse("completion carried no choices".to_string())
            })
    }

    /// Content-filter rejections arrive as HTTP 400 with a
    /// `ResponsibleAIPolicyViolation` inner error. The attached message is
    /// a legitimate model refusal, not a failure.
    fn content_filter_message(body: &str) -> Option<String> {
        let parsed: Value = serde_json::from_str(body).ok()?;
        let error = parsed.get("error").unwrap_or(&parsed);
        let code = error.get("innererror")?.get("code")?.as_str()?;
        if !code.contains("ResponsibleAIPolicyViolation") {
            return None;
        }
        error.get("message").and_then(Value::as_str).map(str::to_string)
    }
}

#[async_trait]
impl Connector for AzureOpenAiConnector {
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
        let mut body = request.to_body();
        if let Some(map) = body.as_object_mut() {
            // api_version and timeout configure the client, they are not
            // wire parameters
            map.remove("api_version");
            map.remove("timeout");
        }

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let completion = response.json::<ChatCompletionResponse>().await.map_err(|e| {
                ConnectorError::InvalidResponse(format!("failed to parse completion: {e}"))
            })?;
            return Ok(ConnectorResponse::new(Self::process_response(completion)?));
        }

        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST {
            if let Some(message) = Self::content_filter_message(&text) {
                debug!("Content filter rejection returned as model output");
                return Ok(ConnectorResponse::new(message));
            }
        }

        Err(ConnectorError::Backend {
            status,
            message: text,
        })
    }
}
