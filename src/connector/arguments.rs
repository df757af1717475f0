//! Endpoint argument model and environment fallback resolution

use serde_json::{Map, Value};
use std::time::Duration;

use crate::connector::traits::{ChatMessage, ChatRequest};
use crate::error::{ConnectorError, Result};

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub(crate) const DEFAULT_NUM_RETRIES: u32 = 3;

/// Immutable configuration describing how to reach and call one backend.
///
/// A connector is bound to exactly one of these at construction; a new
/// connector is required per distinct configuration.
#[derive(Debug, Clone)]
pub struct ConnectorEndpointArguments {
    /// Base URI of the backend, or empty to fall back to the environment.
    pub endpoint: String,
    /// API secret. Falls back to the adapter's environment variable.
    pub token: Option<String>,
    /// Model (or deployment) identifier sent with every call.
    pub model: String,
    /// Per-attempt timeout in seconds. Must be positive.
    pub timeout_secs: u64,
    /// Calls admitted per rolling second. `None` or zero means unlimited.
    pub max_calls_per_second: Option<u32>,
    /// Re-attempts after the initial try for transient failures.
    pub num_of_retries: u32,
    /// Text prepended to every prompt.
    pub pre_prompt: String,
    /// Text appended to every prompt.
    pub post_prompt: String,
    /// System-role message sent ahead of the user prompt when set.
    pub system_prompt: Option<String>,
    /// Backend-specific extras merged into the outgoing request.
    pub optional_params: Map<String, Value>,
}

impl Default for ConnectorEndpointArguments {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            model: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_calls_per_second: None,
            num_of_retries: DEFAULT_NUM_RETRIES,
            pre_prompt: String::new(),
            post_prompt: String::new(),
            system_prompt: None,
            optional_params: Map::new(),
        }
    }
}

impl ConnectorEndpointArguments {
    /// Check the argument invariants.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ConnectorError::InvalidRequest(
                "timeout_secs must be positive".to_string(),
            ));
        }
        if self.model.is_empty() {
            return Err(ConnectorError::InvalidRequest(
                "model cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Assemble the outgoing request for `prompt`.
    ///
    /// The prompt text becomes `pre_prompt + prompt + post_prompt`. A
    /// configured system prompt yields a two-message exchange, otherwise a
    /// single user-role message.
    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        let content = format!("{}{}{}", self.pre_prompt, prompt, self.post_prompt);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(content));

        ChatRequest {
            model: self.model.clone(),
            messages,
            timeout: Duration::from_secs(self.timeout_secs),
            params: self.optional_params.clone(),
        }
    }
}

/// Three-tier fallback: explicit value, then environment variable, then
/// default. Never fails; an empty result means the backend will reject the
/// first call instead.
pub fn resolve_setting(explicit: &str, env_var: &str, default: &str) -> String {
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}
