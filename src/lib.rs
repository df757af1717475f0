//! Connector Gateway
//!
//! A uniform connector layer for sending prompts to heterogeneous LLM
//! backends (Azure OpenAI, h2oGPTe) with rate limiting, retry-on-failure,
//! prompt templating, and response normalization.

pub mod backend;
pub mod config;
pub mod connector;
pub mod error;

pub use connector::{
    Connector, ConnectorEndpointArguments, ConnectorRegistry, ConnectorResponse, RateLimiter,
    RetryPolicy,
};
pub use error::{ConnectorError, Result};
