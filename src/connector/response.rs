//! Normalized response envelope returned by every connector

use serde::{Deserialize, Serialize};

/// Final answer text from a backend.
///
/// Carries the normalized result whether it came from a genuine completion
/// or from an intercepted policy-rejection fallback. Immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorResponse {
    pub response: String,
}

impl ConnectorResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}
