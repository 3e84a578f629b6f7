//! Response envelope: `[{"StatusCode":200}]` optionally followed by a payload

use crate::error::Result;
use serde::Serialize;
use serde_json::{json, Value};

/// Outcome of a successfully processed command
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResponse {
    pub status_code: u16,
    pub payload: Option<Value>,
}

impl MatchResponse {
    /// Plain acknowledgment without payload
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            payload: None,
        }
    }

    /// Acknowledgment carrying a command-specific payload
    pub fn ok_with<T: Serialize>(payload: &T) -> Result<Self> {
        Ok(Self {
            status_code: 200,
            payload: Some(serde_json::to_value(payload)?),
        })
    }

    /// Serialize to the text body sent to the client
    pub fn to_body(&self) -> Result<String> {
        let mut envelope = vec![json!({ "StatusCode": self.status_code })];
        if let Some(payload) = &self.payload {
            envelope.push(payload.clone());
        }
        Ok(serde_json::to_string(&envelope)?)
    }
}
