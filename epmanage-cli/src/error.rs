use std::fmt::Display;

use epmanage_shared::envelope::ErrorEnvelope;
use reqwest::StatusCode;
use serde_json::Value;

use crate::api::value::ConversionError;

/// Errors surfaced by the transport session and the resource clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No base URL configured; raised before any network attempt.
    #[error("No base_url...refusing communication")]
    NotConfigured,

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status; `payload` is the server body as received.
    #[error("{}", ApiMessage(*status, payload))]
    Api { status: StatusCode, payload: Value },

    #[error("invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("item has no concurrency token")]
    MissingEtag,

    #[error("item has no self link")]
    MissingSelfLink,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Server payload of a rejected request, unchanged.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ClientError::Api { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

struct ApiMessage<'a>(StatusCode, &'a Value);

impl Display for ApiMessage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match ErrorEnvelope::message_of(self.1) {
            Some(message) => write!(f, "{} ({})", message, self.0),
            None if self.1.is_null() => write!(f, "server returned {}", self.0),
            None => write!(f, "server returned {}: {}", self.0, self.1),
        }
    }
}

/// Client-side rejection of an edit, detected before dispatch.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid parameter")]
    InvalidParameter(String),

    #[error("The specified parameter is read-only")]
    ReadOnly(String),

    #[error("Invalid value: {0}")]
    InvalidValue(#[from] ConversionError),
}
