//! Response envelopes used by the backend's REST layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved key holding the concurrency token of an item.
pub const ETAG_FIELD: &str = "_etag";
/// Reserved key holding the item's links.
pub const LINKS_FIELD: &str = "_links";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `{"_status": "ERR", "_error": {...}, "_issues": {...}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "_status", default)]
    pub status: Option<String>,
    #[serde(rename = "_error", default)]
    pub error: Option<ErrorDetail>,
    #[serde(rename = "_issues", default)]
    pub issues: Option<Value>,
}

impl ErrorEnvelope {
    /// Server message, if the payload is an error envelope carrying one.
    pub fn message_of(payload: &Value) -> Option<String> {
        let envelope: ErrorEnvelope = serde_json::from_value(payload.clone()).ok()?;
        envelope.error.and_then(|e| e.message)
    }
}

/// `{"_items": [...]}` as returned by collection reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsEnvelope<T> {
    #[serde(rename = "_items", default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
}
