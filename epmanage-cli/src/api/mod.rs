//! Backend API clients.
//!
//! `resource` holds the generic schema-aware collection client; the domain
//! modules specialize it per collection.

pub mod agent;
pub mod app;
pub mod item;
pub mod package;
pub mod resource;
pub mod schema;
pub mod user;
pub mod value;

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;

/// Turn a non-success response into an error carrying its body unchanged.
pub(crate) async fn api_error(res: Response) -> ClientError {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    let payload = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    ClientError::Api { status, payload }
}

pub(crate) async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let bytes = res.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
