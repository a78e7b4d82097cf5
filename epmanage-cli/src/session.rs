//! Transport session: the single chokepoint for backend HTTP traffic.
//!
//! Holds the base URL and the armed bearer token. Relative paths are
//! resolved against the base URL; fully qualified URLs pass through
//! (package downloads point at a CDN).

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder};
use tracing::debug;

use crate::error::ClientError;

/// Client identity sent with every request.
pub const CLIENT_IDENTITY: &str = concat!("EPControl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default)]
struct SessionState {
    base_url: Option<String>,
    token: Option<String>,
}

#[derive(Debug)]
pub struct Session {
    client: Client,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_timeout(None)
    }

    /// No timeout unless one is given; the transport default applies.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_IDENTITY));

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            state: RwLock::new(SessionState::default()),
        })
    }

    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.base_url = if base_url.trim().is_empty() {
            None
        } else {
            Some(base_url)
        };
    }

    pub fn base_url(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.base_url.clone()
    }

    /// Arm the session with a bearer token for all subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.token = Some(token.into());
    }

    pub fn token(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.token.clone()
    }

    /// Build a request carrying the armed token, if any.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.token();
        self.request_as(method, path, token.as_deref())
    }

    /// Build a request with an explicit bearer, or none at all.
    pub fn request_as(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, ClientError> {
        let base_url = self.base_url().ok_or(ClientError::NotConfigured)?;
        let url = resolve_url(&base_url, path);
        debug!(%method, %url, "dispatching request");

        let builder = self.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }
}

/// Prefix `path` with `base_url` unless it is already a full URL.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
