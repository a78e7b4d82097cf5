//! Login and second-factor exchange with the backend.

pub mod guard;
pub mod store;
pub mod token;

use std::sync::Arc;

use epmanage_shared::auth::{LoginRequest, MfaRequest};
use epmanage_shared::envelope::ErrorEnvelope;
use epmanage_shared::privilege::Privilege;
use reqwest::{Method, Response, StatusCode};
use tracing::{debug, info};

pub use guard::{Credentials, require_privilege};
pub use store::TokenStore;
pub use token::{Claims, SignatureCheck, TokenValidation, decode_and_validate, privileges_of, requires_mfa};

use crate::error::ClientError;
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Server-side refusal, with the backend's message.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("No previous token")]
    NoPreviousToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions(Privilege),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    MfaPending,
    Authenticated,
}

#[derive(Debug, Clone)]
enum AuthState {
    Anonymous,
    MfaPending { token: String, claims: Claims },
    Authenticated { token: String, claims: Claims },
}

/// Holds at most one bearer token and walks it through the login states.
///
/// `Anonymous -> Authenticated` for accounts without a second factor,
/// `Anonymous -> MfaPending -> Authenticated` otherwise. A failed step leaves
/// the state as it was.
pub struct Authenticator {
    session: Arc<Session>,
    validation: TokenValidation,
    state: AuthState,
}

impl Authenticator {
    pub fn new(session: Arc<Session>, validation: TokenValidation) -> Self {
        Self {
            session,
            validation,
            state: AuthState::Anonymous,
        }
    }

    pub fn phase(&self) -> AuthPhase {
        match self.state {
            AuthState::Anonymous => AuthPhase::Anonymous,
            AuthState::MfaPending { .. } => AuthPhase::MfaPending,
            AuthState::Authenticated { .. } => AuthPhase::Authenticated,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            AuthState::Anonymous => None,
            AuthState::MfaPending { token, .. } | AuthState::Authenticated { token, .. } => Some(token),
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        match &self.state {
            AuthState::Anonymous => None,
            AuthState::MfaPending { claims, .. } | AuthState::Authenticated { claims, .. } => {
                Some(claims)
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<String, AuthError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res = self
            .session
            .request_as(Method::POST, "/frontend/login", None)?
            .json(&body)
            .send()
            .await
            .map_err(ClientError::from)?;

        let token = token_text(res).await?;
        self.accept(token)
    }

    /// Exchange the pre-MFA token and `code` for a fully authorized token.
    pub async fn complete_mfa(&mut self, code: &str) -> Result<String, AuthError> {
        let pending = match &self.state {
            AuthState::MfaPending { token, .. } => token.clone(),
            _ => return Err(AuthError::NoPreviousToken),
        };

        let res = self
            .session
            .request_as(Method::POST, "/frontend/login-mfa", Some(&pending))?
            .json(&MfaRequest {
                code: code.to_string(),
            })
            .send()
            .await
            .map_err(ClientError::from)?;

        let token = token_text(res).await?;
        self.accept(token)
    }

    fn accept(&mut self, token: String) -> Result<String, AuthError> {
        let claims =
            decode_and_validate(&token, &self.validation).ok_or(AuthError::InvalidToken)?;
        self.state = if requires_mfa(&claims) {
            debug!("login needs a second factor");
            AuthState::MfaPending {
                token: token.clone(),
                claims,
            }
        } else {
            info!(subject = ?claims.sub, "authenticated");
            AuthState::Authenticated {
                token: token.clone(),
                claims,
            }
        };
        Ok(token)
    }
}

/// Raw token text of a 200 response, or the server's error message.
async fn token_text(res: Response) -> Result<String, AuthError> {
    let status = res.status();
    let text = res.text().await.map_err(ClientError::from)?;
    if status != StatusCode::OK {
        let message = serde_json::from_str(&text)
            .ok()
            .and_then(|payload| ErrorEnvelope::message_of(&payload))
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(AuthError::Rejected { status, message });
    }
    Ok(text.trim().to_string())
}
