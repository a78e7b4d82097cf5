use epmanage_shared::privilege::Privilege;
use tracing::debug;

use super::AuthError;
use super::token::{Claims, TokenValidation, decode_and_validate, privileges_of};
use crate::session::Session;

/// The token read at start-up, with the claims it decoded to.
#[derive(Debug, Clone)]
pub struct Credentials {
    raw: String,
    claims: Option<Claims>,
    validation: TokenValidation,
}

impl Credentials {
    pub fn new(raw: impl Into<String>, validation: TokenValidation) -> Self {
        let raw = raw.into().trim().to_string();
        let claims = decode_and_validate(&raw, &validation);
        Self {
            raw,
            claims,
            validation,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `None` when the token did not validate at load time.
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }
}

/// Gate for a command needing `privilege`.
///
/// The raw token is validated again so an expiry since start-up is caught;
/// on success the session is armed with it.
pub fn require_privilege(
    credentials: Option<&Credentials>,
    privilege: Privilege,
    session: &Session,
) -> Result<Claims, AuthError> {
    let credentials = credentials.ok_or(AuthError::InvalidToken)?;
    if credentials.claims.is_none() {
        return Err(AuthError::InvalidToken);
    }
    let claims = decode_and_validate(&credentials.raw, &credentials.validation)
        .ok_or(AuthError::InvalidToken)?;

    if !privilege.granted_by(&privileges_of(&claims)) {
        debug!(%privilege, "privilege not granted");
        return Err(AuthError::InsufficientPermissions(privilege));
    }

    session.set_token(credentials.raw.clone());
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    fn mint(aud: &[&str], exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "u1", "iat": now - 60, "nbf": now - 60, "exp": now + exp_offset, "aud": aud}),
            &EncodingKey::from_secret(b"gate"),
        )
        .unwrap()
    }

    #[test]
    fn test_granted_privilege_arms_session() {
        let session = Session::new().unwrap();
        let creds = Credentials::new(mint(&["urn:cmi_ro"], 3600), TokenValidation::default());

        let claims = require_privilege(Some(&creds), Privilege::ReadOnly, &session).unwrap();
        assert_eq!(claims.subject(), Some("u1"));
        assert_eq!(session.token().as_deref(), Some(creds.raw()));
    }

    #[test]
    fn test_missing_privilege() {
        let session = Session::new().unwrap();
        let creds = Credentials::new(mint(&["urn:cmi_ro"], 3600), TokenValidation::default());

        let err = require_privilege(Some(&creds), Privilege::SuperAdmin, &session).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient permissions");
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_no_or_invalid_token() {
        let session = Session::new().unwrap();
        let err = require_privilege(None, Privilege::ReadOnly, &session).unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");

        let expired = Credentials::new(mint(&["urn:cmi_ro"], -3600), TokenValidation::default());
        assert!(expired.claims().is_none());
        let err = require_privilege(Some(&expired), Privilege::ReadOnly, &session).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
